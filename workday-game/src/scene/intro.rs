use serde::{Deserialize, Serialize};

use super::{SceneContext, SceneController, SceneKey, SceneTimer, SceneView, Transition};
use crate::constants::INTRO_COUNTDOWN_FROM;

/// Value shown by the pre-minigame countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Countdown {
    Number(u8),
    Go,
}

impl Countdown {
    const fn next(current: Option<Self>) -> Self {
        match current {
            None => Self::Number(INTRO_COUNTDOWN_FROM),
            Some(Self::Number(n)) if n > 1 => Self::Number(n - 1),
            Some(Self::Number(_) | Self::Go) => Self::Go,
        }
    }
}

/// Title card and `3, 2, 1, GO` countdown before a minigame.
#[derive(Debug, Clone)]
pub struct IntroScene {
    stage_id: u32,
    variant_id: u32,
    countdown: Option<Countdown>,
}

impl IntroScene {
    #[must_use]
    pub const fn new(stage_id: u32, variant_id: u32) -> Self {
        Self {
            stage_id,
            variant_id,
            countdown: None,
        }
    }
}

impl SceneController for IntroScene {
    fn key(&self) -> SceneKey {
        SceneKey::MinigameIntro
    }

    fn stage_id(&self) -> Option<u32> {
        Some(self.stage_id)
    }

    fn variant_id(&self) -> Option<u32> {
        Some(self.variant_id)
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        ctx.timers
            .after(ctx.config.timings.intro_lead_ms, SceneTimer::CountdownStep);
        None
    }

    fn on_timer(&mut self, timer: SceneTimer, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        match timer {
            SceneTimer::CountdownStep => {
                let next = Countdown::next(self.countdown);
                self.countdown = Some(next);
                let timings = ctx.config.timings;
                if next == Countdown::Go {
                    ctx.timers.after(timings.intro_go_ms, SceneTimer::Go);
                } else {
                    ctx.timers
                        .after(timings.intro_step_ms, SceneTimer::CountdownStep);
                }
                None
            }
            SceneTimer::Go => Some(Transition::StartMinigame {
                stage_id: self.stage_id,
                variant_id: self.variant_id,
            }),
            _ => None,
        }
    }

    fn view(&self) -> SceneView {
        SceneView::Intro {
            stage_id: self.stage_id,
            variant_id: self.variant_id,
            countdown: self.countdown,
        }
    }
}
