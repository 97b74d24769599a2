//! Scene controllers: one per screen of the workday.
//!
//! A controller never starts another scene itself. It returns a typed
//! [`Transition`] from its hooks and the router decides what to build next.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::StageCatalog;
use crate::config::GameConfig;
use crate::grade::GradeTier;
use crate::narrative::NarrativeCatalog;
use crate::rng::VariantPicker;
use crate::session::{Outcome, SessionState};
use crate::timer::TimerHandle;

pub mod boot;
pub mod ending;
pub mod intro;
pub mod minigame;
pub mod narrative;
pub mod result;
pub mod stage_select;

pub use boot::BootScene;
pub use ending::EndingScene;
pub use intro::{Countdown, IntroScene};
pub use minigame::{MinigameScene, Urgency};
pub use narrative::NarrativeScene;
pub use result::ResultScene;
pub use stage_select::StageSelectScene;

/// Stable label of a screen, as broadcast to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKey {
    Boot,
    Narrative,
    StageSelect,
    MinigameIntro,
    Minigame,
    Result,
    Ending,
}

impl SceneKey {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Narrative => "narrative",
            Self::StageSelect => "stage-select",
            Self::MinigameIntro => "minigame-intro",
            Self::Minigame => "minigame",
            Self::Result => "result",
            Self::Ending => "ending",
        }
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Player interactions, as reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneInput {
    /// Tap, advance or start button.
    Confirm,
    /// The bespoke puzzle was solved.
    Pass,
    /// The bespoke puzzle was lost.
    Fail,
    SelectStage(u32),
}

/// Timer payloads scheduled by controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneTimer {
    /// Generic "move on" after a hold or fade.
    Proceed,
    RevealNext,
    ArmAdvance,
    CountdownStep,
    Go,
    Tick,
}

/// What the router should enter next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Boot,
    Narrative,
    StageSelect,
    Intro { stage_id: u32, variant_id: u32 },
    StartMinigame { stage_id: u32, variant_id: u32 },
    ShowResult(Outcome),
    Ending,
    /// Start the day over; behaves like `Boot` but is logged as a restart.
    Restart,
}

impl Transition {
    #[must_use]
    pub const fn target(self) -> SceneKey {
        match self {
            Self::Boot | Self::Restart => SceneKey::Boot,
            Self::Narrative => SceneKey::Narrative,
            Self::StageSelect => SceneKey::StageSelect,
            Self::Intro { .. } => SceneKey::MinigameIntro,
            Self::StartMinigame { .. } => SceneKey::Minigame,
            Self::ShowResult(_) => SceneKey::Result,
            Self::Ending => SceneKey::Ending,
        }
    }
}

/// Everything a controller may touch while handling a hook.
pub struct SceneContext<'a> {
    pub session: &'a mut SessionState,
    pub catalog: &'a StageCatalog,
    pub narratives: &'a NarrativeCatalog,
    pub picker: &'a mut VariantPicker,
    pub config: &'a GameConfig,
    pub timers: TimerHandle<'a, SceneTimer>,
}

/// Read-only state a renderer needs to draw the active screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneView {
    Boot {
        fading: bool,
    },
    Narrative {
        stage_index: usize,
        revealed: usize,
        total: usize,
        can_advance: bool,
    },
    StageSelect {
        selected: Option<u32>,
    },
    Intro {
        stage_id: u32,
        variant_id: u32,
        countdown: Option<Countdown>,
    },
    Minigame {
        stage_id: u32,
        variant_id: u32,
        time_left: Option<u32>,
        urgency: Urgency,
        finished: Option<bool>,
    },
    Result {
        outcome: Outcome,
    },
    Ending {
        grade: GradeTier,
        success_count: usize,
        stress: i32,
    },
}

pub trait SceneController {
    fn key(&self) -> SceneKey;

    /// Stage the screen is about, when it is about one.
    fn stage_id(&self) -> Option<u32> {
        None
    }

    fn variant_id(&self) -> Option<u32> {
        None
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition>;

    fn on_input(&mut self, _input: SceneInput, _ctx: &mut SceneContext<'_>) -> Option<Transition> {
        None
    }

    fn on_timer(&mut self, _timer: SceneTimer, _ctx: &mut SceneContext<'_>) -> Option<Transition> {
        None
    }

    fn view(&self) -> SceneView;
}

/// Build the controller a transition leads to.
#[must_use]
pub fn controller_for(transition: Transition) -> Box<dyn SceneController> {
    match transition {
        Transition::Boot | Transition::Restart => Box::new(BootScene::new()),
        Transition::Narrative => Box::new(NarrativeScene::new()),
        Transition::StageSelect => Box::new(StageSelectScene::new()),
        Transition::Intro {
            stage_id,
            variant_id,
        } => Box::new(IntroScene::new(stage_id, variant_id)),
        Transition::StartMinigame {
            stage_id,
            variant_id,
        } => Box::new(MinigameScene::new(stage_id, variant_id)),
        Transition::ShowResult(outcome) => Box::new(ResultScene::new(outcome)),
        Transition::Ending => Box::new(EndingScene::new()),
    }
}

/// Pick a variant for `stage_id` and head to its intro.
pub(crate) fn intro_for(stage_id: u32, ctx: &mut SceneContext<'_>) -> Transition {
    let stage = ctx.catalog.stage(stage_id);
    let variant = ctx.picker.pick_random_variant(stage);
    Transition::Intro {
        stage_id,
        variant_id: variant.variant_id,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::ProgressionModel;
    use crate::timer::{ScopeToken, Scheduler};

    /// Owns everything a `SceneContext` borrows.
    pub struct Harness {
        pub session: SessionState,
        pub picker: VariantPicker,
        pub config: GameConfig,
        pub scheduler: Scheduler<SceneTimer>,
        pub scope: ScopeToken,
    }

    impl Harness {
        pub fn new(config: GameConfig) -> Self {
            let mut scheduler = Scheduler::new();
            let scope = scheduler.open_scope();
            Self {
                session: SessionState::new(StageCatalog::builtin().len(), config.progression),
                picker: VariantPicker::from_seed(1),
                config,
                scheduler,
                scope,
            }
        }

        pub fn linear() -> Self {
            Self::new(GameConfig::default())
        }

        pub fn unlock() -> Self {
            Self::new(GameConfig::default().with_progression(ProgressionModel::Unlock))
        }

        pub fn ctx(&mut self) -> SceneContext<'_> {
            SceneContext {
                session: &mut self.session,
                catalog: StageCatalog::builtin(),
                narratives: NarrativeCatalog::builtin(),
                picker: &mut self.picker,
                config: &self.config,
                timers: TimerHandle::new(&mut self.scheduler, self.scope),
            }
        }

        /// Fire every timer due within `ms`, feeding them to `scene`, and
        /// return the first transition produced.
        pub fn run_for(
            &mut self,
            scene: &mut dyn SceneController,
            ms: u64,
        ) -> Option<Transition> {
            let until = self.scheduler.now_ms() + ms;
            while let Some(fired) = self.scheduler.pop_due(until) {
                let mut ctx = self.ctx();
                if let Some(transition) = scene.on_timer(fired.event, &mut ctx) {
                    return Some(transition);
                }
            }
            self.scheduler.advance_to(until);
            None
        }
    }
}
