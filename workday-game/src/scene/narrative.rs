use super::{
    SceneContext, SceneController, SceneInput, SceneKey, SceneTimer, SceneView, Transition,
    intro_for,
};
use crate::constants::STRESS_NARRATIVE_PENALTY;

/// Chat-style story screen for the current stage.
///
/// Messages appear one at a time; the advance prompt arms shortly after the
/// last one. Leaving the screen costs a little stress.
#[derive(Debug, Clone, Default)]
pub struct NarrativeScene {
    stage_index: usize,
    revealed: usize,
    total: usize,
    can_advance: bool,
}

impl NarrativeScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reveal(&mut self, ctx: &mut SceneContext<'_>) {
        self.revealed = (self.revealed + 1).min(self.total);
        let timings = ctx.config.timings;
        if self.revealed < self.total {
            ctx.timers
                .after(timings.message_interval_ms, SceneTimer::RevealNext);
        } else {
            ctx.timers
                .after(timings.advance_arm_ms, SceneTimer::ArmAdvance);
        }
    }
}

impl SceneController for NarrativeScene {
    fn key(&self) -> SceneKey {
        SceneKey::Narrative
    }

    fn stage_id(&self) -> Option<u32> {
        u32::try_from(self.stage_index + 1).ok()
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        self.stage_index = ctx.session.current_stage_index();
        if self.stage_index >= ctx.session.stage_count() {
            return Some(Transition::Ending);
        }
        let beat = ctx.narratives.beat_for(self.stage_index);
        self.total = beat.messages.len();
        if beat.is_prologue {
            ctx.timers
                .after(ctx.config.timings.prologue_hold_ms, SceneTimer::Proceed);
        } else {
            self.reveal(ctx);
        }
        None
    }

    fn on_input(&mut self, input: SceneInput, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        if input != SceneInput::Confirm || !self.can_advance {
            return None;
        }
        self.can_advance = false;
        ctx.session.add_stress(STRESS_NARRATIVE_PENALTY);
        let stage_id = self.stage_id()?;
        Some(intro_for(stage_id, ctx))
    }

    fn on_timer(&mut self, timer: SceneTimer, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        match timer {
            SceneTimer::Proceed | SceneTimer::RevealNext => self.reveal(ctx),
            SceneTimer::ArmAdvance => self.can_advance = true,
            SceneTimer::CountdownStep | SceneTimer::Go | SceneTimer::Tick => {}
        }
        None
    }

    fn view(&self) -> SceneView {
        SceneView::Narrative {
            stage_index: self.stage_index,
            revealed: self.revealed,
            total: self.total,
            can_advance: self.can_advance,
        }
    }
}
