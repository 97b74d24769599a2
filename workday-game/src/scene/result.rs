use super::{SceneContext, SceneController, SceneKey, SceneTimer, SceneView, Transition};
use crate::config::{FailurePolicy, ProgressionModel};
use crate::session::Outcome;

/// Success or failure card shown after each minigame.
#[derive(Debug, Clone)]
pub struct ResultScene {
    outcome: Outcome,
}

impl ResultScene {
    #[must_use]
    pub const fn new(outcome: Outcome) -> Self {
        Self { outcome }
    }

    fn next(&self, ctx: &mut SceneContext<'_>) -> Transition {
        let session = &mut *ctx.session;
        match ctx.config.progression {
            ProgressionModel::Unlock => {
                if session.is_complete() {
                    Transition::Ending
                } else {
                    Transition::StageSelect
                }
            }
            ProgressionModel::Linear => {
                if !self.outcome.succeeded
                    && ctx.config.failure_policy == FailurePolicy::RestartSession
                {
                    return Transition::Restart;
                }
                session.advance_stage();
                if session.current_stage_index() >= session.stage_count() {
                    Transition::Ending
                } else {
                    Transition::Narrative
                }
            }
        }
    }
}

impl SceneController for ResultScene {
    fn key(&self) -> SceneKey {
        SceneKey::Result
    }

    fn stage_id(&self) -> Option<u32> {
        Some(self.outcome.stage_id)
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        let timings = ctx.config.timings;
        let hold = if self.outcome.succeeded {
            timings.result_success_ms
        } else {
            timings.result_failure_ms
        };
        ctx.timers.after(hold, SceneTimer::Proceed);
        None
    }

    fn on_timer(&mut self, timer: SceneTimer, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        (timer == SceneTimer::Proceed).then(|| self.next(ctx))
    }

    fn view(&self) -> SceneView {
        SceneView::Result {
            outcome: self.outcome,
        }
    }
}
