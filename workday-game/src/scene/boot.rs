use super::{SceneContext, SceneController, SceneInput, SceneKey, SceneTimer, SceneView, Transition};
use crate::config::ProgressionModel;

/// Title screen. Entering it always starts a fresh day.
#[derive(Debug, Clone, Default)]
pub struct BootScene {
    fading: bool,
}

impl BootScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneController for BootScene {
    fn key(&self) -> SceneKey {
        SceneKey::Boot
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        ctx.session.reset();
        None
    }

    fn on_input(&mut self, input: SceneInput, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        if input == SceneInput::Confirm && !self.fading {
            self.fading = true;
            ctx.timers
                .after(ctx.config.timings.boot_fade_ms, SceneTimer::Proceed);
        }
        None
    }

    fn on_timer(&mut self, timer: SceneTimer, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        if timer != SceneTimer::Proceed || !self.fading {
            return None;
        }
        Some(match ctx.config.progression {
            ProgressionModel::Linear => Transition::Narrative,
            ProgressionModel::Unlock => Transition::StageSelect,
        })
    }

    fn view(&self) -> SceneView {
        SceneView::Boot {
            fading: self.fading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::Harness;

    #[test]
    fn entering_resets_the_session() {
        let mut harness = Harness::linear();
        harness.session.record_outcome(1, false);
        harness.session.advance_stage();
        let mut scene = BootScene::new();
        assert_eq!(scene.on_enter(&mut harness.ctx()), None);
        assert_eq!(harness.session.stress(), 0);
        assert_eq!(harness.session.current_stage_index(), 0);
        assert!(harness.session.outcomes().is_empty());
    }

    #[test]
    fn confirm_fades_into_the_first_narrative() {
        let mut harness = Harness::linear();
        let mut scene = BootScene::new();
        scene.on_enter(&mut harness.ctx());
        assert_eq!(harness.run_for(&mut scene, 10_000), None);

        scene.on_input(SceneInput::Confirm, &mut harness.ctx());
        scene.on_input(SceneInput::Confirm, &mut harness.ctx());
        assert_eq!(harness.scheduler.pending(harness.scope), 1);
        assert_eq!(scene.view(), SceneView::Boot { fading: true });
        assert_eq!(harness.run_for(&mut scene, 499), None);
        assert_eq!(harness.run_for(&mut scene, 1), Some(Transition::Narrative));
    }

    #[test]
    fn unlock_model_goes_to_stage_select() {
        let mut harness = Harness::unlock();
        let mut scene = BootScene::new();
        scene.on_enter(&mut harness.ctx());
        scene.on_input(SceneInput::Confirm, &mut harness.ctx());
        assert_eq!(harness.run_for(&mut scene, 500), Some(Transition::StageSelect));
    }
}
