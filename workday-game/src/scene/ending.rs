use super::{SceneContext, SceneController, SceneInput, SceneKey, SceneView, Transition};
use crate::grade::GradeTier;

/// End-of-day summary with the awarded grade.
#[derive(Debug, Clone)]
pub struct EndingScene {
    grade: GradeTier,
    success_count: usize,
    stress: i32,
}

impl EndingScene {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            grade: GradeTier::Burnout,
            success_count: 0,
            stress: 0,
        }
    }

    #[must_use]
    pub const fn grade(&self) -> GradeTier {
        self.grade
    }
}

impl Default for EndingScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneController for EndingScene {
    fn key(&self) -> SceneKey {
        SceneKey::Ending
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        self.success_count = ctx.session.success_count();
        self.stress = ctx.session.stress();
        self.grade = ctx.session.classify_grade();
        None
    }

    fn on_input(&mut self, input: SceneInput, _ctx: &mut SceneContext<'_>) -> Option<Transition> {
        (input == SceneInput::Confirm).then_some(Transition::Restart)
    }

    fn view(&self) -> SceneView {
        SceneView::Ending {
            grade: self.grade,
            success_count: self.success_count,
            stress: self.stress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::Harness;

    #[test]
    fn grades_the_session_on_entry() {
        let mut harness = Harness::linear();
        for id in 1..=7 {
            harness.session.record_outcome(id, true);
        }
        let mut scene = EndingScene::new();
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.grade(), GradeTier::Veteran);
        assert_eq!(
            scene.view(),
            SceneView::Ending {
                grade: GradeTier::Veteran,
                success_count: 7,
                stress: 35,
            }
        );
    }

    #[test]
    fn confirm_restarts() {
        let mut harness = Harness::linear();
        let mut scene = EndingScene::new();
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.on_input(SceneInput::Pass, &mut harness.ctx()), None);
        assert_eq!(
            scene.on_input(SceneInput::Confirm, &mut harness.ctx()),
            Some(Transition::Restart)
        );
    }
}
