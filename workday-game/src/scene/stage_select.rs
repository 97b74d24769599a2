use log::debug;

use super::{SceneContext, SceneController, SceneInput, SceneKey, SceneView, Transition, intro_for};

/// Stage picker used by the unlock progression model.
#[derive(Debug, Clone, Default)]
pub struct StageSelectScene {
    selected: Option<u32>,
}

impl StageSelectScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneController for StageSelectScene {
    fn key(&self) -> SceneKey {
        SceneKey::StageSelect
    }

    fn stage_id(&self) -> Option<u32> {
        self.selected
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        ctx.session.is_complete().then_some(Transition::Ending)
    }

    fn on_input(&mut self, input: SceneInput, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        let SceneInput::SelectStage(stage_id) = input else {
            return None;
        };
        if self.selected.is_some() {
            return None;
        }
        if !ctx.session.select_stage(stage_id) {
            debug!("stage {stage_id} is locked or already cleared; selection ignored");
            return None;
        }
        self.selected = Some(stage_id);
        Some(intro_for(stage_id, ctx))
    }

    fn view(&self) -> SceneView {
        SceneView::StageSelect {
            selected: self.selected,
        }
    }
}
