//! Generic minigame controller.
//!
//! The bespoke puzzle lives in the renderer, which reports `Pass` or `Fail`.
//! This controller owns the countdown, records the attempt exactly once and
//! hands off to the result screen after the variant's outro.
use log::warn;
use serde::{Deserialize, Serialize};

use super::{SceneContext, SceneController, SceneInput, SceneKey, SceneTimer, SceneView, Transition};
use crate::constants::{URGENCY_CRITICAL_SECS, URGENCY_WARNING_SECS};
use crate::session::Outcome;
use crate::timer::TimerId;

/// How close the countdown is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Calm,
    Warning,
    Critical,
}

impl Urgency {
    #[must_use]
    pub const fn for_time_left(time_left: Option<u32>) -> Self {
        match time_left {
            Some(secs) if secs <= URGENCY_CRITICAL_SECS => Self::Critical,
            Some(secs) if secs <= URGENCY_WARNING_SECS => Self::Warning,
            _ => Self::Calm,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MinigameScene {
    stage_id: u32,
    variant_id: u32,
    time_left: Option<u32>,
    outro_ms: u32,
    tick: Option<TimerId>,
    finished: Option<bool>,
}

impl MinigameScene {
    #[must_use]
    pub const fn new(stage_id: u32, variant_id: u32) -> Self {
        Self {
            stage_id,
            variant_id,
            time_left: None,
            outro_ms: 0,
            tick: None,
            finished: None,
        }
    }

    #[must_use]
    pub const fn time_left(&self) -> Option<u32> {
        self.time_left
    }

    #[must_use]
    pub const fn urgency(&self) -> Urgency {
        Urgency::for_time_left(self.time_left)
    }

    fn finish(&mut self, succeeded: bool, ctx: &mut SceneContext<'_>) {
        if self.finished.is_some() {
            return;
        }
        self.finished = Some(succeeded);
        ctx.session.record_outcome(self.stage_id, succeeded);
        if let Some(tick) = self.tick.take() {
            ctx.timers.cancel(tick);
        }
        ctx.timers.after(self.outro_ms, SceneTimer::Proceed);
    }
}

impl SceneController for MinigameScene {
    fn key(&self) -> SceneKey {
        SceneKey::Minigame
    }

    fn stage_id(&self) -> Option<u32> {
        Some(self.stage_id)
    }

    fn variant_id(&self) -> Option<u32> {
        Some(self.variant_id)
    }

    fn on_enter(&mut self, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        let stage = ctx.catalog.stage(self.stage_id);
        let variant = stage.variant(self.variant_id).unwrap_or_else(|| {
            warn!(
                "stage {} has no variant {}; using its first",
                self.stage_id, self.variant_id
            );
            stage.first_variant()
        });
        self.variant_id = variant.variant_id;
        self.outro_ms = variant.outro_ms;
        self.time_left = variant.time_limit_secs;
        match self.time_left {
            Some(0) => self.finish(false, ctx),
            Some(secs) => {
                self.tick = ctx
                    .timers
                    .every(ctx.config.timings.minigame_tick_ms, secs, SceneTimer::Tick);
            }
            None => {}
        }
        None
    }

    fn on_input(&mut self, input: SceneInput, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        match input {
            SceneInput::Pass => self.finish(true, ctx),
            SceneInput::Fail => self.finish(false, ctx),
            SceneInput::Confirm | SceneInput::SelectStage(_) => {}
        }
        None
    }

    fn on_timer(&mut self, timer: SceneTimer, ctx: &mut SceneContext<'_>) -> Option<Transition> {
        match timer {
            SceneTimer::Tick if self.finished.is_none() => {
                let left = self.time_left.map_or(0, |secs| secs.saturating_sub(1));
                self.time_left = Some(left);
                if left == 0 {
                    self.finish(false, ctx);
                }
                None
            }
            SceneTimer::Proceed => self.finished.map(|succeeded| {
                Transition::ShowResult(Outcome {
                    stage_id: self.stage_id,
                    succeeded,
                })
            }),
            _ => None,
        }
    }

    fn view(&self) -> SceneView {
        SceneView::Minigame {
            stage_id: self.stage_id,
            variant_id: self.variant_id,
            time_left: self.time_left,
            urgency: self.urgency(),
            finished: self.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_support::Harness;

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_time_left(None), Urgency::Calm);
        assert_eq!(Urgency::for_time_left(Some(6)), Urgency::Calm);
        assert_eq!(Urgency::for_time_left(Some(5)), Urgency::Warning);
        assert_eq!(Urgency::for_time_left(Some(4)), Urgency::Warning);
        assert_eq!(Urgency::for_time_left(Some(3)), Urgency::Critical);
        assert_eq!(Urgency::for_time_left(Some(0)), Urgency::Critical);
    }

    #[test]
    fn pass_records_once_and_shows_result_after_outro() {
        let mut harness = Harness::linear();
        let mut scene = MinigameScene::new(1, 1);
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.time_left(), Some(15));

        scene.on_input(SceneInput::Pass, &mut harness.ctx());
        scene.on_input(SceneInput::Fail, &mut harness.ctx());
        scene.on_input(SceneInput::Pass, &mut harness.ctx());
        assert_eq!(harness.session.outcomes(), &[Outcome::success(1)]);
        assert_eq!(harness.session.stress(), 5);

        assert_eq!(harness.run_for(&mut scene, 1_999), None);
        assert_eq!(scene.time_left(), Some(15), "ticks stop once finished");
        assert_eq!(
            harness.run_for(&mut scene, 1),
            Some(Transition::ShowResult(Outcome::success(1)))
        );
    }

    #[test]
    fn expiry_is_a_failure() {
        let mut harness = Harness::linear();
        let mut scene = MinigameScene::new(7, 65);
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.time_left(), Some(8));

        harness.run_for(&mut scene, 3_000);
        assert_eq!(scene.time_left(), Some(5));
        assert_eq!(scene.urgency(), Urgency::Warning);
        harness.run_for(&mut scene, 2_000);
        assert_eq!(scene.urgency(), Urgency::Critical);

        harness.run_for(&mut scene, 3_000);
        assert_eq!(scene.time_left(), Some(0));
        assert_eq!(harness.session.outcomes(), &[Outcome::failure(7)]);
        assert_eq!(harness.session.stress(), 15);

        scene.on_input(SceneInput::Pass, &mut harness.ctx());
        assert_eq!(harness.session.outcomes().len(), 1);
        assert_eq!(
            harness.run_for(&mut scene, 1_200),
            Some(Transition::ShowResult(Outcome::failure(7)))
        );
    }

    #[test]
    fn untimed_variants_wait_for_the_renderer() {
        let mut harness = Harness::linear();
        let mut scene = MinigameScene::new(4, 31);
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.time_left(), None);
        assert_eq!(harness.run_for(&mut scene, 600_000), None);
        assert!(harness.session.outcomes().is_empty());

        scene.on_input(SceneInput::Fail, &mut harness.ctx());
        assert_eq!(
            harness.run_for(&mut scene, 1_500),
            Some(Transition::ShowResult(Outcome::failure(4)))
        );
    }

    #[test]
    fn unknown_variant_falls_back_to_first() {
        let mut harness = Harness::linear();
        let mut scene = MinigameScene::new(2, 999);
        scene.on_enter(&mut harness.ctx());
        assert_eq!(scene.variant_id(), Some(11));
        assert_eq!(scene.time_left(), Some(12));
    }
}
