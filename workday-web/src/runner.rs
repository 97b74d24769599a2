//! Platform-neutral wrapper the wasm exports delegate to.
use anyhow::{Context, Result};
use workday_game::{
    GameEngine, JumpSender, SceneInput, SceneRouter, StateSnapshot, StaticDataLoader,
};

/// Owns one scene router for the lifetime of a page.
#[derive(Debug)]
pub struct WebRunner {
    router: SceneRouter,
}

impl WebRunner {
    /// Build a runner from an optional JSON config and start the boot scene.
    ///
    /// Subscribers attached through `configure` see the initial boot
    /// broadcast.
    ///
    /// # Errors
    ///
    /// Returns an error if the config JSON is malformed or out of range.
    pub fn new(
        config_json: &str,
        seed: u64,
        configure: impl FnOnce(&mut SceneRouter),
    ) -> Result<Self> {
        let engine = GameEngine::new(StaticDataLoader::with_config_json(config_json));
        let mut router = engine
            .create_router(seed)
            .context("failed to build the scene router")?;
        configure(&mut router);
        router.start();
        Ok(Self { router })
    }

    /// Advance the virtual clock. Negative or non-finite deltas are ignored.
    pub fn tick(&mut self, dt_ms: f64) {
        self.router.advance(millis_from_f64(dt_ms));
    }

    pub fn confirm(&mut self) {
        self.router.dispatch(SceneInput::Confirm);
    }

    pub fn pass(&mut self) {
        self.router.dispatch(SceneInput::Pass);
    }

    pub fn fail(&mut self) {
        self.router.dispatch(SceneInput::Fail);
    }

    pub fn select_stage(&mut self, stage_id: u32) {
        self.router.dispatch(SceneInput::SelectStage(stage_id));
    }

    pub fn jump(&mut self, stage_index: i64) {
        self.router.request_jump(stage_index);
    }

    #[must_use]
    pub fn jump_sender(&self) -> JumpSender {
        self.router.jump_sender()
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.router.snapshot()
    }

    /// Current snapshot as the JSON a `game-state` listener would receive.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn state_json(&self) -> Result<String> {
        serde_json::to_string(&self.snapshot()).context("failed to serialize state snapshot")
    }

    #[must_use]
    pub const fn router(&self) -> &SceneRouter {
        &self.router
    }
}

/// Convert a JavaScript number into a seed. Fractions truncate; negative,
/// `NaN` and infinite values become zero.
#[must_use]
pub fn seed_from_f64(value: f64) -> u64 {
    millis_from_f64(value)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis_from_f64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}
