//! Workday Game Engine
//!
//! Platform-agnostic session and progression core for the Workday minigame
//! collection: stage catalog, session state, scene controllers, the scene
//! router and the state broadcast bridge. No UI or platform dependencies.

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod grade;
pub mod narrative;
pub mod rng;
pub mod router;
pub mod scene;
pub mod session;
pub mod stress;
pub mod timer;

// Re-export commonly used types
pub use bridge::{BroadcastBridge, JumpRequest, JumpSender, StateSnapshot, SubscriptionId};
pub use catalog::{
    CatalogError, ControllerKey, MinigameVariant, Period, StageCatalog, StageDefinition,
};
pub use config::{ConfigError, FailurePolicy, GameConfig, ProgressionModel, SceneTimings};
pub use grade::GradeTier;
pub use narrative::{ChatMessage, MessageKind, NarrativeBeat, NarrativeCatalog, NarrativeError};
pub use rng::VariantPicker;
pub use router::SceneRouter;
pub use scene::{
    Countdown, SceneController, SceneInput, SceneKey, SceneTimer, SceneView, Transition, Urgency,
};
pub use session::{Outcome, SessionState};
pub use stress::{StressBand, vignette_alpha};
pub use timer::{Fired, Scheduler, ScopeToken, TimerId};

use thiserror::Error;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the ordered stage catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage data cannot be loaded or fails validation.
    fn load_stages(&self) -> Result<StageCatalog, Self::Error>;

    /// Load the per-stage narrative beats.
    ///
    /// # Errors
    ///
    /// Returns an error if the narrative data cannot be loaded or fails validation.
    fn load_narratives(&self) -> Result<NarrativeCatalog, Self::Error>;

    /// Load runtime configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or is out of range.
    fn load_config(&self) -> Result<GameConfig, Self::Error>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Loader over the JSON assets embedded in this crate, with an optional
/// config override supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct StaticDataLoader {
    config_json: Option<String>,
}

impl StaticDataLoader {
    #[must_use]
    pub const fn new() -> Self {
        Self { config_json: None }
    }

    #[must_use]
    pub fn with_config_json(config_json: impl Into<String>) -> Self {
        Self {
            config_json: Some(config_json.into()),
        }
    }
}

impl DataLoader for StaticDataLoader {
    type Error = LoadError;

    fn load_stages(&self) -> Result<StageCatalog, Self::Error> {
        Ok(StageCatalog::builtin().clone())
    }

    fn load_narratives(&self) -> Result<NarrativeCatalog, Self::Error> {
        Ok(NarrativeCatalog::builtin().clone())
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        match self.config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => Ok(GameConfig::from_json(json)?),
            _ => Ok(GameConfig::default()),
        }
    }
}

/// Main game engine for building scene routers from loaded data
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    /// Create a new game engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    #[must_use]
    pub const fn data_loader(&self) -> &L {
        &self.data_loader
    }

    /// Build a router using the loader's config.
    ///
    /// # Errors
    ///
    /// Returns an error if any data set cannot be loaded.
    pub fn create_router(&self, seed: u64) -> Result<SceneRouter, L::Error>
    where
        L::Error: From<NarrativeError>,
    {
        let config = self.data_loader.load_config()?;
        self.create_router_with_config(config, seed)
    }

    /// Build a router with an explicit config, ignoring the loader's.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage or narrative data cannot be loaded, or
    /// if some stage has no narrative beat.
    pub fn create_router_with_config(
        &self,
        config: GameConfig,
        seed: u64,
    ) -> Result<SceneRouter, L::Error>
    where
        L::Error: From<NarrativeError>,
    {
        let catalog = self.data_loader.load_stages()?;
        let narratives = self.data_loader.load_narratives()?;
        narratives.covers(catalog.len())?;
        Ok(SceneRouter::new(catalog, narratives, config, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_builds_router_from_static_data() {
        let engine = GameEngine::new(StaticDataLoader::new());
        let mut router = engine.create_router(11).unwrap();
        router.start();
        assert_eq!(router.active_scene(), Some(SceneKey::Boot));
        assert_eq!(router.catalog().len(), 10);
        assert_eq!(router.config(), &GameConfig::default());
    }

    #[test]
    fn config_override_flows_through_loader() {
        let loader = StaticDataLoader::with_config_json(r#"{"progression": "unlock"}"#);
        let engine = GameEngine::new(loader);
        let router = engine.create_router(0).unwrap();
        assert_eq!(router.session().model(), ProgressionModel::Unlock);
    }

    #[test]
    fn bad_config_surfaces_as_load_error() {
        let loader = StaticDataLoader::with_config_json(r#"{"timings": {"intro_step_ms": 0}}"#);
        let err = GameEngine::new(loader).create_router(0).unwrap_err();
        assert!(matches!(err, LoadError::Config(ConfigError::RangeViolation { .. })));
        assert!(err.to_string().contains("timings.intro_step_ms"));
    }

    struct ExtendedDayLoader;

    impl DataLoader for ExtendedDayLoader {
        type Error = LoadError;

        fn load_stages(&self) -> Result<StageCatalog, Self::Error> {
            let mut stages = StageCatalog::builtin().all_stages().to_vec();
            let mut overtime = stages[stages.len() - 1].clone();
            overtime.id = 11;
            overtime.name = "Overtime".to_string();
            for variant in &mut overtime.minigames {
                variant.variant_id += 1_000;
            }
            stages.push(overtime);
            Ok(StageCatalog::from_stages(stages)?)
        }

        fn load_narratives(&self) -> Result<NarrativeCatalog, Self::Error> {
            Ok(NarrativeCatalog::builtin().clone())
        }

        fn load_config(&self) -> Result<GameConfig, Self::Error> {
            Ok(GameConfig::default())
        }
    }

    #[test]
    fn stage_without_narrative_beat_is_a_load_error() {
        let loader = ExtendedDayLoader;
        assert_eq!(loader.load_stages().unwrap().len(), 11);
        let err = GameEngine::new(loader).create_router(0).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Narrative(NarrativeError::MissingBeat { stage_index: 10 })
        ));
        assert_eq!(err.to_string(), "no narrative beat for stage index 10");
    }

    #[test]
    fn blank_config_falls_back_to_defaults() {
        let loader = StaticDataLoader::with_config_json("   ");
        assert_eq!(loader.load_config().unwrap(), GameConfig::default());
        assert_eq!(
            GameEngine::new(loader).data_loader().load_stages().unwrap().len(),
            10
        );
    }
}
