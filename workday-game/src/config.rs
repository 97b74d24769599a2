//! Runtime configuration: progression model, failure policy and scene pacing.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ADVANCE_ARM_MS, BOOT_FADE_MS, INTRO_GO_MS, INTRO_LEAD_MS, INTRO_STEP_MS, MESSAGE_INTERVAL_MS,
    MINIGAME_TICK_MS, PROLOGUE_HOLD_MS, RESULT_FAILURE_HOLD_MS, RESULT_SUCCESS_HOLD_MS,
};

const MAX_DELAY_MS: u32 = 60_000;

/// How stages open up and how progress is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionModel {
    /// Stages are played in order; every attempt counts toward progress.
    #[default]
    Linear,
    /// Stages are picked from a select screen once their predecessor is cleared.
    Unlock,
}

impl ProgressionModel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Unlock => "unlock",
        }
    }
}

/// What the result screen does after a failed minigame in the linear model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Start the whole day over from the boot screen.
    #[default]
    RestartSession,
    /// Count the failure and move on to the next stage.
    AdvanceAnyway,
}

impl FailurePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RestartSession => "restart_session",
            Self::AdvanceAnyway => "advance_anyway",
        }
    }
}

/// Scene pacing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTimings {
    pub boot_fade_ms: u32,
    pub prologue_hold_ms: u32,
    pub message_interval_ms: u32,
    pub advance_arm_ms: u32,
    pub intro_lead_ms: u32,
    pub intro_step_ms: u32,
    pub intro_go_ms: u32,
    pub minigame_tick_ms: u32,
    pub result_success_ms: u32,
    pub result_failure_ms: u32,
}

impl Default for SceneTimings {
    fn default() -> Self {
        Self {
            boot_fade_ms: BOOT_FADE_MS,
            prologue_hold_ms: PROLOGUE_HOLD_MS,
            message_interval_ms: MESSAGE_INTERVAL_MS,
            advance_arm_ms: ADVANCE_ARM_MS,
            intro_lead_ms: INTRO_LEAD_MS,
            intro_step_ms: INTRO_STEP_MS,
            intro_go_ms: INTRO_GO_MS,
            minigame_tick_ms: MINIGAME_TICK_MS,
            result_success_ms: RESULT_SUCCESS_HOLD_MS,
            result_failure_ms: RESULT_FAILURE_HOLD_MS,
        }
    }
}

impl SceneTimings {
    /// Every pause collapsed to a single millisecond; handy for headless runs.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            boot_fade_ms: 1,
            prologue_hold_ms: 1,
            message_interval_ms: 1,
            advance_arm_ms: 1,
            intro_lead_ms: 1,
            intro_step_ms: 1,
            intro_go_ms: 1,
            minigame_tick_ms: 1,
            result_success_ms: 1,
            result_failure_ms: 1,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields: [(&'static str, u32, u32); 10] = [
            ("timings.boot_fade_ms", self.boot_fade_ms, 0),
            ("timings.prologue_hold_ms", self.prologue_hold_ms, 0),
            ("timings.message_interval_ms", self.message_interval_ms, 1),
            ("timings.advance_arm_ms", self.advance_arm_ms, 0),
            ("timings.intro_lead_ms", self.intro_lead_ms, 0),
            ("timings.intro_step_ms", self.intro_step_ms, 1),
            ("timings.intro_go_ms", self.intro_go_ms, 0),
            ("timings.minigame_tick_ms", self.minigame_tick_ms, 1),
            ("timings.result_success_ms", self.result_success_ms, 0),
            ("timings.result_failure_ms", self.result_failure_ms, 0),
        ];
        for (field, value, min) in fields {
            if !(min..=MAX_DELAY_MS).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min,
                    max: MAX_DELAY_MS,
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub progression: ProgressionModel,
    pub failure_policy: FailurePolicy,
    pub timings: SceneTimings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}

impl GameConfig {
    /// Parse a config from JSON; missing fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::RangeViolation` when any timing is outside its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timings.validate()
    }

    #[must_use]
    pub const fn with_progression(mut self, progression: ProgressionModel) -> Self {
        self.progression = progression;
        self
    }

    #[must_use]
    pub const fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    #[must_use]
    pub const fn with_timings(mut self, timings: SceneTimings) -> Self {
        self.timings = timings;
        self
    }
}
