//! Per-playthrough session state.
//!
//! The router owns exactly one [`SessionState`] and lends it to scene
//! controllers through the scene context. All mutators clamp instead of
//! failing, so the invariants below hold after any call sequence:
//!
//! - `current_stage_index` stays within `0..=stage_count`
//! - `stress` stays within `STRESS_MIN..=STRESS_MAX`
//! - `outcomes` only grows until [`SessionState::reset`]
//! - the cleared set only grows until [`SessionState::reset`]
//! - a stage, once unlocked, stays unlocked until [`SessionState::reset`]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ProgressionModel;
use crate::constants::{STRESS_FAILURE_PENALTY, STRESS_SUCCESS_PENALTY};
use crate::grade::GradeTier;
use crate::stress::clamp_stress;

/// Result of one minigame attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub stage_id: u32,
    pub succeeded: bool,
}

impl Outcome {
    #[must_use]
    pub const fn success(stage_id: u32) -> Self {
        Self {
            stage_id,
            succeeded: true,
        }
    }

    #[must_use]
    pub const fn failure(stage_id: u32) -> Self {
        Self {
            stage_id,
            succeeded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    current_stage_index: usize,
    #[serde(default)]
    furthest_stage_index: usize,
    stress: i32,
    outcomes: Vec<Outcome>,
    cleared: BTreeSet<u32>,
    stage_count: usize,
    model: ProgressionModel,
}

impl SessionState {
    #[must_use]
    pub const fn new(stage_count: usize, model: ProgressionModel) -> Self {
        Self {
            current_stage_index: 0,
            furthest_stage_index: 0,
            stress: 0,
            outcomes: Vec::new(),
            cleared: BTreeSet::new(),
            stage_count,
            model,
        }
    }

    #[must_use]
    pub const fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    /// Highest stage index reached since the last reset.
    #[must_use]
    pub const fn furthest_stage_index(&self) -> usize {
        self.furthest_stage_index
    }

    /// One-based id of the stage at the current index, or `None` once every
    /// stage has been passed.
    #[must_use]
    pub fn current_stage_id(&self) -> Option<u32> {
        if self.current_stage_index < self.stage_count {
            u32::try_from(self.current_stage_index + 1).ok()
        } else {
            None
        }
    }

    #[must_use]
    pub const fn stress(&self) -> i32 {
        self.stress
    }

    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.outcomes.last().copied()
    }

    #[must_use]
    pub const fn stage_count(&self) -> usize {
        self.stage_count
    }

    #[must_use]
    pub const fn model(&self) -> ProgressionModel {
        self.model
    }

    #[must_use]
    pub fn cleared(&self) -> &BTreeSet<u32> {
        &self.cleared
    }

    /// Append an attempt and apply its stress penalty.
    pub fn record_outcome(&mut self, stage_id: u32, succeeded: bool) {
        self.outcomes.push(Outcome {
            stage_id,
            succeeded,
        });
        let penalty = if succeeded {
            STRESS_SUCCESS_PENALTY
        } else {
            STRESS_FAILURE_PENALTY
        };
        self.add_stress(penalty);
        if succeeded && self.model == ProgressionModel::Unlock {
            self.cleared.insert(stage_id);
        }
    }

    /// Move to the next stage; sticks at `stage_count`.
    pub fn advance_stage(&mut self) {
        self.set_stage_index((self.current_stage_index + 1).min(self.stage_count));
    }

    pub fn add_stress(&mut self, delta: i32) {
        self.stress = clamp_stress(self.stress.saturating_add(delta));
    }

    /// Force the stage index, clamping into the valid stage range.
    ///
    /// Returns the index actually applied. Unlock rules are bypassed.
    pub fn jump_to_stage(&mut self, index: i64) -> usize {
        let last = self.stage_count.saturating_sub(1);
        let clamped = if index <= 0 {
            0
        } else {
            usize::try_from(index).map_or(last, |value| value.min(last))
        };
        self.set_stage_index(clamped);
        clamped
    }

    /// Try to make `stage_id` the current stage.
    ///
    /// Refuses ids outside the catalog, stages that are still locked and
    /// stages that were already cleared.
    pub fn select_stage(&mut self, stage_id: u32) -> bool {
        let Some(index) = self.index_of(stage_id) else {
            return false;
        };
        if !self.is_stage_unlocked(stage_id) || self.is_stage_cleared(stage_id) {
            return false;
        }
        self.set_stage_index(index);
        true
    }

    pub fn reset(&mut self) {
        self.current_stage_index = 0;
        self.furthest_stage_index = 0;
        self.stress = 0;
        self.outcomes.clear();
        self.cleared.clear();
    }

    /// Attempts made (linear) or stages cleared (unlock), capped at the
    /// stage count. Replays after a jump add outcomes but never progress.
    #[must_use]
    pub fn progress_count(&self) -> usize {
        let raw = match self.model {
            ProgressionModel::Linear => self.outcomes.len(),
            ProgressionModel::Unlock => self.cleared.len(),
        };
        raw.min(self.stage_count)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress_count() >= self.stage_count
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded).count()
    }

    #[must_use]
    pub fn is_stage_cleared(&self, stage_id: u32) -> bool {
        match self.model {
            ProgressionModel::Unlock => self.cleared.contains(&stage_id),
            ProgressionModel::Linear => self
                .outcomes
                .iter()
                .any(|outcome| outcome.stage_id == stage_id && outcome.succeeded),
        }
    }

    #[must_use]
    pub fn is_stage_unlocked(&self, stage_id: u32) -> bool {
        if self.index_of(stage_id).is_none() {
            return false;
        }
        match self.model {
            ProgressionModel::Unlock => stage_id == 1 || self.cleared.contains(&(stage_id - 1)),
            ProgressionModel::Linear => {
                usize::try_from(stage_id).is_ok_and(|id| id <= self.furthest_stage_index + 1)
            }
        }
    }

    #[must_use]
    pub fn classify_grade(&self) -> GradeTier {
        GradeTier::classify(self.success_count(), self.stress)
    }

    fn set_stage_index(&mut self, index: usize) {
        self.current_stage_index = index;
        self.furthest_stage_index = self.furthest_stage_index.max(index);
    }

    fn index_of(&self, stage_id: u32) -> Option<usize> {
        let id = usize::try_from(stage_id).ok()?;
        (1..=self.stage_count).contains(&id).then(|| id - 1)
    }
}
