//! End-of-day grade ladder.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    GRADE_INTERN_MIN_SUCCESSES, GRADE_LOW_STRESS_LIMIT, GRADE_PERFECT_SUCCESSES,
    GRADE_VETERAN_MIN_SUCCESSES,
};

/// One of the five narrative tiers awarded on the ending screen, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeTier {
    Legend,
    Survivor,
    Veteran,
    Intern,
    Burnout,
}

impl GradeTier {
    pub const ALL: [Self; 5] = [
        Self::Legend,
        Self::Survivor,
        Self::Veteran,
        Self::Intern,
        Self::Burnout,
    ];

    /// Classify a finished session.
    ///
    /// The checks run top to bottom and the first match wins. A clean linear
    /// day ends on exactly [`GRADE_LOW_STRESS_LIMIT`], so it still tops the
    /// ladder; any retry on top of that drops a perfect run to `Survivor`.
    #[must_use]
    pub const fn classify(success_count: usize, stress: i32) -> Self {
        if success_count == GRADE_PERFECT_SUCCESSES && stress <= GRADE_LOW_STRESS_LIMIT {
            Self::Legend
        } else if success_count == GRADE_PERFECT_SUCCESSES {
            Self::Survivor
        } else if success_count >= GRADE_VETERAN_MIN_SUCCESSES {
            Self::Veteran
        } else if success_count >= GRADE_INTERN_MIN_SUCCESSES {
            Self::Intern
        } else {
            Self::Burnout
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legend => "legend",
            Self::Survivor => "survivor",
            Self::Veteran => "veteran",
            Self::Intern => "intern",
            Self::Burnout => "burnout",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Legend => "Legendary Quitter",
            Self::Survivor => "Battle-Scarred Survivor",
            Self::Veteran => "Seasoned Office Veteran",
            Self::Intern => "Eternal Intern",
            Self::Burnout => "Total Burnout",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Legend => "👑",
            Self::Survivor => "🛡️",
            Self::Veteran => "💼",
            Self::Intern => "☕",
            Self::Burnout => "🔥",
        }
    }

    #[must_use]
    pub const fn comment(self) -> &'static str {
        match self {
            Self::Legend => "Walked out the door without breaking a sweat.",
            Self::Survivor => "You made it. Your blood pressure did not.",
            Self::Veteran => "Most days you win. Today mostly counted.",
            Self::Intern => "Half the day happened to you.",
            Self::Burnout => "Tomorrow is another Monday.",
        }
    }
}

impl fmt::Display for GradeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
