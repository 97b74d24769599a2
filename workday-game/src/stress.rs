//! Presentation helpers derived from the stress meter.
use serde::{Deserialize, Serialize};

use crate::constants::{
    STRESS_BAND_CALM_MAX, STRESS_BAND_TENSE_MAX, STRESS_MAX, STRESS_MIN,
    STRESS_VIGNETTE_DIVISOR, STRESS_VIGNETTE_FLOOR, STRESS_VIGNETTE_MAX_ALPHA,
};

/// Colour tier of the stress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressBand {
    Calm,
    Tense,
    Critical,
}

impl StressBand {
    #[must_use]
    pub const fn of(stress: i32) -> Self {
        if stress > STRESS_BAND_TENSE_MAX {
            Self::Critical
        } else if stress > STRESS_BAND_CALM_MAX {
            Self::Tense
        } else {
            Self::Calm
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Calm => "#e94560",
            Self::Tense => "#ff8800",
            Self::Critical => "#ff0000",
        }
    }
}

/// Clamp any stress value into the meter's range.
#[must_use]
pub const fn clamp_stress(value: i32) -> i32 {
    if value < STRESS_MIN {
        STRESS_MIN
    } else if value > STRESS_MAX {
        STRESS_MAX
    } else {
        value
    }
}

/// Opacity of the red overlay painted over narrative screens.
#[must_use]
pub fn vignette_alpha(stress: i32) -> f32 {
    if stress <= STRESS_VIGNETTE_FLOOR {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let excess = (stress - STRESS_VIGNETTE_FLOOR) as f32;
    (excess / STRESS_VIGNETTE_DIVISOR).min(STRESS_VIGNETTE_MAX_ALPHA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_bar_colours() {
        assert_eq!(StressBand::of(0), StressBand::Calm);
        assert_eq!(StressBand::of(40), StressBand::Calm);
        assert_eq!(StressBand::of(41), StressBand::Tense);
        assert_eq!(StressBand::of(70), StressBand::Tense);
        assert_eq!(StressBand::of(71), StressBand::Critical);
        assert_eq!(StressBand::Critical.color(), "#ff0000");
    }

    #[test]
    fn vignette_starts_above_fifty_and_caps() {
        assert!(vignette_alpha(50).abs() < f32::EPSILON);
        assert!((vignette_alpha(70) - 0.1).abs() < 1e-6);
        assert!((vignette_alpha(100) - 0.25).abs() < 1e-6);
        assert!((vignette_alpha(500) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn clamp_stays_in_range() {
        assert_eq!(clamp_stress(-4), 0);
        assert_eq!(clamp_stress(140), 100);
        assert_eq!(clamp_stress(33), 33);
    }
}
