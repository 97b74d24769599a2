//! Centralized balance and pacing constants for Workday game logic.
//!
//! Stress penalties and grade thresholds define the scoring math and are
//! only adjusted through reviewed code changes. Scene pacing defaults live
//! here too but can be overridden through [`crate::config::SceneTimings`].

// Stress ---------------------------------------------------------------------
pub const STRESS_MIN: i32 = 0;
pub const STRESS_MAX: i32 = 100;
pub const STRESS_SUCCESS_PENALTY: i32 = 5;
pub const STRESS_FAILURE_PENALTY: i32 = 15;
/// Applied every time the player leaves a narrative screen.
pub const STRESS_NARRATIVE_PENALTY: i32 = 2;

pub(crate) const STRESS_BAND_CALM_MAX: i32 = 40;
pub(crate) const STRESS_BAND_TENSE_MAX: i32 = 70;
pub(crate) const STRESS_VIGNETTE_FLOOR: i32 = 50;
pub(crate) const STRESS_VIGNETTE_DIVISOR: f32 = 200.0;
pub(crate) const STRESS_VIGNETTE_MAX_ALPHA: f32 = 0.3;

// Grades ---------------------------------------------------------------------
pub const GRADE_PERFECT_SUCCESSES: usize = 10;
/// Highest stress a perfect run may end on and still top the ladder.
pub const GRADE_LOW_STRESS_LIMIT: i32 = 70;
pub const GRADE_VETERAN_MIN_SUCCESSES: usize = 7;
pub const GRADE_INTERN_MIN_SUCCESSES: usize = 4;

// Scene pacing (milliseconds) -------------------------------------------------
pub(crate) const BOOT_FADE_MS: u32 = 500;
pub(crate) const PROLOGUE_HOLD_MS: u32 = 1_800;
pub(crate) const MESSAGE_INTERVAL_MS: u32 = 400;
pub(crate) const ADVANCE_ARM_MS: u32 = 200;
pub(crate) const INTRO_LEAD_MS: u32 = 600;
pub(crate) const INTRO_STEP_MS: u32 = 600;
pub(crate) const INTRO_GO_MS: u32 = 250;
pub(crate) const MINIGAME_TICK_MS: u32 = 1_000;
pub(crate) const RESULT_SUCCESS_HOLD_MS: u32 = 2_000;
pub(crate) const RESULT_FAILURE_HOLD_MS: u32 = 2_500;

// Minigame countdown ----------------------------------------------------------
pub const INTRO_COUNTDOWN_FROM: u8 = 3;
pub(crate) const URGENCY_WARNING_SECS: u32 = 5;
pub(crate) const URGENCY_CRITICAL_SECS: u32 = 3;
