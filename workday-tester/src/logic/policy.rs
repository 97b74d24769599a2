use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use workday_game::{MinigameVariant, StageDefinition};

/// What the simulated player does with a running minigame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigameAction {
    Pass,
    Fail,
    /// Do nothing and let the countdown run out.
    Wait,
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Decide how the minigame for `stage` ends.
    fn decide(&mut self, stage: &StageDefinition, variant: &MinigameVariant) -> MinigameAction;
}

/// Built-in strategies selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    Perfect,
    Hopeless,
    CoinFlip,
    Timeout,
    Streaky,
}

impl PolicyKind {
    pub const ALL: [Self; 5] = [
        Self::Perfect,
        Self::Hopeless,
        Self::CoinFlip,
        Self::Timeout,
        Self::Streaky,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Hopeless => "hopeless",
            Self::CoinFlip => "coin-flip",
            Self::Timeout => "timeout",
            Self::Streaky => "streaky",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Perfect => "wins every minigame",
            Self::Hopeless => "loses every minigame",
            Self::CoinFlip => "wins half the time",
            Self::Timeout => "never touches the controls",
            Self::Streaky => "wins in streaks, then slips",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Perfect => Box::new(PerfectPolicy),
            Self::Hopeless => Box::new(HopelessPolicy),
            Self::CoinFlip => Box::new(CoinFlipPolicy {
                rng: ChaCha20Rng::seed_from_u64(seed),
            }),
            Self::Timeout => Box::new(TimeoutPolicy),
            Self::Streaky => Box::new(StreakyPolicy::new(seed)),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown policy: {value}"))
    }
}

/// Expand a comma list of policy keys. `all` selects every policy.
pub fn parse_policy_list(tokens: &[String]) -> Result<Vec<PolicyKind>, String> {
    let mut kinds = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            kinds.extend(PolicyKind::ALL);
        } else {
            kinds.push(token.parse()?);
        }
    }
    kinds.sort_unstable();
    kinds.dedup();
    if kinds.is_empty() {
        return Err("no policies selected".to_string());
    }
    Ok(kinds)
}

struct PerfectPolicy;
struct HopelessPolicy;
struct TimeoutPolicy;

struct CoinFlipPolicy {
    rng: ChaCha20Rng,
}

struct StreakyPolicy {
    rng: ChaCha20Rng,
    remaining: u32,
}

impl StreakyPolicy {
    fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let remaining = rng.gen_range(2..=5);
        Self { rng, remaining }
    }
}

impl PlayerPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn decide(&mut self, _stage: &StageDefinition, _variant: &MinigameVariant) -> MinigameAction {
        MinigameAction::Pass
    }
}

impl PlayerPolicy for HopelessPolicy {
    fn name(&self) -> &'static str {
        "Hopeless"
    }

    fn decide(&mut self, _stage: &StageDefinition, _variant: &MinigameVariant) -> MinigameAction {
        MinigameAction::Fail
    }
}

impl PlayerPolicy for TimeoutPolicy {
    fn name(&self) -> &'static str {
        "Timeout"
    }

    fn decide(&mut self, _stage: &StageDefinition, variant: &MinigameVariant) -> MinigameAction {
        // Untimed minigames never expire on their own.
        if variant.time_limit_secs.is_some() {
            MinigameAction::Wait
        } else {
            MinigameAction::Fail
        }
    }
}

impl PlayerPolicy for CoinFlipPolicy {
    fn name(&self) -> &'static str {
        "Coin Flip"
    }

    fn decide(&mut self, _stage: &StageDefinition, _variant: &MinigameVariant) -> MinigameAction {
        if self.rng.gen_bool(0.5) {
            MinigameAction::Pass
        } else {
            MinigameAction::Fail
        }
    }
}

impl PlayerPolicy for StreakyPolicy {
    fn name(&self) -> &'static str {
        "Streaky"
    }

    fn decide(&mut self, _stage: &StageDefinition, _variant: &MinigameVariant) -> MinigameAction {
        if self.remaining == 0 {
            self.remaining = self.rng.gen_range(2..=5);
            MinigameAction::Fail
        } else {
            self.remaining -= 1;
            MinigameAction::Pass
        }
    }
}
