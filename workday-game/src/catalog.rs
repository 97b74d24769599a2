//! Static stage catalog: the ten stops of the workday and their minigames.
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

const BUILTIN_STAGES: &str = include_str!("../assets/stages.json");

/// Most stages ship a single minigame; a second slot stays inline.
pub type VariantList = SmallVec<[MinigameVariant; 2]>;

/// Half of the day a clock reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Period {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the scene controller that runs a minigame variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKey {
    Alarm,
    Booting,
    MenuRoulette,
    SleepFight,
    FileSave,
    AltTab,
    Charging,
    Mosquito,
    Somek,
    Resign,
}

impl ControllerKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alarm => "alarm",
            Self::Booting => "booting",
            Self::MenuRoulette => "menu_roulette",
            Self::SleepFight => "sleep_fight",
            Self::FileSave => "file_save",
            Self::AltTab => "alt_tab",
            Self::Charging => "charging",
            Self::Mosquito => "mosquito",
            Self::Somek => "somek",
            Self::Resign => "resign",
        }
    }
}

impl fmt::Display for ControllerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete puzzle bound to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameVariant {
    pub variant_id: u32,
    pub display_name: String,
    pub description: String,
    pub controller: ControllerKey,
    /// Countdown after which the attempt fails. Round-based puzzles have none.
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    /// Pause between the terminal interaction and the result screen.
    #[serde(default = "default_outro_ms")]
    pub outro_ms: u32,
}

fn default_outro_ms() -> u32 {
    1_500
}

/// A fixed point in the workday narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: u32,
    pub name: String,
    pub emoji: String,
    pub time: String,
    pub period: Period,
    pub display_color: String,
    pub minigames: VariantList,
}

impl StageDefinition {
    /// The variant used when a stage is entered outside the normal flow.
    ///
    /// # Panics
    ///
    /// Never for catalogs built through [`StageCatalog::from_json`], which
    /// reject stages without variants.
    #[must_use]
    pub fn first_variant(&self) -> &MinigameVariant {
        self.minigames
            .first()
            .expect("validated stages carry at least one minigame")
    }

    #[must_use]
    pub fn variant(&self, variant_id: u32) -> Option<&MinigameVariant> {
        self.minigames.iter().find(|v| v.variant_id == variant_id)
    }
}

/// Failures detected while loading a stage catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog contains no stages")]
    Empty,
    #[error("stage at position {position} has id {found}, expected {expected}")]
    NonDenseIds {
        position: usize,
        expected: u32,
        found: u32,
    },
    #[error("stage {stage_id} has no minigame variants")]
    NoVariants { stage_id: u32 },
    #[error("variant id {variant_id} appears more than once")]
    DuplicateVariant { variant_id: u32 },
    #[error("stage {stage_id} has malformed clock time '{value}'")]
    MalformedTime { stage_id: u32, value: String },
    #[error("stage {stage_id} has malformed colour '{value}'")]
    MalformedColor { stage_id: u32, value: String },
}

#[derive(Deserialize)]
struct CatalogFile {
    stages: Vec<StageDefinition>,
}

/// Ordered, immutable list of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    stages: Vec<StageDefinition>,
}

impl StageCatalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the JSON is malformed or any stage
    /// breaks the catalog rules (dense ids starting at 1, at least one
    /// variant, unique variant ids, `HH:MM` times and `#rrggbb` colours).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_stages(file.stages)
    }

    /// Validate a pre-built list of stages.
    ///
    /// # Errors
    ///
    /// Same rules as [`StageCatalog::from_json`].
    pub fn from_stages(stages: Vec<StageDefinition>) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen_variants = HashSet::new();
        for (position, stage) in stages.iter().enumerate() {
            let expected = u32::try_from(position + 1).unwrap_or(u32::MAX);
            if stage.id != expected {
                return Err(CatalogError::NonDenseIds {
                    position,
                    expected,
                    found: stage.id,
                });
            }
            if stage.minigames.is_empty() {
                return Err(CatalogError::NoVariants { stage_id: stage.id });
            }
            for variant in &stage.minigames {
                if !seen_variants.insert(variant.variant_id) {
                    return Err(CatalogError::DuplicateVariant {
                        variant_id: variant.variant_id,
                    });
                }
            }
            if !is_clock_time(&stage.time) {
                return Err(CatalogError::MalformedTime {
                    stage_id: stage.id,
                    value: stage.time.clone(),
                });
            }
            if !is_hex_color(&stage.display_color) {
                return Err(CatalogError::MalformedColor {
                    stage_id: stage.id,
                    value: stage.display_color.clone(),
                });
            }
        }
        Ok(Self { stages })
    }

    /// The catalog shipped with the game.
    ///
    /// # Panics
    ///
    /// Panics if the embedded asset is invalid, which the test suite rules out.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<StageCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::from_json(BUILTIN_STAGES).expect("embedded stage catalog is valid")
        })
    }

    #[must_use]
    pub fn get_stage(&self, id: u32) -> Option<&StageDefinition> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.stages.get(index)
    }

    /// Look up a stage that callers know exists.
    ///
    /// # Panics
    ///
    /// Panics on an unknown id; asking for one is a programming error.
    #[must_use]
    pub fn stage(&self, id: u32) -> &StageDefinition {
        self.get_stage(id)
            .unwrap_or_else(|| panic!("stage {id} is not in the catalog"))
    }

    /// Stage at a zero-based index.
    #[must_use]
    pub fn stage_at(&self, index: usize) -> Option<&StageDefinition> {
        self.stages.get(index)
    }

    #[must_use]
    pub fn all_stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

pub(crate) fn is_clock_time(value: &str) -> bool {
    static CLOCK_TIME: OnceLock<Regex> = OnceLock::new();
    CLOCK_TIME
        .get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("clock pattern compiles"))
        .is_match(value)
}

pub(crate) fn is_hex_color(value: &str) -> bool {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR
        .get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("colour pattern compiles"))
        .is_match(value)
}
