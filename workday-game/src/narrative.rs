//! Chat-style narrative beats shown before each stage's minigame.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::catalog::{Period, is_clock_time, is_hex_color};

const BUILTIN_NARRATIVES: &str = include_str!("../assets/narratives.json");

/// How a narrative line is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Centered status line.
    System,
    /// The protagonist's inner voice.
    Thought,
    /// Incoming chat bubble from someone else.
    Left,
    /// Outgoing chat bubble from the protagonist.
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeBeat {
    /// Zero-based stage index the beat leads into.
    pub stage_index: usize,
    pub time: String,
    pub period: Period,
    pub display_color: String,
    #[serde(default)]
    pub is_prologue: bool,
    pub messages: Vec<ChatMessage>,
}

impl NarrativeBeat {
    /// Whether the beat's background is dark enough to need light text.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        let hex = self.display_color.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .map_or(0, u32::from)
        };
        let average = (channel(0..2) + channel(2..4) + channel(4..6)) / 3;
        average < 128
    }
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("failed to parse narrative JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("stage index {stage_index} has more than one beat")]
    DuplicateBeat { stage_index: usize },
    #[error("beat for stage index {stage_index} has no messages")]
    EmptyBeat { stage_index: usize },
    #[error("beat for stage index {stage_index} has malformed time '{value}'")]
    MalformedTime { stage_index: usize, value: String },
    #[error("beat for stage index {stage_index} has malformed colour '{value}'")]
    MalformedColor { stage_index: usize, value: String },
    #[error("no narrative beat for stage index {stage_index}")]
    MissingBeat { stage_index: usize },
}

#[derive(Deserialize)]
struct NarrativeFile {
    beats: Vec<NarrativeBeat>,
}

/// Narrative beats keyed by zero-based stage index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NarrativeCatalog {
    beats: BTreeMap<usize, NarrativeBeat>,
}

impl NarrativeCatalog {
    /// Parse and validate narrative beats from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`NarrativeError`] for malformed JSON, duplicate stage
    /// indices, empty beats, or malformed clock/colour metadata.
    pub fn from_json(json: &str) -> Result<Self, NarrativeError> {
        let file: NarrativeFile = serde_json::from_str(json)?;
        let mut beats = BTreeMap::new();
        for beat in file.beats {
            let stage_index = beat.stage_index;
            if beat.messages.is_empty() {
                return Err(NarrativeError::EmptyBeat { stage_index });
            }
            if !is_clock_time(&beat.time) {
                return Err(NarrativeError::MalformedTime {
                    stage_index,
                    value: beat.time,
                });
            }
            if !is_hex_color(&beat.display_color) {
                return Err(NarrativeError::MalformedColor {
                    stage_index,
                    value: beat.display_color,
                });
            }
            if beats.insert(stage_index, beat).is_some() {
                return Err(NarrativeError::DuplicateBeat { stage_index });
            }
        }
        Ok(Self { beats })
    }

    /// # Panics
    ///
    /// Panics if the embedded asset is invalid, which the test suite rules out.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static NARRATIVES: OnceLock<NarrativeCatalog> = OnceLock::new();
        NARRATIVES.get_or_init(|| {
            Self::from_json(BUILTIN_NARRATIVES).expect("embedded narrative catalog is valid")
        })
    }

    #[must_use]
    pub fn get(&self, stage_index: usize) -> Option<&NarrativeBeat> {
        self.beats.get(&stage_index)
    }

    /// Check that every stage index below `stage_count` has a beat.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::MissingBeat`] for the first uncovered index.
    pub fn covers(&self, stage_count: usize) -> Result<(), NarrativeError> {
        match (0..stage_count).find(|index| !self.beats.contains_key(index)) {
            Some(stage_index) => Err(NarrativeError::MissingBeat { stage_index }),
            None => Ok(()),
        }
    }

    /// # Panics
    ///
    /// Panics when no beat exists for the index. Catalogs that went through
    /// [`NarrativeCatalog::covers`] never hit this for a valid stage index.
    #[must_use]
    pub fn beat_for(&self, stage_index: usize) -> &NarrativeBeat {
        self.get(stage_index)
            .unwrap_or_else(|| panic!("no narrative beat for stage index {stage_index}"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
}
