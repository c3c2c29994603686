//! Poem records and the dataset they are dealt from.
//!
//! The built-in set is embedded from `data/hyakunin.json` at compile time. A page
//! can also hand over its own JSON array; in both cases records are validated
//! once and malformed ones are dropped before the game starts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type PoemId = u32;

const BUILTIN_POEMS: &str = include_str!("../data/hyakunin.json");

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoemRecord {
    pub id: PoemId,
    pub first_half: String,
    pub second_half: String,
    pub first_half_kana: String,
    pub second_half_kana: String,
    /// Leading characters of the first half's reading that identify the poem
    /// among the full hundred.
    pub deciding_prefix_len: usize,
    pub author: String,
    pub author_kana: String,
    pub image_ref: Option<String>,
}

impl PoemRecord {
    /// Text recited for this poem: both halves separated by one space.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.first_half, self.second_half)
    }

    /// Split the first-half reading into (deciding prefix, remainder). Spaces do
    /// not count towards the prefix length; a length past the end is clamped.
    pub fn deciding_prefix(&self) -> (&str, &str) {
        let reading = &self.first_half_kana;
        let mut counted = 0;
        for (byte_idx, c) in reading.char_indices() {
            if counted == self.deciding_prefix_len {
                return reading.split_at(byte_idx);
            }
            if !c.is_whitespace() {
                counted += 1;
            }
        }
        (reading.as_str(), "")
    }
}

// Loose mirror of a record as found in JSON. Every field is optional so a single
// bad entry can be reported and skipped instead of failing the whole array.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPoem {
    id: Option<PoemId>,
    first_half: Option<String>,
    second_half: Option<String>,
    first_half_kana: Option<String>,
    second_half_kana: Option<String>,
    deciding_prefix_len: Option<usize>,
    author: Option<String>,
    author_kana: Option<String>,
    image_ref: Option<String>,
}

impl RawPoem {
    fn into_record(self) -> Option<PoemRecord> {
        let id = self.id?;
        let first_half = self.first_half.filter(|s| !s.trim().is_empty())?;
        let second_half = self.second_half.filter(|s| !s.trim().is_empty())?;
        Some(PoemRecord {
            id,
            first_half,
            second_half,
            first_half_kana: self.first_half_kana.unwrap_or_default(),
            second_half_kana: self.second_half_kana.unwrap_or_default(),
            deciding_prefix_len: self.deciding_prefix_len.unwrap_or(0),
            author: self.author.unwrap_or_default(),
            author_kana: self.author_kana.unwrap_or_default(),
            image_ref: self.image_ref.filter(|s| !s.is_empty()),
        })
    }
}

/// Immutable, ordered, validated poem collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    poems: Vec<PoemRecord>,
}

impl Dataset {
    /// Validate already-built records. Duplicate ids keep the first occurrence.
    pub fn new(poems: Vec<PoemRecord>, min_len: usize) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(poems.len());
        for poem in poems {
            if poem.first_half.trim().is_empty() || poem.second_half.trim().is_empty() {
                log::warn!("dropping poem {}: empty text", poem.id);
                continue;
            }
            if !seen.insert(poem.id) {
                log::warn!("dropping poem {}: duplicate id", poem.id);
                continue;
            }
            kept.push(poem);
        }
        if kept.is_empty() {
            return Err(ConfigError::EmptyDataset);
        }
        if kept.len() < min_len {
            return Err(ConfigError::TooFewPoems { found: kept.len(), required: min_len });
        }
        log::info!("poem dataset loaded: {} poems", kept.len());
        Ok(Self { poems: kept })
    }

    /// Parse a JSON array of records, skipping entries that fail validation.
    pub fn from_json(json: &str, min_len: usize) -> Result<Self, ConfigError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let total = entries.len();
        let poems: Vec<PoemRecord> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| {
                let record = serde_json::from_value::<RawPoem>(value)
                    .ok()
                    .and_then(RawPoem::into_record);
                if record.is_none() {
                    log::warn!("dropping dataset entry #{idx}: missing id or text");
                }
                record
            })
            .collect();
        if poems.len() < total {
            log::warn!("{} of {} dataset entries were invalid", total - poems.len(), total);
        }
        Self::new(poems, min_len)
    }

    pub fn builtin(min_len: usize) -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_POEMS, min_len)
    }

    pub fn poems(&self) -> &[PoemRecord] {
        &self.poems
    }

    pub fn len(&self) -> usize {
        self.poems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poems.is_empty()
    }

    pub fn get(&self, id: PoemId) -> Option<&PoemRecord> {
        self.poems.iter().find(|p| p.id == id)
    }
}
