//! Named iris codes kept for later matching.
//!
//! The JSON layout (`camelCase` keys, codes as nested 0/1 rows) is the
//! interchange format of an external store; this module never touches
//! storage itself.

use serde::{Deserialize, Serialize};

use crate::code::IrisCode;
use crate::compare::{ComparatorConfig, ComparisonReport, compare};
use crate::error::IrisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

/// Optional provenance of a saved code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTags {
    pub person_id: Option<u32>,
    pub eye: Option<Eye>,
    pub image_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCodeRecord {
    pub id: String,
    pub name: String,
    pub code: IrisCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye: Option<Eye>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeLibrary {
    records: Vec<SavedCodeRecord>,
}

impl CodeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stores `code` under the trimmed `name`. The id is the timestamp,
    /// suffixed when another record already uses it.
    pub fn save(
        &mut self,
        name: &str,
        code: IrisCode,
        tags: RecordTags,
        timestamp: u64,
    ) -> Result<&SavedCodeRecord, IrisError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IrisError::BlankName);
        }

        let base = timestamp.to_string();
        let mut id = base.clone();
        let mut n = 1;
        while self.get(&id).is_some() {
            id = format!("{base}-{n}");
            n += 1;
        }

        self.records.push(SavedCodeRecord {
            id,
            name: name.to_owned(),
            code,
            person_id: tags.person_id,
            eye: tags.eye,
            image_id: tags.image_id,
            timestamp,
        });
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    pub fn remove(&mut self, id: &str) -> Option<SavedCodeRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&SavedCodeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedCodeRecord> {
        self.records.iter()
    }

    /// Closest stored code of the same shape. Earlier records win ties.
    pub fn best_match(
        &self,
        code: &IrisCode,
        cfg: &ComparatorConfig,
    ) -> Result<Option<(&SavedCodeRecord, ComparisonReport)>, IrisError> {
        let mut best: Option<(&SavedCodeRecord, ComparisonReport)> = None;
        for record in self.records.iter().filter(|r| r.code.dims() == code.dims()) {
            let report = compare(code, &record.code, cfg)?;
            if best.as_ref().is_none_or(|(_, b)| report.distance < b.distance) {
                best = Some((record, report));
            }
        }
        Ok(best)
    }

    pub fn to_json(&self) -> Result<String, IrisError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    pub fn from_json(json: &str) -> Result<Self, IrisError> {
        let records: Vec<SavedCodeRecord> = serde_json::from_str(json)?;
        Ok(Self { records })
    }
}
