// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Loading and saving the item list.
//!
//! The stored list is a JSON string inside a record. Markup characters are
//! escaped on save so the stored text can be embedded in HTML safely.

use crate::models::segment::Segment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored item list with its surrounding metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// JSON array of items, markup-escaped
    pub items_json: String,
    /// File area holding uploaded media for this draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_file_area_id: Option<u64>,
    /// Interaction window the items were authored against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<Segment>,
}

/// What an explicit save sends to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePayload {
    pub items_json: String,
    pub draft_file_area_id: Option<u64>,
}

impl SavePayload {
    /// Build a payload from raw item JSON, escaping markup.
    pub fn new(raw_items_json: &str, draft_file_area_id: Option<u64>) -> Self {
        Self {
            items_json: escape_markup(raw_items_json),
            draft_file_area_id,
        }
    }
}

/// Replace `&`, `<` and `>` with their HTML entities.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Reverse of [`escape_markup`], in a single pass so decoded text is never
/// decoded twice. Unknown entities are kept as written.
pub fn unescape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (decoded, len) = if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else if rest.starts_with("&amp;") {
            ('&', 5)
        } else {
            ('&', 1)
        };
        out.push(decoded);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

/// Where item lists are read from and written to.
pub trait PersistenceBackend {
    fn load(&mut self) -> Result<PersistedRecord>;
    fn save(&mut self, payload: &SavePayload) -> Result<PersistedRecord>;
}

/// Stores the record as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<PersistedRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let record = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(record))
    }
}

impl PersistenceBackend for JsonFileBackend {
    fn load(&mut self) -> Result<PersistedRecord> {
        Ok(self.read()?.unwrap_or_default())
    }

    fn save(&mut self, payload: &SavePayload) -> Result<PersistedRecord> {
        let segment = match self.read() {
            Ok(existing) => existing.and_then(|r| r.segment),
            Err(e) => {
                log::warn!("{:#}, overwriting", e);
                None
            }
        };
        let record = PersistedRecord {
            items_json: payload.items_json.clone(),
            draft_file_area_id: payload.draft_file_area_id,
            segment,
        };
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::info!("Saved item list to {}", self.path.display());
        Ok(record)
    }
}

/// Keeps the record in memory; used for unsaved sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    pub record: PersistedRecord,
    pub saves: usize,
}

impl MemoryBackend {
    pub fn new(record: PersistedRecord) -> Self {
        Self { record, saves: 0 }
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load(&mut self) -> Result<PersistedRecord> {
        Ok(self.record.clone())
    }

    fn save(&mut self, payload: &SavePayload) -> Result<PersistedRecord> {
        self.record.items_json = payload.items_json.clone();
        self.record.draft_file_area_id = payload.draft_file_area_id;
        self.saves += 1;
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_escape_roundtrip() {
        let raw = r#"[{"label":"<script>alert(1)</script>"}]"#;
        let escaped = escape_markup(raw);
        assert_eq!(escaped, r#"[{"label":"&lt;script&gt;alert(1)&lt;/script&gt;"}]"#);
        assert_eq!(unescape_markup(&escaped), raw);
    }

    #[test]
    fn test_escape_keeps_literal_entities() {
        let raw = r#"[{"label":"a &lt; b && c &gt; d &amp; <e>"}]"#;
        let escaped = escape_markup(raw);
        assert!(!escaped.contains('<'));
        assert_eq!(unescape_markup(&escaped), raw);
        assert_eq!(unescape_markup("x & y &copy;"), "x & y &copy;");
    }

    #[test]
    fn test_file_backend_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(
            &path,
            r#"{"items_json":"[]","segment":{"start":5.0,"end":25.0,"skip_segments":[]}}"#,
        )
        .unwrap();

        let mut backend = JsonFileBackend::new(&path);
        let payload = SavePayload::new(r#"[{"label":"<b>"}]"#, Some(42));
        let saved = backend.save(&payload).unwrap();
        assert_eq!(saved.segment, Some(Segment::new(5.0, 25.0)));

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.items_json, r#"[{"label":"&lt;b&gt;"}]"#);
        assert_eq!(loaded.draft_file_area_id, Some(42));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let mut backend = JsonFileBackend::new(dir.path().join("none.json"));
        assert_eq!(backend.load().unwrap(), PersistedRecord::default());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        assert!(JsonFileBackend::new(&path).load().is_err());
    }
}
