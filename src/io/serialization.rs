// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Item list export and import.
//!
//! This module handles exporting and importing the plain (unescaped) item
//! list in YAML and JSON formats.

use crate::models::item::AnnotationItem;
use crate::models::store::ItemStore;
use anyhow::{bail, Result};
use std::path::Path;

/// Export the item list to YAML format.
pub fn export_yaml(store: &ItemStore, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(store.items())?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export the item list to JSON format.
pub fn export_json(store: &ItemStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(store.items())?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import an item list from YAML format.
pub fn import_yaml(path: &Path) -> Result<ItemStore> {
    let yaml = std::fs::read_to_string(path)?;
    let items: Vec<AnnotationItem> = serde_yaml::from_str(&yaml)?;
    Ok(ItemStore::from_items(items))
}

/// Import an item list from JSON format.
pub fn import_json(path: &Path) -> Result<ItemStore> {
    let json = std::fs::read_to_string(path)?;
    let items: Vec<AnnotationItem> = serde_json::from_str(&json)?;
    Ok(ItemStore::from_items(items))
}

/// Export by file extension.
pub fn export(store: &ItemStore, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(store, path),
        Some("json") => export_json(store, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Import by file extension.
pub fn import(path: &Path) -> Result<ItemStore> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{ItemId, ItemKind, Length, Properties};
    use tempfile::tempdir;

    fn sample() -> ItemStore {
        let mut store = ItemStore::new();
        let mut item = AnnotationItem::new(
            ItemId(7),
            ItemKind::TextBlock,
            Properties::new(1.5, 4.0).with("label", "<b>Hi</b>"),
        );
        item.position.left = Length::Percent(12.5);
        store.add(item).unwrap();
        store
    }

    #[test]
    fn test_yaml_export_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.yaml");
        export(&sample(), &path).unwrap();

        let store = import(&path).unwrap();
        let item = store.get(ItemId(7)).unwrap();
        assert_eq!(item.position.left, Length::Percent(12.5));
        assert_eq!(item.properties.text("label"), "<b>Hi</b>");
    }

    #[test]
    fn test_json_export_is_unescaped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        export(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<b>Hi</b>"));
        assert_eq!(import(&path).unwrap(), sample());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempdir().unwrap();
        assert!(export(&sample(), &dir.path().join("items.txt")).is_err());
    }
}
