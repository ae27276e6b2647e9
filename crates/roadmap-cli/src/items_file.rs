//! Learning items read from a local JSON file
//!
//! Accepts either a bare array of items or an object with an `items`
//! array. Each item is decoded leniently, so a stray string difficulty
//! falls back to the default instead of rejecting the file.

use async_trait::async_trait;
use roadmap_core::{GenerationError, GenerationRequest, RoadmapGenerator};
use roadmap_model::LearningItem;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub(crate) fn parse_items(raw: &str) -> Result<Vec<LearningItem>, GenerationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| GenerationError::InvalidResponse(format!("not JSON: {e}")))?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(GenerationError::InvalidResponse(
                    "expected an `items` array".to_string(),
                ))
            }
        },
        _ => {
            return Err(GenerationError::InvalidResponse(
                "expected an array of items".to_string(),
            ))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| GenerationError::InvalidResponse(format!("item {index}: {e}")))
        })
        .collect()
}

pub(crate) fn read_items(path: &Path) -> anyhow::Result<Vec<LearningItem>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(parse_items(&raw)?)
}

/// Stands in for the generation service: every request yields the file's
/// items
#[derive(Debug, Clone)]
pub(crate) struct ItemsFile {
    path: PathBuf,
}

impl ItemsFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RoadmapGenerator for ItemsFile {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<LearningItem>, GenerationError> {
        tracing::debug!(path = %self.path.display(), title = %request.title, "Reading items");
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| GenerationError::Network(format!("{}: {e}", self.path.display())))?;
        parse_items(&raw)
    }
}

/// Used by commands that never generate
#[derive(Debug, Clone, Copy)]
pub(crate) struct NoGenerator;

#[async_trait]
impl RoadmapGenerator for NoGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<LearningItem>, GenerationError> {
        Err(GenerationError::Auth(
            "no generation service configured".to_string(),
        ))
    }
}
