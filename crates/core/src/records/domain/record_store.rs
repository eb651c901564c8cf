use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::domain::spine_metrics::SpineMetrics;
use crate::pipeline::frame_result::FrameResult;
use crate::pose::domain::landmark::LandmarkName;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordStoreError {
    #[error("record store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write snapshot {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },
}

/// What a stored record holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Metrics and landmarks of an analyzed frame.
    #[default]
    Analysis,
    /// A curated image (e.g. an X-ray) filed under a condition, without
    /// pose analysis.
    Reference,
}

/// One persisted entry, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: RecordKind,
    /// Activity label; the condition name for reference records.
    pub activity: String,
    /// Feedback context, e.g. "medical" or "sports".
    pub domain: String,
    pub image_path: PathBuf,
    #[serde(default)]
    pub metrics: SpineMetrics,
    #[serde(default)]
    pub landmarks: Vec<LandmarkName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Persistence collaborator for analyzed frames.
pub trait RecordStore: Send {
    /// Stores the first person of `result` with a snapshot of `image`.
    ///
    /// Returns the new record id, or an empty string without writing
    /// anything when `result` has no persons.
    fn save(
        &mut self,
        result: &FrameResult,
        image: &Frame,
        activity: &str,
        domain: &str,
    ) -> Result<String, RecordStoreError>;

    /// Files `image` as a reference entry for `condition`.
    ///
    /// The entry carries no metrics or landmarks; its activity is the
    /// condition, so `query(Some(condition))` finds it.
    fn save_reference(
        &mut self,
        image: &Frame,
        condition: &str,
        description: &str,
        domain: &str,
    ) -> Result<String, RecordStoreError>;

    /// Records whose activity equals `activity`, or all records for `None`.
    fn query(&self, activity: Option<&str>) -> Result<Vec<StoredRecord>, RecordStoreError>;
}
