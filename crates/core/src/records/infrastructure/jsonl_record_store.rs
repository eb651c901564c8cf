use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::analysis::domain::spine_metrics::SpineMetrics;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
use crate::pipeline::frame_result::FrameResult;
use crate::records::domain::record_store::{
    RecordKind, RecordStore, RecordStoreError, StoredRecord,
};
use crate::shared::frame::Frame;

const INDEX_FILE: &str = "index.jsonl";
const IMAGES_DIR: &str = "images";

/// File-backed record store.
///
/// Layout under the root directory:
/// - `index.jsonl`: one [`StoredRecord`] per line, append-only
/// - `images/<id>.jpg`: the source snapshot of each record
pub struct JsonlRecordStore {
    root: PathBuf,
    writer: Box<dyn ImageWriter>,
}

impl JsonlRecordStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, RecordStoreError> {
        Self::with_writer(root, Box::new(ImageFileWriter::new()))
    }

    pub fn with_writer(root: &Path, writer: Box<dyn ImageWriter>) -> Result<Self, RecordStoreError> {
        let images = root.join(IMAGES_DIR);
        std::fs::create_dir_all(&images).map_err(|source| RecordStoreError::Io {
            path: images,
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            writer,
        })
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn append(&self, record: &StoredRecord) -> Result<(), RecordStoreError> {
        let path = self.index_path();
        let io_err = |source| RecordStoreError::Io {
            path: path.clone(),
            source,
        };
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        self.root.join(IMAGES_DIR).join(format!("{id}.jpg"))
    }

    /// Writes the snapshot, then the index line. The snapshot is removed
    /// again if the index line cannot be written.
    fn persist(&self, image: &Frame, record: StoredRecord) -> Result<String, RecordStoreError> {
        self.writer
            .write(&record.image_path, image, None)
            .map_err(|e| RecordStoreError::Snapshot {
                path: record.image_path.clone(),
                reason: e.to_string(),
            })?;

        if let Err(e) = self.append(&record) {
            if let Err(rm) = std::fs::remove_file(&record.image_path) {
                log::warn!(
                    "Failed to remove orphaned snapshot {}: {rm}",
                    record.image_path.display()
                );
            }
            return Err(e);
        }
        log::info!("Stored record {} ({})", record.id, record.activity);
        Ok(record.id)
    }
}

impl RecordStore for JsonlRecordStore {
    fn save(
        &mut self,
        result: &FrameResult,
        image: &Frame,
        activity: &str,
        domain: &str,
    ) -> Result<String, RecordStoreError> {
        let Some(person) = result.primary() else {
            return Ok(String::new());
        };

        let id = Uuid::new_v4().to_string();
        let record = StoredRecord {
            image_path: self.snapshot_path(&id),
            id,
            timestamp: Utc::now(),
            kind: RecordKind::Analysis,
            activity: activity.to_string(),
            domain: domain.to_string(),
            metrics: person.metrics.clone().unwrap_or_default(),
            landmarks: person.landmarks.names().collect(),
            condition: None,
            description: None,
        };
        self.persist(image, record)
    }

    fn save_reference(
        &mut self,
        image: &Frame,
        condition: &str,
        description: &str,
        domain: &str,
    ) -> Result<String, RecordStoreError> {
        let id = Uuid::new_v4().to_string();
        let record = StoredRecord {
            image_path: self.snapshot_path(&id),
            id,
            timestamp: Utc::now(),
            kind: RecordKind::Reference,
            activity: condition.to_string(),
            domain: domain.to_string(),
            metrics: SpineMetrics::default(),
            landmarks: Vec::new(),
            condition: Some(condition.to_string()),
            description: Some(description.to_string()),
        };
        self.persist(image, record)
    }

    fn query(&self, activity: Option<&str>) -> Result<Vec<StoredRecord>, RecordStoreError> {
        let path = self.index_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(RecordStoreError::Io { path, source }),
        };

        let mut records = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(line) {
                Ok(record) => {
                    if activity.map_or(true, |a| record.activity == a) {
                        records.push(record);
                    }
                }
                Err(e) => log::warn!("Skipping malformed record at line {}: {e}", n + 1),
            }
        }
        Ok(records)
    }
}
