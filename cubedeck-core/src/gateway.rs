/// Persistence gateway: loads and saves the whole collection document
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::binding::CollectionState;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("backend responded with status {status}")]
    Status { status: u16 },

    #[error("save worker is no longer running")]
    Disconnected,
}

/// Outcome of a save. Callers only log it.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveAck {
    /// Backend replied with an acknowledgement body
    Acknowledged(serde_json::Value),
    /// Handed to a background writer; outcome logged there
    Queued,
    Written,
}

/// Loads and saves full collection documents. No partial saves.
pub trait PersistenceGateway {
    /// Returns the stored collection, possibly empty
    fn load(&mut self) -> Result<CollectionState>;

    fn save(&mut self, state: &CollectionState) -> Result<SaveAck>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Box<G> {
    fn load(&mut self) -> Result<CollectionState> {
        (**self).load()
    }

    fn save(&mut self, state: &CollectionState) -> Result<SaveAck> {
        (**self).save(state)
    }
}

/// JSON file on disk, same document the HTTP backend keeps in `cube_data.json`
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
}

impl FileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceGateway for FileGateway {
    fn load(&mut self) -> Result<CollectionState> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(CollectionState::from_json(&text)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no collection file yet");
                Ok(CollectionState::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, state: &CollectionState) -> Result<SaveAck> {
        let text = state.to_json()?;
        fs::write(&self.path, text)?;
        Ok(SaveAck::Written)
    }
}

/// In-memory document store; keeps the serialized text so loads exercise
/// the same parsing path as a real backend
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    document: Option<String>,
    saves: usize,
    fail_saves: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail with a backend status error
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&mut self) -> Result<CollectionState> {
        match &self.document {
            Some(text) => Ok(CollectionState::from_json(text)?),
            None => Ok(CollectionState::default()),
        }
    }

    fn save(&mut self, state: &CollectionState) -> Result<SaveAck> {
        self.saves += 1;
        if self.fail_saves {
            return Err(GatewayError::Status { status: 500 });
        }
        self.document = Some(state.to_json()?);
        Ok(SaveAck::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{CubeIndex, CubeRecord, FaceBinding};
    use crate::face::FaceIndex;

    fn sample_state() -> CollectionState {
        let mut state = CollectionState::default();
        let mut record = CubeRecord::empty();
        record.faces.insert(
            FaceIndex::new(5).unwrap(),
            FaceBinding::captured("https://c.test", "data:image/png;base64,AAAA"),
        );
        state.cubes.insert(CubeIndex(0), record);
        state.cubes.insert(CubeIndex(4), CubeRecord::empty());
        state
    }

    #[test]
    fn test_memory_round_trip() {
        let state = sample_state();
        let mut gateway = MemoryGateway::new();
        gateway.save(&state).unwrap();
        assert_eq!(gateway.load().unwrap(), state);
        assert_eq!(gateway.save_count(), 1);
    }

    #[test]
    fn test_memory_failing_saves() {
        let mut gateway = MemoryGateway::new().failing_saves();
        let result = gateway.save(&sample_state());
        assert!(matches!(result, Err(GatewayError::Status { status: 500 })));
        assert!(gateway.document().is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut gateway = FileGateway::new(dir.path().join("cube_data.json"));
        assert!(gateway.load().unwrap().is_empty());

        let state = sample_state();
        assert_eq!(gateway.save(&state).unwrap(), SaveAck::Written);
        assert_eq!(gateway.load().unwrap(), state);
    }

    #[test]
    fn test_file_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube_data.json");
        fs::write(&path, "not json").unwrap();
        let mut gateway = FileGateway::new(path);
        assert!(matches!(gateway.load(), Err(GatewayError::Json(_))));
    }
}
