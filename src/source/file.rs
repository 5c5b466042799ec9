//! File-based status store.
//!
//! Reads the JSON status record written by the cluster agent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{parse_snapshot, HealthSnapshot, StatusStore};
use crate::error::StatusError;

/// A status store backed by a JSON file on disk.
///
/// The file is written by an independent process at its own cadence, so
/// every [`load`](StatusStore::load) performs a fresh read. Nothing is cached
/// between calls; staleness is bounded by the caller's poll interval.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    description: String,
}

impl FileStore {
    /// Create a new file store for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusStore for FileStore {
    fn load(&self) -> Result<HealthSnapshot, StatusError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "status file absent, using empty snapshot");
                return Ok(HealthSnapshot::new());
            }
            Err(e) => return Err(StatusError::Read(e)),
        };

        Ok(parse_snapshot(&content)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NodeState;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "node-03": { "status": "online", "total_downtime": 42 }
        }"#
    }

    #[test]
    fn test_file_store_new() {
        let store = FileStore::new("/tmp/node_status.json");
        assert_eq!(store.path(), Path::new("/tmp/node_status.json"));
        assert_eq!(store.description(), "file: /tmp/node_status.json");
    }

    #[test]
    fn test_file_store_load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let store = FileStore::new(file.path());
        let snapshot = store.load().unwrap();
        let entry = snapshot.get("node-03").unwrap();
        assert_eq!(entry.state(), NodeState::Online);
        assert_eq!(entry.total_downtime, 42);
    }

    #[test]
    fn test_file_store_rereads_every_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let store = FileStore::new(file.path());
        assert!(store.load().unwrap().contains_key("node-03"));

        file.as_file().set_len(0).unwrap();
        file.rewind().unwrap();
        writeln!(file, r#"{{"node-05": {{"status": "online", "total_downtime": 1}}}}"#).unwrap();
        file.flush().unwrap();

        let snapshot = store.load().unwrap();
        assert!(snapshot.contains_key("node-05"));
        assert!(!snapshot.contains_key("node-03"));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("node_status.json"));

        let snapshot = store.load().unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_file_store_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let store = FileStore::new(file.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StatusError::Parse(_)));
    }

    #[test]
    fn test_file_store_non_object_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[1, 2, 3]").unwrap();

        let store = FileStore::new(file.path());
        assert!(matches!(store.load(), Err(StatusError::Parse(_))));
    }

    #[test]
    fn test_file_store_tolerates_extra_keys_and_null_status() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "updated_at": 1700000000,
                "node-03": {{ "status": "online", "total_downtime": 42 }},
                "node-04": {{ "status": null, "total_downtime": 7 }}
            }}"#
        )
        .unwrap();

        let store = FileStore::new(file.path());
        let snapshot = store.load().unwrap();
        assert!(!snapshot.contains_key("updated_at"));
        assert_eq!(snapshot["node-03"].state(), NodeState::Online);
        assert_eq!(snapshot["node-03"].total_downtime, 42);
        assert_eq!(snapshot["node-04"].state(), NodeState::Offline);
        assert_eq!(snapshot["node-04"].total_downtime, 7);
    }

    #[test]
    fn test_file_store_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(store.load(), Err(StatusError::Read(_))));
    }
}
