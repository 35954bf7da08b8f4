//! Trace batches stored next to the collected logs.

use super::TraceStore;
use crate::parser::TraceSegment;
use crate::utils::error::{ParseError, TraceStoreError};
use log::debug;
use std::path::{Path, PathBuf};

/// Reads `batch_xray_{traceId}.json` files from a directory
#[derive(Debug, Clone)]
pub struct FileTraceStore {
    root: PathBuf,
}

impl FileTraceStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, trace_id: &str) -> PathBuf {
        self.root.join(format!("batch_xray_{}.json", trace_id))
    }
}

impl TraceStore for FileTraceStore {
    fn batch(&self, trace_id: &str, _region: &str) -> Result<Vec<TraceSegment>, TraceStoreError> {
        let path = self.path_for(trace_id);
        if !path.is_file() {
            return Err(TraceStoreError::TraceNotFound(trace_id.to_string()));
        }

        debug!("Reading trace batch from {}", path.display());
        let file = std::fs::File::open(&path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let segments = serde_json::from_reader(std::io::BufReader::new(file)).map_err(ParseError::from)?;
        Ok(segments)
    }
}
