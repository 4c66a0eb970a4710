//! Recorded response playback.
//!
//! Serves responses from JSON files instead of calling Azure, to run the
//! service offline against captured data.

use super::transport::{ArmRequest, ArmTransport};
use crate::error::{UtilizationError, UtilizationResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Transport that answers every request from a directory of JSON files.
///
/// A request for operation `skus` about `westeurope` is answered from
/// `skus_westeurope.json` when it exists, otherwise from `skus.json`.
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    dir: PathBuf,
}

impl ReplayTransport {
    pub fn new(dir: impl Into<PathBuf>) -> UtilizationResult<ReplayTransport> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(UtilizationError::Config(format!(
                "replay directory does not exist: {}",
                dir.display()
            )));
        }
        log::info!("Using recorded responses from: {}", dir.display());
        Ok(ReplayTransport { dir })
    }

    /// Files that may answer the request, most specific first.
    pub fn candidates(&self, request: &ArmRequest) -> Vec<PathBuf> {
        let key = request.operation.key();
        let mut files = Vec::with_capacity(2);
        if let Some(location) = &request.location {
            files.push(self.dir.join(format!("{key}_{location}.json")));
        }
        files.push(self.dir.join(format!("{key}.json")));
        files
    }
}

#[async_trait]
impl ArmTransport for ReplayTransport {
    async fn send(&self, request: &ArmRequest) -> UtilizationResult<Value> {
        let candidates = self.candidates(request);
        let file = candidates
            .iter()
            .find(|f| f.is_file())
            .ok_or_else(|| {
                UtilizationError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no recorded response for {}: {:?}", request.operation, candidates),
                ))
            })?;
        read_recorded(file).await
    }
}

async fn read_recorded(file: &Path) -> UtilizationResult<Value> {
    log::debug!("Reading recorded response: {}", file.display());
    let json = tokio::fs::read_to_string(file).await?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| UtilizationError::parse("recorded", e))
}
