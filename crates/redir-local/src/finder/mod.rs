//! The remote location finder that computes baseline redirects.

pub mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locate::{LocationRequest, LocationResponse};

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("location manager request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("location manager returned status {0}")]
    Status(u16),

    #[error("invalid manager url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Space usage reported for a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceInfo {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub max_file_bytes: u64,
    pub used_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<u64>,
}

/// Computes where a client should be sent, without any local shortcut.
///
/// `locate` never fails: problems are reported through the response's
/// [`FinderCode`](crate::locate::FinderCode) so callers always have an answer
/// to pass on.
pub trait RemoteFinder: Send + Sync {
    fn locate(&self, request: &LocationRequest) -> impl Future<Output = LocationResponse> + Send;

    fn space(&self, path: &str) -> impl Future<Output = Result<SpaceInfo, FinderError>> + Send;

    /// Prepare the finder for service; called once at startup.
    fn configure(&self) -> impl Future<Output = Result<(), FinderError>> + Send;
}
