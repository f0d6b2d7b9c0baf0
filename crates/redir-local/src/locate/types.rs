//! Request and response types for locate decisions.

use serde::{Deserialize, Serialize};

use crate::address::NetworkAddress;
use crate::flags::OpenFlags;

/// Mask selecting the protocol version from a capability word; the upper
/// half carries feature bits.
pub const PROTOCOL_VERSION_MASK: u32 = 0x0000_ffff;

/// A client's request to locate a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRequest {
    pub path: String,
    pub flags: OpenFlags,
    /// `None` when the client address could not be parsed.
    pub client: Option<NetworkAddress>,
    /// Capability word negotiated with the client.
    pub capability: u32,
}

/// The finder's own result code, passed through untouched on delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinderCode {
    /// `target` names a data server.
    Redirect,
    /// Client should retry later; `target` carries the reason text. No retry
    /// duration travels with it.
    Stall,
    /// Lookup failed; `target` carries the error text.
    Error,
}

/// How the caller must treat a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocateStatus {
    /// Follow the local path now stored in `target`.
    Redirect,
    /// Proceed exactly as the finder instructed.
    Delegate,
}

/// Outcome of a locate: either the finder's answer or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub status: LocateStatus,
    pub code: FinderCode,
    /// Host descriptor or error text on delegate, local path on redirect.
    pub target: String,
    pub capability: u32,
}

impl LocationResponse {
    /// A finder answer with the given code, not yet judged by the decider.
    pub fn baseline(code: FinderCode, target: impl Into<String>, capability: u32) -> Self {
        Self {
            status: LocateStatus::Delegate,
            code,
            target: target.into(),
            capability,
        }
    }

    pub fn protocol_version(&self) -> u32 {
        self.capability & PROTOCOL_VERSION_MASK
    }

    /// Replace the target with a local path in one step.
    pub fn into_local(self, physical_path: String) -> Self {
        Self {
            status: LocateStatus::Redirect,
            target: physical_path,
            ..self
        }
    }

    pub fn is_local_redirect(&self) -> bool {
        self.status == LocateStatus::Redirect
    }
}
