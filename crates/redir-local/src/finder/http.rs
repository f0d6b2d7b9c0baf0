//! HTTP bridge to the location manager.
//!
//! The manager owns the lookup; this side only ships the request as JSON and
//! turns the reply (or the lack of one) into a [`LocationResponse`].

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::{FinderError, RemoteFinder, SpaceInfo};
use crate::flags::OpenFlags;
use crate::locate::{FinderCode, LocationRequest, LocationResponse};

/// Body of `POST /v1/locate` on the manager.
#[derive(Debug, Serialize)]
struct LocateCall<'a> {
    path: &'a str,
    flags: OpenFlags,
    capability: u32,
}

/// Manager reply to a locate call.
#[derive(Debug, Deserialize)]
struct LocateReply {
    code: FinderCode,
    target: String,
    /// Omitted by managers that do not renegotiate capabilities.
    #[serde(default)]
    capability: Option<u32>,
}

impl LocateReply {
    fn into_response(self, requested_capability: u32) -> LocationResponse {
        LocationResponse::baseline(
            self.code,
            self.target,
            self.capability.unwrap_or(requested_capability),
        )
    }
}

/// [`RemoteFinder`] backed by a location manager reachable over HTTP.
#[derive(Clone)]
pub struct HttpFinder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFinder {
    pub fn new(client: reqwest::Client, manager_url: &str) -> Result<Self, FinderError> {
        let parsed = reqwest::Url::parse(manager_url).map_err(|e| FinderError::InvalidUrl {
            url: manager_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FinderError::InvalidUrl {
                url: manager_url.to_string(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }
        Ok(Self {
            client,
            base_url: manager_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call_locate(&self, url: &str, request: &LocationRequest) -> Result<LocateReply, FinderError> {
        let body = LocateCall {
            path: &request.path,
            flags: request.flags,
            capability: request.capability,
        };
        let resp = self.client.post(url).json(&body).send().await?;
        record_status(resp.status().as_u16());
        if !resp.status().is_success() {
            return Err(FinderError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<LocateReply>().await?)
    }

    async fn call_space(&self, url: &str, path: &str) -> Result<SpaceInfo, FinderError> {
        let resp = self.client.get(url).query(&[("path", path)]).send().await?;
        record_status(resp.status().as_u16());
        if !resp.status().is_success() {
            return Err(FinderError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<SpaceInfo>().await?)
    }
}

fn record_status(status: u16) {
    tracing::Span::current().record("status", status);
}

fn record_latency(start: Instant) -> u64 {
    let latency = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("latency_ms", latency);
    latency
}

impl RemoteFinder for HttpFinder {
    async fn locate(&self, request: &LocationRequest) -> LocationResponse {
        let url = format!("{}/v1/locate", self.base_url);
        let span = redir_tracing::finder_call_span!("locate", &url);
        let start = Instant::now();

        async {
            let result = self.call_locate(&url, request).await;
            let latency = record_latency(start);
            match result {
                Ok(reply) => reply.into_response(request.capability),
                Err(e) => {
                    tracing::warn!(error = %e, latency_ms = latency, "Manager locate failed");
                    LocationResponse::baseline(FinderCode::Error, e.to_string(), request.capability)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn space(&self, path: &str) -> Result<SpaceInfo, FinderError> {
        let url = format!("{}/v1/space", self.base_url);
        let span = redir_tracing::finder_call_span!("space", &url);
        let start = Instant::now();

        async {
            let result = self.call_space(&url, path).await;
            record_latency(start);
            result
        }
        .instrument(span)
        .await
    }

    async fn configure(&self) -> Result<(), FinderError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(FinderError::Status(resp.status().as_u16()));
        }
        tracing::info!(manager = %self.base_url, "Location manager reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::locate::LocateStatus;

    fn request() -> LocationRequest {
        LocationRequest {
            path: "/store/x.root".to_string(),
            flags: OpenFlags::RDONLY,
            client: None,
            capability: 0x0320,
        }
    }

    #[test]
    fn test_reply_without_capability_keeps_requested() {
        let reply: LocateReply =
            serde_json::from_str(r#"{"code": "redirect", "target": "10.0.0.5:1094"}"#).unwrap();
        let resp = reply.into_response(0x0320);
        assert_eq!(resp.status, LocateStatus::Delegate);
        assert_eq!(resp.code, FinderCode::Redirect);
        assert_eq!(resp.capability, 0x0320);
    }

    #[test]
    fn test_reply_capability_overrides_requested() {
        let reply: LocateReply = serde_json::from_str(
            r#"{"code": "stall", "target": "staging", "capability": 784}"#,
        )
        .unwrap();
        let resp = reply.into_response(900);
        assert_eq!(resp.code, FinderCode::Stall);
        assert_eq!(resp.capability, 784);
    }

    #[test]
    fn test_locate_call_wire_shape() {
        let req = request();
        let body = LocateCall {
            path: &req.path,
            flags: req.flags,
            capability: req.capability,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"path": "/store/x.root", "flags": 0, "capability": 800})
        );
    }

    #[test]
    fn test_manager_url_validated() {
        let client = reqwest::Client::new();
        assert!(matches!(
            HttpFinder::new(client.clone(), "not a url"),
            Err(FinderError::InvalidUrl { .. })
        ));
        assert!(matches!(
            HttpFinder::new(client.clone(), "ftp://manager:21"),
            Err(FinderError::InvalidUrl { .. })
        ));
        let finder = HttpFinder::new(client, "http://manager:3095/").unwrap();
        assert_eq!(finder.base_url(), "http://manager:3095");
    }

    #[tokio::test]
    async fn test_unreachable_manager_yields_error_code() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let finder = HttpFinder::new(client, "http://127.0.0.1:1").unwrap();
        let resp = finder.locate(&request()).await;
        assert_eq!(resp.status, LocateStatus::Delegate);
        assert_eq!(resp.code, FinderCode::Error);
        assert_eq!(resp.capability, 0x0320);
        assert!(resp.target.contains("request failed"));
    }
}
