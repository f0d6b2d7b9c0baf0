//! The locate decision.
//!
//! Every locate first asks the remote finder for its answer. That answer is
//! returned unchanged unless all of the following hold, in order:
//!
//! 1. the finder answered with a redirect to a private address,
//! 2. the client is on a private address,
//! 3. the negotiated protocol version understands local redirects,
//! 4. the open flags are a simple read/write/create/truncate,
//! 5. the policy permits this kind of open,
//! 6. the path translates cleanly into a local path.
//!
//! In that case the response is rewritten to point at the local path.

use std::path::Path;
use std::time::Instant;

use tracing::Instrument;

use super::correlation;
use super::types::{FinderCode, LocationRequest, LocationResponse};
use crate::address::{self, Endpoint, NetworkAddress};
use crate::attributes;
use crate::finder::{FinderError, RemoteFinder, SpaceInfo};
use crate::flags::OpenFlags;
use crate::mapper::{PathMapper, MAX_PATH_LEN};
use crate::policy::PolicyState;
use crate::stats::DecisionStats;

/// Lowest protocol version (3.1.0) able to follow a redirect to a local path.
pub const MIN_LOCAL_REDIRECT_PROTOCOL: u32 = 0x0310;

/// Why a locate kept the finder's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    NotRedirected,
    TargetNotPrivate,
    ClientNotPrivate,
    ProtocolTooOld,
    ComplexOperation,
    WriteNotPermitted,
    PathTooLong,
    TranslationFailed,
}

impl Ineligible {
    pub const ALL: [Ineligible; 8] = [
        Ineligible::NotRedirected,
        Ineligible::TargetNotPrivate,
        Ineligible::ClientNotPrivate,
        Ineligible::ProtocolTooOld,
        Ineligible::ComplexOperation,
        Ineligible::WriteNotPermitted,
        Ineligible::PathTooLong,
        Ineligible::TranslationFailed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRedirected => "not-redirected",
            Self::TargetNotPrivate => "target-not-private",
            Self::ClientNotPrivate => "client-not-private",
            Self::ProtocolTooOld => "protocol-too-old",
            Self::ComplexOperation => "complex-operation",
            Self::WriteNotPermitted => "write-not-permitted",
            Self::PathTooLong => "path-too-long",
            Self::TranslationFailed => "translation-failed",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// A finished decision: the response to send and, on delegate, the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub response: LocationResponse,
    pub fallback: Option<Ineligible>,
}

/// Everything the eligibility chain looks at, gathered up front.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    code: FinderCode,
    target: Option<NetworkAddress>,
    client: Option<NetworkAddress>,
    protocol_version: u32,
    flags: OpenFlags,
    policy: PolicyState,
}

/// Guard clauses in decision order. Unparseable addresses count as public.
fn check_eligibility(c: &Candidate) -> Result<(), Ineligible> {
    // Stall and error answers carry reason text, not a host.
    if c.code != FinderCode::Redirect {
        return Err(Ineligible::NotRedirected);
    }
    if !c.target.is_some_and(|t| t.is_private()) {
        return Err(Ineligible::TargetNotPrivate);
    }
    if !c.client.is_some_and(|a| a.is_private()) {
        return Err(Ineligible::ClientNotPrivate);
    }
    if c.protocol_version < MIN_LOCAL_REDIRECT_PROTOCOL {
        return Err(Ineligible::ProtocolTooOld);
    }
    if !c.flags.is_simple() {
        return Err(Ineligible::ComplexOperation);
    }
    if c.policy.read_only_redirect && !c.flags.is_read_only() {
        return Err(Ineligible::WriteNotPermitted);
    }
    Ok(())
}

/// Translate `path`, accepting only a non-empty result that fits the buffer.
fn translate(mapper: &impl PathMapper, path: &str) -> Result<String, Ineligible> {
    if path.len() >= MAX_PATH_LEN {
        return Err(Ineligible::PathTooLong);
    }
    match mapper.lfn_to_pfn(path, MAX_PATH_LEN) {
        Ok(physical) if !physical.is_empty() && physical.len() < MAX_PATH_LEN => Ok(physical),
        Ok(physical) => {
            tracing::warn!(
                path = %path,
                physical_len = physical.len(),
                "Path mapper returned an unusable path"
            );
            Err(Ineligible::TranslationFailed)
        }
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Path translation failed");
            Err(Ineligible::TranslationFailed)
        }
    }
}

/// Wraps a remote finder and substitutes local paths where it is safe.
pub struct RedirectDecider<F, M> {
    finder: F,
    mapper: M,
    stats: DecisionStats,
    resolve_hostnames: bool,
}

impl<F: RemoteFinder, M: PathMapper> RedirectDecider<F, M> {
    pub fn new(finder: F, mapper: M, stats: DecisionStats) -> Self {
        Self {
            finder,
            mapper,
            stats,
            resolve_hostnames: true,
        }
    }

    /// Resolve host-name targets before classifying them (on by default).
    pub fn with_hostname_resolution(mut self, enabled: bool) -> Self {
        self.resolve_hostnames = enabled;
        self
    }

    pub fn stats(&self) -> &DecisionStats {
        &self.stats
    }

    /// Load the policy from the directive file and configure the finder.
    ///
    /// A finder that fails to configure is reported and left in place; locates
    /// through it will delegate its error responses.
    pub async fn configure(&self, directive_file: &Path) -> PolicyState {
        let policy = PolicyState::load(directive_file);
        if let Err(e) = self.finder.configure().await {
            tracing::warn!(error = %e, "Remote finder configuration failed");
        }
        tracing::info!(
            directive_file = %directive_file.display(),
            read_only_redirect = policy.read_only_redirect,
            "Locate policy configured"
        );
        policy
    }

    /// Space queries always go to the finder.
    pub async fn space(&self, path: &str) -> Result<SpaceInfo, FinderError> {
        self.finder.space(path).await
    }

    /// Locate `request` and return the response to hand to the client.
    #[cfg(test)]
    pub async fn locate(&self, request: &LocationRequest, policy: PolicyState) -> LocationResponse {
        let decision_id = correlation::generate_id();
        self.decide(request, policy, &decision_id).await.response
    }

    /// Locate `request` under `decision_id`, keeping the fallback reason.
    pub async fn decide(
        &self,
        request: &LocationRequest,
        policy: PolicyState,
        decision_id: &str,
    ) -> Decision {
        let span = redir_tracing::locate_span!(decision_id, &request.path, request.flags);
        let start = Instant::now();

        async {
            let baseline = self.finder.locate(request).await;
            let target = match baseline.code {
                FinderCode::Redirect => self.target_address(&baseline.target).await,
                FinderCode::Stall | FinderCode::Error => None,
            };
            let candidate = Candidate {
                code: baseline.code,
                target,
                client: request.client,
                protocol_version: baseline.protocol_version(),
                flags: request.flags,
                policy,
            };

            let decision = match check_eligibility(&candidate)
                .and_then(|()| translate(&self.mapper, &request.path))
            {
                Ok(physical) => Decision {
                    response: baseline.into_local(physical),
                    fallback: None,
                },
                Err(reason) => Decision {
                    response: baseline,
                    fallback: Some(reason),
                },
            };

            self.record(request, &decision, start);
            decision
        }
        .instrument(span)
        .await
    }

    /// Address of the finder's target, or `None` if it is not an address.
    async fn target_address(&self, descriptor: &str) -> Option<NetworkAddress> {
        match address::parse_endpoint(descriptor) {
            Ok(Endpoint::Addr(addr)) => Some(addr),
            Ok(Endpoint::Name { host, port }) if self.resolve_hostnames => {
                match tokio::net::lookup_host((host, port.unwrap_or(0))).await {
                    Ok(mut addrs) => addrs.next().map(NetworkAddress::from),
                    Err(e) => {
                        tracing::debug!(host = %host, error = %e, "Target host did not resolve");
                        None
                    }
                }
            }
            Ok(Endpoint::Name { .. }) => None,
            Err(e) => {
                tracing::debug!(target_descriptor = %descriptor, error = %e, "Target is not an address");
                None
            }
        }
    }

    fn record(&self, request: &LocationRequest, decision: &Decision, start: Instant) {
        let span = tracing::Span::current();
        let latency = start.elapsed().as_millis() as u64;
        span.record("latency_ms", latency);
        attributes::set_decision_attributes(&span, request, decision);

        match decision.fallback {
            None => {
                span.record("outcome", "redirect");
                self.stats.record_local_redirect();
                tracing::info!(
                    local_path = %decision.response.target,
                    latency_ms = latency,
                    "Redirecting to local path"
                );
            }
            Some(reason) => {
                span.record("outcome", "delegate");
                span.record("reason", reason.as_str());
                self.stats.record_delegate(reason);
                tracing::debug!(
                    reason = reason.as_str(),
                    finder_target = %decision.response.target,
                    latency_ms = latency,
                    "Delegating to finder"
                );
            }
        }
    }
}
