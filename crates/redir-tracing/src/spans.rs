//! Span builder helpers for the locate decision path.

/// Create a tracing span for one locate decision.
///
/// Usage: `let span = locate_span!(decision_id, path, flags);`
///
/// Fields recorded once the decision is made:
/// - `outcome`: `redirect` or `delegate`
/// - `reason`: why local redirection did not apply (delegate only)
/// - `latency_ms`: time spent including the finder round trip
#[macro_export]
macro_rules! locate_span {
    ($decision_id:expr, $path:expr, $flags:expr) => {
        tracing::info_span!(
            "locate",
            decision_id = %$decision_id,
            path = %$path,
            flags = %$flags,
            outcome = tracing::field::Empty,
            reason = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for a call into the remote location manager.
#[macro_export]
macro_rules! finder_call_span {
    ($operation:expr, $url:expr) => {
        tracing::info_span!(
            "finder_call",
            operation = %$operation,
            url = %$url,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}
