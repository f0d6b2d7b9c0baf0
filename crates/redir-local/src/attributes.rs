//! OpenTelemetry attributes describing a locate decision.

use opentelemetry::{Key, Value};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::locate::{Decision, LocationRequest};

fn set_str(span: &Span, key: impl Into<Key>, value: impl Into<String>) {
    span.set_attribute(key, Value::String(value.into().into()));
}

fn set_i64(span: &Span, key: impl Into<Key>, value: i64) {
    span.set_attribute(key, Value::I64(value));
}

fn set_bool(span: &Span, key: impl Into<Key>, value: bool) {
    span.set_attribute(key, Value::Bool(value));
}

/// Attach request and outcome attributes to the decision span.
pub fn set_decision_attributes(span: &Span, request: &LocationRequest, decision: &Decision) {
    set_str(span, "redir.path", request.path.clone());
    set_i64(span, "redir.flags", i64::from(request.flags.bits()));
    if let Some(client) = request.client {
        set_str(span, "redir.client.ip", client.ip().to_string());
        if let Some(port) = client.port() {
            set_i64(span, "redir.client.port", i64::from(port));
        }
    }
    set_i64(
        span,
        "redir.protocol_version",
        i64::from(decision.response.protocol_version()),
    );
    set_bool(span, "redir.local", decision.response.is_local_redirect());
    match decision.fallback {
        // Delegated target is the manager's choice; the local one is a path.
        Some(reason) => {
            set_str(span, "redir.reason", reason.as_str());
            set_str(span, "redir.target", decision.response.target.clone());
        }
        None => set_str(span, "redir.local_path", decision.response.target.clone()),
    }
}
