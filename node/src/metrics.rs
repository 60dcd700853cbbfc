//! # Prometheus Metrics
//!
//! Exposes vault metrics at `/metrics` on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `willvault` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use willvault_contracts::events::{EventRecord, VaultEvent};
use willvault_contracts::will_vault::ReleaseStatus;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are reference-counted) so it can be
/// shared across request handlers.
#[derive(Clone)]
pub struct VaultMetrics {
    registry: Registry,
    /// Successful locks.
    pub locks_total: IntCounter,
    /// Successful confirmations.
    pub confirmations_total: IntCounter,
    /// Releases. At most 1 per vault.
    pub releases_total: IntCounter,
    /// Rejected calls, labelled by error code.
    pub rejected_calls_total: IntCounterVec,
    /// Distinct guardians that have confirmed.
    pub current_confirmations: IntGauge,
    /// The vault's threshold.
    pub confirmations_needed: IntGauge,
    /// 1 once released, else 0.
    pub released: IntGauge,
    /// Time spent handling signed calls, in seconds.
    pub call_latency_seconds: Histogram,
}

impl VaultMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("willvault".into()), None)?;

        let locks_total = IntCounter::new("locks_total", "Successful vault locks")?;
        registry.register(Box::new(locks_total.clone()))?;

        let confirmations_total =
            IntCounter::new("confirmations_total", "Accepted guardian confirmations")?;
        registry.register(Box::new(confirmations_total.clone()))?;

        let releases_total = IntCounter::new("releases_total", "Vault releases")?;
        registry.register(Box::new(releases_total.clone()))?;

        let rejected_calls_total = IntCounterVec::new(
            Opts::new("rejected_calls_total", "Rejected calls by error code"),
            &["code"],
        )?;
        registry.register(Box::new(rejected_calls_total.clone()))?;

        let current_confirmations = IntGauge::new(
            "current_confirmations",
            "Distinct guardians that have confirmed release",
        )?;
        registry.register(Box::new(current_confirmations.clone()))?;

        let confirmations_needed =
            IntGauge::new("confirmations_needed", "Confirmations required for release")?;
        registry.register(Box::new(confirmations_needed.clone()))?;

        let released = IntGauge::new("released", "1 once the vault has been released")?;
        registry.register(Box::new(released.clone()))?;

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "Signed call handling latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
            ]),
        )?;
        registry.register(Box::new(call_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            locks_total,
            confirmations_total,
            releases_total,
            rejected_calls_total,
            current_confirmations,
            confirmations_needed,
            released,
            call_latency_seconds,
        })
    }

    /// Count committed events and advance the progress gauges.
    ///
    /// Gauges only move forward here, so handlers finishing out of commit
    /// order cannot roll them back.
    pub fn record_events(&self, records: &[EventRecord]) {
        for record in records {
            match record.event {
                VaultEvent::Locked { .. } => self.locks_total.inc(),
                VaultEvent::Confirmed { .. } => {
                    self.confirmations_total.inc();
                    self.current_confirmations.inc();
                }
                VaultEvent::Released => {
                    self.releases_total.inc();
                    self.released.set(1);
                }
            }
        }
    }

    /// Count a rejected call.
    pub fn record_rejection(&self, code: &str) {
        self.rejected_calls_total.with_label_values(&[code]).inc();
    }

    /// Seed the gauges from a vault's status. Called once at startup.
    pub fn observe_status(&self, status: &ReleaseStatus) {
        self.current_confirmations
            .set(i64::from(status.current_confirmations));
        self.confirmations_needed
            .set(i64::from(status.confirmations_needed));
        self.released.set(i64::from(status.released));
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<VaultMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
