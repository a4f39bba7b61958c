//! Prometheus metrics for the GDAO node.
//!
//! [`DaoMetrics`] owns a dedicated [`Registry`] covering inbound operations,
//! entity counts and settlement activity. [`DaoMetrics::encode`] renders it
//! in the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::NodeError;

/// Central collection of all node-level Prometheus metrics.
pub struct DaoMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Accepted operations, labelled by operation name.
    pub operations: IntCounterVec,
    /// Rejected operations, labelled by operation name.
    pub rejected_operations: IntCounterVec,
    /// Proposal status transitions observed.
    pub status_changes: IntCounter,
    /// Settlement calls that returned a transaction id.
    pub settlements_confirmed: IntCounter,
    /// Settlement calls that failed, timed out or were abandoned.
    pub settlements_failed: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Number of proposals ever created.
    pub proposal_count: IntGauge,
    /// Number of open staking positions.
    pub open_positions: IntGauge,
    /// Number of accounts with a balance record.
    pub account_count: IntGauge,
    /// Holds waiting for settlement.
    pub pending_holds: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Round-trip time of `submit_on_chain`, in milliseconds.
    pub settlement_latency_ms: Histogram,
}

impl DaoMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let operations = register_int_counter_vec_with_registry!(
            Opts::new("gdao_operations_total", "Operations accepted by the node"),
            &["operation"],
            registry
        )?;

        let rejected_operations = register_int_counter_vec_with_registry!(
            Opts::new(
                "gdao_rejected_operations_total",
                "Operations rejected with a domain error"
            ),
            &["operation"],
            registry
        )?;

        let status_changes = register_int_counter_with_registry!(
            Opts::new(
                "gdao_proposal_status_changes_total",
                "Proposal lifecycle transitions"
            ),
            registry
        )?;

        let settlements_confirmed = register_int_counter_with_registry!(
            Opts::new(
                "gdao_settlements_confirmed_total",
                "On-chain settlements that returned a transaction id"
            ),
            registry
        )?;

        let settlements_failed = register_int_counter_with_registry!(
            Opts::new(
                "gdao_settlements_failed_total",
                "On-chain settlements that failed or timed out"
            ),
            registry
        )?;

        let proposal_count = register_int_gauge_with_registry!(
            Opts::new("gdao_proposal_count", "Proposals ever created"),
            registry
        )?;

        let open_positions = register_int_gauge_with_registry!(
            Opts::new("gdao_open_positions", "Open staking positions"),
            registry
        )?;

        let account_count = register_int_gauge_with_registry!(
            Opts::new("gdao_account_count", "Accounts with a balance record"),
            registry
        )?;

        let pending_holds = register_int_gauge_with_registry!(
            Opts::new("gdao_pending_holds", "Transfers awaiting settlement"),
            registry
        )?;

        // Exponential buckets covering 1 ms → ~16 s.
        let settlement_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "gdao_settlement_latency_ms",
                "Settlement round-trip time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            operations,
            rejected_operations,
            status_changes,
            settlements_confirmed,
            settlements_failed,
            proposal_count,
            open_positions,
            account_count,
            pending_holds,
            settlement_latency_ms,
        })
    }

    /// Render every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| NodeError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        let metrics = DaoMetrics::new().unwrap();
        metrics.operations.with_label_values(&["transfer"]).inc();
        metrics.proposal_count.set(3);
        let text = metrics.encode().unwrap();
        assert!(text.contains("gdao_operations_total{operation=\"transfer\"} 1"));
        assert!(text.contains("gdao_proposal_count 3"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = DaoMetrics::new().unwrap();
        let b = DaoMetrics::new().unwrap();
        a.status_changes.inc();
        assert_eq!(b.status_changes.get(), 0);
    }
}
