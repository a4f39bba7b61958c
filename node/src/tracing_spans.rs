//! Pre-built [`tracing::Span`] constructors for common GDAO node operations.
//!
//! Using consistent span names and field sets makes it easy to filter and
//! correlate log lines belonging to one request.

use gdao_governance::ProposalId;
use tracing::{info_span, Span};

/// Span covering one inbound operation.
pub fn operation_span(operation: &str) -> Span {
    info_span!("operation", op = %operation)
}

/// Span covering an operation on a single proposal.
pub fn proposal_span(operation: &str, proposal_id: ProposalId) -> Span {
    info_span!("proposal", op = %operation, proposal = proposal_id)
}

/// Span covering an outbound settlement call.
pub fn settlement_span(reference: &str) -> Span {
    info_span!("settlement", reference = %reference)
}

/// Span covering one periodic sweep.
pub fn sweep_span() -> Span {
    info_span!("sweep")
}
