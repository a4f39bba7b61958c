//! Settlement used when the daemon has no chain backend attached.

use gdao_types::{Settlement, SettlementError, SettlementRequest, TransactionId};

/// Refuses every submission, so a settled execution always rolls back.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineSettlement;

impl Settlement for OfflineSettlement {
    async fn submit_on_chain(
        &self,
        request: &SettlementRequest,
    ) -> Result<TransactionId, SettlementError> {
        tracing::warn!(
            reference = %request.reference,
            amount = %request.amount,
            "no settlement backend attached"
        );
        Err(SettlementError::Unavailable(format!(
            "no settlement backend for {}",
            request.reference
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdao_types::{Address, TokenAmount};

    #[tokio::test]
    async fn every_submission_is_unavailable() {
        let request = SettlementRequest {
            reference: "proposal-3".to_string(),
            from: Address::new("ops"),
            to: Address::new("alice"),
            amount: TokenAmount::from_tokens(1),
        };
        let err = OfflineSettlement.submit_on_chain(&request).await.unwrap_err();
        assert!(matches!(err, SettlementError::Unavailable(ref msg) if msg.contains("proposal-3")));
    }
}
