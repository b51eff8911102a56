//! Outcome of one batch resolution.

use serde::{Deserialize, Serialize};

use slotswap_core::{SlotId, TransferRequest};

/// Coarse status of a [`BatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Success,
    Failure,
}

/// Why nothing was executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "slot", rename_all = "snake_case")]
pub enum FailureReason {
    /// The batch (or its policy-filtered projection) closes no cycle.
    NoCycle,
    /// A slot on the discovered cycle does not exist in the repository.
    MissingSlot(SlotId),
}

/// Either every request on one cycle was applied, or nothing was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchResult {
    /// The cycle's requests, in cycle order.
    Success { executed: Vec<TransferRequest> },
    Failure { reason: FailureReason },
}

impl BatchResult {
    pub fn success(executed: Vec<TransferRequest>) -> Self {
        BatchResult::Success { executed }
    }

    pub fn failure(reason: FailureReason) -> Self {
        BatchResult::Failure { reason }
    }

    pub fn no_cycle() -> Self {
        Self::failure(FailureReason::NoCycle)
    }

    pub fn status(&self) -> BatchStatus {
        match self {
            BatchResult::Success { .. } => BatchStatus::Success,
            BatchResult::Failure { .. } => BatchStatus::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == BatchStatus::Success
    }

    /// Executed requests; always empty for a failure.
    pub fn executed(&self) -> &[TransferRequest] {
        match self {
            BatchResult::Success { executed } => executed,
            BatchResult::Failure { .. } => &[],
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            BatchResult::Success { .. } => None,
            BatchResult::Failure { reason } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotswap_core::OwnerId;

    #[test]
    fn failure_has_no_executed_requests() {
        let result = BatchResult::no_cycle();
        assert_eq!(result.status(), BatchStatus::Failure);
        assert!(result.executed().is_empty());
        assert_eq!(result.failure_reason(), Some(&FailureReason::NoCycle));
    }

    #[test]
    fn success_exposes_executed_requests() {
        let request = TransferRequest::new(SlotId::from("A"), SlotId::from("A"), OwnerId::from("x"));
        let result = BatchResult::success(vec![request.clone()]);
        assert!(result.is_success());
        assert_eq!(result.executed(), &[request]);
        assert!(result.failure_reason().is_none());
    }

    #[test]
    fn json_shape() {
        insta::assert_snapshot!(
            serde_json::to_string(&BatchResult::no_cycle()).unwrap(),
            @r#"{"status":"FAILURE","reason":{"kind":"no_cycle"}}"#
        );
        insta::assert_snapshot!(
            serde_json::to_string(&BatchResult::failure(FailureReason::MissingSlot(SlotId::from("B")))).unwrap(),
            @r#"{"status":"FAILURE","reason":{"kind":"missing_slot","slot":"B"}}"#
        );

        let request = TransferRequest::new(SlotId::from("A"), SlotId::from("B"), OwnerId::from("x"));
        insta::assert_snapshot!(
            serde_json::to_string(&BatchResult::success(vec![request])).unwrap(),
            @r#"{"status":"SUCCESS","executed":[{"from_slot":"A","to_slot":"B","requester":"x"}]}"#
        );
    }

    #[test]
    fn serde_roundtrip() {
        let result = BatchResult::failure(FailureReason::MissingSlot(SlotId::from("Q")));
        let json = serde_json::to_string(&result).unwrap();
        let back: BatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
