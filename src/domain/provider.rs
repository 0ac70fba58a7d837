use {
    super::error::OrchestrationError,
    super::money::Currency,
    super::transaction::TransactionStatus,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// Status vocabulary of the payment provider. The provider owns this
/// alphabet, so anything we do not recognize is carried verbatim instead
/// of being guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PspStatus {
    Completed,
    Failed,
    Unrecognized(String),
}

impl PspStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Maps the provider's verdict onto our lifecycle. `None` means the
    /// provider has not decided yet (or speaks a dialect we do not know),
    /// and the transaction must be left alone.
    pub fn as_lifecycle(&self) -> Option<TransactionStatus> {
        match self {
            Self::Completed => Some(TransactionStatus::Success),
            Self::Failed => Some(TransactionStatus::Failed),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for PspStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for PspStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outbound payment order. `callback_url` tells the provider where to
/// deliver its webhook once the charge settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePayment {
    pub transaction_id: Uuid,
    pub amount: i64,
    pub currency: Currency,
    pub callback_url: String,
}

/// Provider acknowledgment that a payment order was accepted for
/// asynchronous processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PspAcceptance {
    pub message: Option<String>,
}

/// Answer to a status poll.
#[derive(Debug, Clone)]
pub struct PspStatusReport {
    pub status: PspStatus,
    pub psp_reference: Option<String>,
}

#[async_trait]
pub trait PspClient: Send + Sync {
    /// Submits a payment order. `Ok` means the provider accepted the
    /// order, nothing more: settlement arrives later via webhook.
    async fn initiate(&self, req: &InitiatePayment) -> Result<PspAcceptance, OrchestrationError>;

    /// Polls the provider for its current verdict on a transaction.
    async fn query_status(
        &self,
        transaction_id: Uuid,
    ) -> Result<PspStatusReport, OrchestrationError>;
}
