use {
    super::money::MoneyAmount,
    chrono::{DateTime, Utc},
    serde::Serialize,
    uuid::Uuid,
};

/// A refund issued against a successful transaction. The transaction
/// itself moves to REFUNDED; this row keeps the amount and the operator's
/// stated reason.
#[derive(Debug, Clone, Serialize)]
pub struct Refund {
    id: Uuid,
    transaction_id: Uuid,
    amount: MoneyAmount,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RefundParts {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub amount: MoneyAmount,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Refund {
    pub fn new(transaction_id: Uuid, amount: MoneyAmount, reason: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_id,
            amount,
            reason,
            created_at: Utc::now(),
        }
    }

    pub fn from_parts(parts: RefundParts) -> Self {
        Self {
            id: parts.id,
            transaction_id: parts.transaction_id,
            amount: parts.amount,
            reason: parts.reason,
            created_at: parts.created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
