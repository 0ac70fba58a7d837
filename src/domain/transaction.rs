use {
    super::error::OrchestrationError,
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Created,
    Processing,
    Success,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub const ALL: [TransactionStatus; 5] = [
        TransactionStatus::Created,
        TransactionStatus::Processing,
        TransactionStatus::Success,
        TransactionStatus::Failed,
        TransactionStatus::Refunded,
    ];
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = OrchestrationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "CREATED" => Ok(Self::Created),
            "PROCESSING" => Ok(Self::Processing),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(OrchestrationError::Validation(format!(
                "unknown transaction status: {other}"
            ))),
        }
    }
}

/// The lifecycle graph as data: a map from state to its allowed targets.
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: HashMap<TransactionStatus, Vec<TransactionStatus>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        use TransactionStatus::*;

        let mut edges = HashMap::new();
        edges.insert(Created, vec![Processing, Failed]);
        edges.insert(Processing, vec![Success, Failed]);
        edges.insert(Success, vec![Refunded]);
        edges.insert(Failed, vec![]);
        edges.insert(Refunded, vec![]);
        Self { edges }
    }

    pub fn allows(&self, from: &TransactionStatus, to: &TransactionStatus) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    pub fn allowed_targets(&self, from: &TransactionStatus) -> &[TransactionStatus] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_terminal(&self, status: &TransactionStatus) -> bool {
        self.allowed_targets(status).is_empty()
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The unit of orchestration. `version` is the optimistic concurrency
/// counter: every applied transition bumps it by one, and a status write
/// only lands when the caller's expected version still matches.
///
/// Serializes to the client representation
/// `{id, user_id, amount, currency, status, created_at}`.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    id: Uuid,
    user_id: String,
    #[serde(flatten)]
    money: Money,
    status: TransactionStatus,
    #[serde(skip)]
    version: i64,
    created_at: DateTime<Utc>,
    #[serde(skip)]
    updated_at: DateTime<Utc>,
}

/// Stored fields of a transaction, for rehydration from a persistence
/// backend or for building fixtures with explicit timestamps.
#[derive(Debug, Clone)]
pub struct TransactionParts {
    pub id: Uuid,
    pub user_id: String,
    pub money: Money,
    pub status: TransactionStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// New transaction in CREATED, id generated in Rust via Uuid::now_v7().
    pub fn new(user_id: String, money: Money) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            money,
            status: TransactionStatus::Created,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_parts(parts: TransactionParts) -> Self {
        Self {
            id: parts.id,
            user_id: parts.user_id,
            money: parts.money,
            status: parts.status,
            version: parts.version,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn money(&self) -> &Money {
        &self.money
    }

    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies an already-validated transition: bumps the version and
    /// refreshes `updated_at`. Legality lives in the TransitionTable.
    pub(crate) fn advance(&mut self, to: TransactionStatus) {
        self.status = to;
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
