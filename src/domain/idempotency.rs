use {
    super::error::OrchestrationError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

const MAX_KEY_LENGTH: usize = 128;

/// Client-chosen handle that makes payment creation replay-safe. Two
/// requests carrying the same key observe a single transaction.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, OrchestrationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(OrchestrationError::Validation(
                "idempotency key must not be empty".to_string(),
            ));
        }
        if raw.len() > MAX_KEY_LENGTH {
            return Err(OrchestrationError::Validation(format!(
                "idempotency key exceeds {MAX_KEY_LENGTH} bytes"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The response snapshot replayed to every duplicate of a keyed request.
/// Written exactly once, at the successful conclusion of the first
/// request, and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct IdempotencyRecord {
    key: IdempotencyKey,
    response_code: u16,
    response_body: Value,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IdempotencyRecordParts {
    pub key: IdempotencyKey,
    pub response_code: u16,
    pub response_body: Value,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(key: IdempotencyKey, response_code: u16, response_body: Value) -> Self {
        Self {
            key,
            response_code,
            response_body,
            created_at: Utc::now(),
        }
    }

    pub fn from_parts(parts: IdempotencyRecordParts) -> Self {
        Self {
            key: parts.key,
            response_code: parts.response_code,
            response_body: parts.response_body,
            created_at: parts.created_at,
        }
    }

    pub fn key(&self) -> &IdempotencyKey {
        &self.key
    }

    pub fn response_code(&self) -> u16 {
        self.response_code
    }

    pub fn response_body(&self) -> &Value {
        &self.response_body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
