use {
    super::error::OrchestrationError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttemptStatus {
    Initiated,
    Success,
    Failure,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "INITIATED",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for AttemptStatus {
    type Error = OrchestrationError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "INITIATED" => Ok(Self::Initiated),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            other => Err(OrchestrationError::Validation(format!(
                "unknown attempt status: {other}"
            ))),
        }
    }
}

/// Audit record of one round against the payment provider: the request we
/// sent and, once the provider answered, its verdict and raw response.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentAttempt {
    id: Uuid,
    transaction_id: Uuid,
    psp_reference: Option<String>,
    status: AttemptStatus,
    request_payload: Value,
    response_payload: Option<Value>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentAttemptParts {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub psp_reference: Option<String>,
    pub status: AttemptStatus,
    pub request_payload: Value,
    pub response_payload: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl PaymentAttempt {
    /// Records the outbound request before the provider is contacted, so
    /// a crash mid-call still leaves a trace of what was sent.
    pub fn initiated(transaction_id: Uuid, request_payload: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            transaction_id,
            psp_reference: None,
            status: AttemptStatus::Initiated,
            request_payload,
            response_payload: None,
            created_at: Utc::now(),
        }
    }

    pub fn from_parts(parts: PaymentAttemptParts) -> Self {
        Self {
            id: parts.id,
            transaction_id: parts.transaction_id,
            psp_reference: parts.psp_reference,
            status: parts.status,
            request_payload: parts.request_payload,
            response_payload: parts.response_payload,
            created_at: parts.created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn psp_reference(&self) -> Option<&str> {
        self.psp_reference.as_deref()
    }

    pub fn status(&self) -> &AttemptStatus {
        &self.status
    }

    pub fn request_payload(&self) -> &Value {
        &self.request_payload
    }

    pub fn response_payload(&self) -> Option<&Value> {
        self.response_payload.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn conclude(
        &mut self,
        status: AttemptStatus,
        psp_reference: Option<&str>,
        response: &Value,
    ) {
        self.status = status;
        if let Some(reference) = psp_reference {
            self.psp_reference = Some(reference.to_owned());
        }
        self.response_payload = Some(response.clone());
    }
}
