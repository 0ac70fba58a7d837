use {
    crate::domain::{
        error::OrchestrationError,
        provider::{InitiatePayment, PspAcceptance, PspClient, PspStatus, PspStatusReport},
    },
    async_trait::async_trait,
    serde::Deserialize,
    std::time::Duration,
    uuid::Uuid,
};

/// Wire shape of the provider's status poll response.
#[derive(Debug, Deserialize)]
struct StatusPollBody {
    status: String,
    psp_reference: Option<String>,
}

/// Talks to the provider over HTTP. Every failure mode on this path,
/// from connect errors to non-2xx answers to garbled bodies, collapses
/// into `UpstreamUnavailable`: callers only need to know the provider
/// gave no usable answer.
pub struct HttpPspClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPspClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl PspClient for HttpPspClient {
    async fn initiate(&self, req: &InitiatePayment) -> Result<PspAcceptance, OrchestrationError> {
        let url = format!("{}/pay", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(req)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::UpstreamUnavailable(format!("initiate request failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(OrchestrationError::UpstreamUnavailable(format!(
                "initiate returned {}",
                response.status()
            )));
        }

        response.json::<PspAcceptance>().await.map_err(|e| {
            OrchestrationError::UpstreamUnavailable(format!("initiate response unreadable: {e}"))
        })
    }

    async fn query_status(
        &self,
        transaction_id: Uuid,
    ) -> Result<PspStatusReport, OrchestrationError> {
        let url = format!("{}/status/{transaction_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::UpstreamUnavailable(format!("status poll failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(OrchestrationError::UpstreamUnavailable(format!(
                "status poll returned {}",
                response.status()
            )));
        }

        let body = response.json::<StatusPollBody>().await.map_err(|e| {
            OrchestrationError::UpstreamUnavailable(format!("status response unreadable: {e}"))
        })?;

        Ok(PspStatusReport {
            status: PspStatus::from(body.status.as_str()),
            psp_reference: body.psp_reference,
        })
    }
}
