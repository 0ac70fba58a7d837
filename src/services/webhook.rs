use {
    super::orchestrator::PaymentService,
    crate::domain::{error::OrchestrationError, provider::PspStatus},
    serde::{Deserialize, Serialize},
    tracing::{info, warn},
    uuid::Uuid,
};

/// Settlement notification as the provider delivers it.
#[derive(Debug, Clone, Deserialize)]
pub struct PspWebhook {
    pub transaction_id: Uuid,
    pub psp_reference: String,
    pub status: String,
}

/// What we tell the provider about a delivery. Only an unknown
/// transaction is a hard failure; everything else is acknowledged so the
/// provider stops redelivering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookAck {
    Processed,
    Ignored,
    Error { detail: String },
}

/// Applies a provider settlement webhook to its transaction.
///
/// The transaction is looked up first: a webhook for an id we never
/// issued is refused outright. A recognized verdict is mapped onto the
/// lifecycle and applied through the transition machinery, which makes
/// redelivery a no-op. A verdict outside the known vocabulary is
/// acknowledged and ignored. A transition the table rejects is
/// acknowledged with an error detail rather than refused, because the
/// provider cannot fix a stale delivery by sending it again.
pub async fn process_psp_webhook(
    service: &PaymentService,
    webhook: PspWebhook,
) -> Result<WebhookAck, OrchestrationError> {
    service.get_payment(webhook.transaction_id).await?;

    let psp_status = PspStatus::from(webhook.status.as_str());
    let Some(target) = psp_status.as_lifecycle() else {
        warn!(
            transaction_id = %webhook.transaction_id,
            psp_reference = %webhook.psp_reference,
            status = %psp_status,
            "webhook carries unrecognized provider status, ignoring"
        );
        return Ok(WebhookAck::Ignored);
    };

    match service.transition(webhook.transaction_id, target).await {
        Ok(transaction) => {
            info!(
                transaction_id = %webhook.transaction_id,
                psp_reference = %webhook.psp_reference,
                status = %transaction.status(),
                "webhook settled transaction"
            );
            Ok(WebhookAck::Processed)
        }
        Err(err) => {
            warn!(
                transaction_id = %webhook.transaction_id,
                psp_reference = %webhook.psp_reference,
                error = %err,
                "webhook transition rejected, acknowledging with error"
            );
            Ok(WebhookAck::Error {
                detail: err.to_string(),
            })
        }
    }
}
