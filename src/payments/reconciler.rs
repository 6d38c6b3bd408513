//! Payment-record lifecycle and webhook reconciliation.
//!
//! Owns the in-memory payment store and the one rule that matters: a
//! record moves `Pending → Succeeded` at most once, and the ledger is
//! credited exactly once per record no matter how many times the provider
//! redelivers a webhook event.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog;
use crate::ledger::Ledger;
use crate::payments::gateway::{GatewayError, YooKassa};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("unknown pack")]
    UnknownPack,
    #[error("yookassa_not_configured")]
    NotConfigured,
    #[error("payment not found")]
    NotFound,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Succeeded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
        }
    }
}

/// One payment session, keyed in the store by the provider's payment id.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub status: PaymentStatus,
    pub uid: i64,
    pub gems: u64,
    pub pack: String,
}

/// Response to a payment-creation request.
#[derive(Debug, Clone)]
pub struct RequestedPayment {
    pub payment_id: String,
    pub confirmation_url: String,
}

/// Current view of a payment for the status-check endpoint.
#[derive(Debug, Clone)]
pub struct PaymentView {
    pub status: PaymentStatus,
    pub gems: u64,
}

/// A provider webhook event we care about, after the explicit parse step.
#[derive(Debug)]
struct SucceededEvent {
    payment_id: String,
    uid: Option<i64>,
    pack_id: Option<String>,
}

impl SucceededEvent {
    /// Parses a webhook body. `None` for anything that is not a
    /// well-formed `payment.succeeded` event; the caller logs and drops.
    fn from_json(body: &Value) -> Option<Self> {
        if body.get("event")?.as_str()? != "payment.succeeded" {
            return None;
        }
        let object = body.get("object")?;
        let payment_id = object.get("id")?.as_str()?.to_string();

        let metadata = object.get("metadata");
        // uid arrives as a number or a string depending on who serialized
        // the metadata; accept both.
        let uid = metadata
            .and_then(|m| m.get("uid"))
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()));
        let pack_id = metadata
            .and_then(|m| m.get("pack_id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Some(SucceededEvent {
            payment_id,
            uid,
            pack_id,
        })
    }
}

/// Payment reconciler: creates payment sessions and applies webhook-driven
/// credits to the [`Ledger`] at most once per record.
#[derive(Clone)]
pub struct PaymentService {
    gateway: Option<YooKassa>,
    return_url: String,
    ledger: Ledger,
    payments: Arc<Mutex<HashMap<String, PaymentRecord>>>,
}

impl PaymentService {
    /// `gateway` is `None` when YooKassa credentials are absent; payment
    /// creation then fails with [`PaymentError::NotConfigured`] while the
    /// webhook and status paths keep working.
    pub fn new(gateway: Option<YooKassa>, return_url: String, ledger: Ledger) -> Self {
        Self {
            gateway,
            return_url,
            ledger,
            payments: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a payment session for a gem pack and stores a pending record.
    ///
    /// On gateway failure nothing is stored and the ledger is untouched.
    pub async fn request_payment(
        &self,
        uid: i64,
        pack_id: &str,
    ) -> Result<RequestedPayment, PaymentError> {
        let pack = catalog::pack(pack_id).ok_or(PaymentError::UnknownPack)?;
        let gateway = self.gateway.as_ref().ok_or(PaymentError::NotConfigured)?;

        let metadata = json!({ "uid": uid, "pack_id": pack_id });
        let description = format!("Tamagocho: {}", pack.title);

        let created = gateway
            .create_payment(pack.rub, &description, &metadata, &self.return_url)
            .await?;

        let mut payments = self.payments.lock().await;
        payments.insert(
            created.id.clone(),
            PaymentRecord {
                status: PaymentStatus::Pending,
                uid,
                gems: pack.gems,
                pack: pack_id.to_string(),
            },
        );

        log::info!(
            "Payment {} pending: user {} buying {} ({} gems)",
            created.id,
            uid,
            pack_id,
            pack.gems
        );

        Ok(RequestedPayment {
            payment_id: created.id,
            confirmation_url: created.confirmation.confirmation_url,
        })
    }

    /// Pure record lookup plus the owning user's current balance.
    ///
    /// Never queries the provider: status only moves via the webhook.
    pub async fn check_status(&self, payment_id: &str) -> Result<PaymentView, PaymentError> {
        let record = {
            let payments = self.payments.lock().await;
            payments.get(payment_id).cloned()
        }
        .ok_or(PaymentError::NotFound)?;

        let (gems, _) = self.ledger.balance(record.uid).await;
        Ok(PaymentView {
            status: record.status,
            gems,
        })
    }

    /// Webhook entry point. Safe to call arbitrarily many times for the
    /// same event; crediting happens at most once per payment record.
    ///
    /// Malformed bodies and unknown event types are logged and ignored —
    /// never an error to the provider.
    pub async fn on_provider_event(&self, body: &Value) {
        let Some(event) = SucceededEvent::from_json(body) else {
            log::debug!("Ignoring provider event: {}", body);
            return;
        };

        // Flip the status under the store guard, then credit outside it.
        // The flip is the idempotence point: a redelivered event sees
        // Succeeded and takes the no-op arm.
        let credit: Option<(i64, u64)> = {
            let mut payments = self.payments.lock().await;
            match payments.get_mut(&event.payment_id) {
                Some(record) if record.status == PaymentStatus::Pending => {
                    record.status = PaymentStatus::Succeeded;
                    Some((record.uid, record.gems))
                }
                Some(_) => {
                    log::info!(
                        "Duplicate webhook for payment {} - already succeeded",
                        event.payment_id
                    );
                    None
                }
                None => {
                    // Record creation was lost; recover from metadata if it
                    // names a real user and a known pack.
                    match (event.uid.filter(|&u| u != 0), event.pack_id.as_deref()) {
                        (Some(uid), Some(pack_id)) => match catalog::pack(pack_id) {
                            Some(pack) => {
                                log::warn!(
                                    "Webhook for unknown payment {} - synthesizing record from metadata",
                                    event.payment_id
                                );
                                payments.insert(
                                    event.payment_id.clone(),
                                    PaymentRecord {
                                        status: PaymentStatus::Succeeded,
                                        uid,
                                        gems: pack.gems,
                                        pack: pack_id.to_string(),
                                    },
                                );
                                Some((uid, pack.gems))
                            }
                            None => {
                                log::warn!(
                                    "Webhook for unknown payment {} names unknown pack {:?}",
                                    event.payment_id,
                                    pack_id
                                );
                                None
                            }
                        },
                        _ => {
                            log::warn!(
                                "Webhook for unknown payment {} without usable metadata",
                                event.payment_id
                            );
                            None
                        }
                    }
                }
            }
        };

        if let Some((uid, gems)) = credit {
            self.ledger.credit(uid, gems).await;
            log::info!("Payment {} succeeded: credited user {}", event.payment_id, uid);
        }
    }

    #[cfg(test)]
    pub(crate) async fn insert_record(&self, payment_id: &str, record: PaymentRecord) {
        self.payments
            .lock()
            .await
            .insert(payment_id.to_string(), record);
    }
}
