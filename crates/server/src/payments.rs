//! Payment gateway collaborator.
//!
//! Checkout only needs one operation: charge an amount against a client-side
//! payment token and get back the charge ID and the settled amount. The
//! settled amount is what ends up on the order, not our locally computed
//! total.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use thimble_core::Cents;

/// A successful charge as reported by the gateway.
#[derive(Debug, Clone)]
pub struct Charge {
    /// External payment ID.
    pub id: String,
    /// The amount the gateway actually charged.
    pub amount: Cents,
}

/// Errors from the payment gateway. Never swallowed: checkout surfaces these
/// to the caller as a payment failure.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The charge request could not be completed.
    #[error("payment request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the charge.
    #[error("charge declined: {0}")]
    Declined(String),
}

/// Charges payments. Settlement logic is the gateway's problem.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` in `currency` against a one-time source token.
    async fn charge(
        &self,
        amount: Cents,
        currency: &str,
        source_token: &str,
    ) -> Result<Charge, GatewayError>;
}

/// Stripe charges API client.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeCharge {
    id: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    /// Create a gateway client.
    #[must_use]
    pub fn new(secret_key: SecretString, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn charge(
        &self,
        amount: Cents,
        currency: &str,
        source_token: &str,
    ) -> Result<Charge, GatewayError> {
        let amount_str = amount.as_i64().to_string();
        let params = [
            ("amount", amount_str.as_str()),
            ("currency", currency),
            ("source", source_token),
        ];

        let response = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .map_or_else(|_| "unknown gateway error".to_owned(), |b| b.error.message);
            return Err(GatewayError::Declined(message));
        }

        let charge: StripeCharge = response.json().await?;
        tracing::info!(charge_id = %charge.id, amount = charge.amount, "payment charged");

        Ok(Charge {
            id: charge.id,
            amount: Cents::new(charge.amount),
        })
    }
}
