use crate::domain::ports::{CheckoutSession, PaymentMetadata, PaymentProvider, ProviderIntent, ProviderRefund, SavedPaymentMethod};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

/// Stripe REST client speaking form-encoded requests with a secret key.
pub struct StripePaymentProvider {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripePaymentProvider {
    pub fn new(api_base: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &[(String, String)]) -> Result<T, AppError> {
        let res = self.client.post(self.url(path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(connection_error)?;
        decode(path, res).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let res = self.client.get(self.url(path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(connection_error)?;
        decode(path, res).await
    }
}

fn connection_error(e: reqwest::Error) -> AppError {
    let msg = format!("Stripe connection error: {}", e);
    error!("{}", msg);
    AppError::Provider(msg)
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Deserialize)]
struct StripeError {
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
}

async fn decode<T: DeserializeOwned>(path: &str, res: Response) -> Result<T, AppError> {
    let status = res.status();
    if status.is_success() {
        return res.json::<T>().await
            .map_err(|e| AppError::Provider(format!("Unexpected Stripe response for {}: {}", path, e)));
    }

    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<StripeErrorBody>(&body)
        .map(|b| {
            let code = b.error.decline_code.or(b.error.code).unwrap_or_else(|| "unknown".into());
            format!("{} ({})", b.error.message.unwrap_or_else(|| "Stripe request failed".into()), code)
        })
        .unwrap_or(body);
    error!(path, status = %status, "Stripe request failed: {}", detail);
    Err(AppError::Provider(detail))
}

fn metadata_form(metadata: &PaymentMetadata) -> Vec<(String, String)> {
    vec![
        ("metadata[booking_id]".into(), metadata.booking_id.clone()),
        ("metadata[payment_id]".into(), metadata.payment_id.clone()),
        ("metadata[venue_id]".into(), metadata.venue_id.clone()),
        ("metadata[renter_id]".into(), metadata.renter_id.clone()),
    ]
}

#[derive(Deserialize)]
struct IntentBody {
    id: String,
    client_secret: Option<String>,
    status: String,
}

impl From<IntentBody> for ProviderIntent {
    fn from(body: IntentBody) -> Self {
        Self { id: body.id, client_secret: body.client_secret, status: body.status }
    }
}

#[derive(Deserialize)]
struct SetupIntentBody {
    payment_method: Option<String>,
    customer: Option<String>,
}

#[derive(Deserialize)]
struct RefundBody {
    id: String,
    amount: i64,
    status: String,
}

#[derive(Deserialize)]
struct CheckoutSessionBody {
    payment_intent: Option<String>,
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[async_trait]
impl PaymentProvider for StripePaymentProvider {
    async fn create_payment_intent(&self, amount_minor: i64, currency: &str, metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError> {
        let mut form = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        form.extend(metadata_form(metadata));
        let intent: IntentBody = self.post("payment_intents", &form).await?;
        debug!(payment_intent_id = %intent.id, "Stripe payment intent created");
        Ok(intent.into())
    }

    async fn create_setup_intent(&self, metadata: &PaymentMetadata) -> Result<ProviderIntent, AppError> {
        let mut form = vec![
            ("usage".to_string(), "off_session".to_string()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        form.extend(metadata_form(metadata));
        let intent: IntentBody = self.post("setup_intents", &form).await?;
        debug!(setup_intent_id = %intent.id, "Stripe setup intent created");
        Ok(intent.into())
    }

    async fn retrieve_setup_intent(&self, setup_intent_id: &str) -> Result<Option<SavedPaymentMethod>, AppError> {
        let body: SetupIntentBody = self.get(&format!("setup_intents/{}", setup_intent_id)).await?;
        Ok(body.payment_method.map(|payment_method_id| SavedPaymentMethod {
            payment_method_id,
            customer_id: body.customer,
        }))
    }

    async fn charge_off_session(
        &self,
        amount_minor: i64,
        currency: &str,
        method: &SavedPaymentMethod,
        metadata: &PaymentMetadata,
    ) -> Result<ProviderIntent, AppError> {
        let mut form = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            ("payment_method".to_string(), method.payment_method_id.clone()),
            ("off_session".to_string(), "true".to_string()),
            ("confirm".to_string(), "true".to_string()),
        ];
        if let Some(customer) = &method.customer_id {
            form.push(("customer".to_string(), customer.clone()));
        }
        form.extend(metadata_form(metadata));
        let intent: IntentBody = self.post("payment_intents", &form).await?;
        Ok(intent.into())
    }

    async fn cancel_setup_intent(&self, setup_intent_id: &str) -> Result<(), AppError> {
        let _: IntentBody = self.post(&format!("setup_intents/{}/cancel", setup_intent_id), &[]).await?;
        Ok(())
    }

    async fn refund(&self, payment_intent_id: &str, amount_minor: i64) -> Result<ProviderRefund, AppError> {
        let form = vec![
            ("payment_intent".to_string(), payment_intent_id.to_string()),
            ("amount".to_string(), amount_minor.to_string()),
        ];
        let refund: RefundBody = self.post("refunds", &form).await?;
        Ok(ProviderRefund { id: refund.id, amount_minor: refund.amount, status: refund.status })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, AppError> {
        let mut body: CheckoutSessionBody = self.get(&format!("checkout/sessions/{}", session_id)).await?;
        Ok(CheckoutSession {
            payment_intent_id: body.payment_intent,
            booking_id: body.metadata.remove("booking_id").or(body.client_reference_id),
        })
    }
}
