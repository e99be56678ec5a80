use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::dispatch_via;
use crate::processors::provider::ProviderRef;
use async_trait::async_trait;
use serde_json::json;

const DESCRIPTION: &str = "Betting wallet funding";

pub const BETTING_PROVIDERS: [&str; 5] = ["bet9ja", "sportybet", "betking", "nairabet", "1xbet"];

fn valid_customer_id(customer_id: &str) -> bool {
    !customer_id.is_empty() && customer_id.chars().all(|c| c.is_ascii_alphanumeric())
}

pub struct BettingProcessor {
    provider: ProviderRef,
}

impl BettingProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for BettingProcessor {
    fn product(&self) -> ProductType {
        ProductType::Betting
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        let Some(betting_provider) = request.field("provider") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "betting provider is required");
        };
        if !BETTING_PROVIDERS.contains(&betting_provider.to_ascii_lowercase().as_str()) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "unknown betting provider");
        }
        let Some(customer_id) = request.field("customer_id") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "customer id is required");
        };
        if !valid_customer_id(customer_id) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "invalid customer id");
        }

        let data = json!({
            "provider": betting_provider.to_ascii_lowercase(),
            "customer_id": customer_id,
            "amount": request.amount,
        });
        let message = format!(
            "{} {} account funded with {}",
            betting_provider, customer_id, request.amount
        );
        dispatch_via(
            &self.provider,
            self.product(),
            reference,
            DESCRIPTION,
            &message,
            data,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::provider::ScriptedProvider;
    use std::sync::Arc;

    fn request(provider: &str, customer_id: &str) -> PurchaseRequest {
        serde_json::from_value(json!({
            "type": "betting",
            "amount": 2000,
            "pin": "2580",
            "provider": provider,
            "customer_id": customer_id,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_known_provider_approved() {
        let processor = BettingProcessor::new(Arc::new(ScriptedProvider::always(true)));
        let outcome = processor.process(&request("bet9ja", "BJ90211"), "txn_i").await;
        assert!(outcome.success);
        assert_eq!(outcome.data["provider"], "bet9ja");
    }

    #[tokio::test]
    async fn test_unknown_provider_and_bad_customer_id() {
        let provider = Arc::new(ScriptedProvider::always(true));
        let processor = BettingProcessor::new(provider.clone());

        let outcome = processor.process(&request("betway", "BJ90211"), "txn_j").await;
        assert!(!outcome.success);

        let outcome = processor.process(&request("bet9ja", "bad id!"), "txn_k").await;
        assert!(!outcome.success);
        assert_eq!(provider.call_count(), 0);
    }
}
