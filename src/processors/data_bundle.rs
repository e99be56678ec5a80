use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::provider::ProviderRef;
use crate::processors::{dispatch_via, valid_network, valid_phone};
use async_trait::async_trait;
use serde_json::json;

const DESCRIPTION: &str = "Data bundle purchase";

pub struct DataProcessor {
    provider: ProviderRef,
}

impl DataProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for DataProcessor {
    fn product(&self) -> ProductType {
        ProductType::Data
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        let Some(network) = request.field("network") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "network is required");
        };
        if !valid_network(network) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "unknown network");
        }
        let Some(phone) = request.field("phone") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "phone number is required");
        };
        if !valid_phone(phone) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "invalid phone number");
        }
        let Some(plan) = request.field("plan") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "data plan is required");
        };

        let data = json!({
            "network": network.to_ascii_lowercase(),
            "phone": phone,
            "plan": plan,
            "amount": request.amount,
        });
        let message = format!("{plan} data plan activated for {phone}");
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
