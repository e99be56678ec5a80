use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::provider::ProviderRef;
use crate::processors::{dispatch_via, valid_network, valid_phone};
use async_trait::async_trait;
use serde_json::json;

const DESCRIPTION: &str = "Airtime purchase";

pub struct AirtimeProcessor {
    provider: ProviderRef,
}

impl AirtimeProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for AirtimeProcessor {
    fn product(&self) -> ProductType {
        ProductType::Airtime
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

        let data = json!({
            "network": network.to_ascii_lowercase(),
            "phone": phone,
            "amount": request.amount,
        });
        let message = format!("{} airtime delivered to {}", request.amount, phone);
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
