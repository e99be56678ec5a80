use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::dispatch_via;
use crate::processors::provider::ProviderRef;
use async_trait::async_trait;
use serde_json::json;

const DESCRIPTION: &str = "Electricity purchase";

const DISCOS: [&str; 8] = [
    "ikeja", "eko", "abuja", "ibadan", "enugu", "kano", "jos", "portharcourt",
];

fn valid_meter(meter: &str) -> bool {
    (10..=13).contains(&meter.len()) && meter.chars().all(|c| c.is_ascii_digit())
}

pub struct ElectricityProcessor {
    provider: ProviderRef,
}

impl ElectricityProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for ElectricityProcessor {
    fn product(&self) -> ProductType {
        ProductType::Electricity
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        let Some(disco) = request.field("disco") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "disco is required");
        };
        if !DISCOS.contains(&disco.to_ascii_lowercase().as_str()) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "unknown disco");
        }
        let Some(meter) = request.field("meter_number") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "meter number is required");
        };
        if !valid_meter(meter) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "invalid meter number");
        }
        let meter_type = request.field("meter_type").unwrap_or("prepaid");
        if !matches!(meter_type, "prepaid" | "postpaid") {
            return ProcessorOutcome::declined(
                reference,
                DESCRIPTION,
                "meter type must be prepaid or postpaid",
            );
        }

        let data = json!({
            "disco": disco.to_ascii_lowercase(),
            "meter_number": meter,
            "meter_type": meter_type,
            "amount": request.amount,
        });
        let message = format!("{} units vended to meter {}", request.amount, meter);
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
