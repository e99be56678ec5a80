//! Smaller bill products: exam result pins, recharge voucher printing,
//! broadband subscriptions.

use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::provider::ProviderRef;
use crate::processors::{dispatch_via, valid_network};
use async_trait::async_trait;
use serde_json::json;

const EXAM_BODIES: [&str; 3] = ["waec", "jamb", "neco"];
const ISPS: [&str; 2] = ["smile", "spectranet"];

pub struct EducationProcessor {
    provider: ProviderRef,
}

impl EducationProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for EducationProcessor {
    fn product(&self) -> ProductType {
        ProductType::Education
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        const DESC: &str = "Exam pin purchase";
        let Some(exam) = request.field("exam") else {
            return ProcessorOutcome::declined(reference, DESC, "exam body is required");
        };
        if !EXAM_BODIES.contains(&exam.to_ascii_lowercase().as_str()) {
            return ProcessorOutcome::declined(reference, DESC, "unknown exam body");
        }
        let quantity = request.field_u64("quantity").unwrap_or(1);
        if !(1..=10).contains(&quantity) {
            return ProcessorOutcome::declined(reference, DESC, "quantity must be 1 to 10");
        }

        let data = json!({
            "exam": exam.to_ascii_lowercase(),
            "quantity": quantity,
            "amount": request.amount,
        });
        let message = format!("{quantity} {exam} pin(s) generated");
        dispatch_via(&self.provider, self.product(), reference, DESC, &message, data).await
    }
}

pub struct PrintRechargeProcessor {
    provider: ProviderRef,
}

impl PrintRechargeProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for PrintRechargeProcessor {
    fn product(&self) -> ProductType {
        ProductType::PrintRecharge
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        const DESC: &str = "Recharge pin printing";
        let Some(network) = request.field("network") else {
            return ProcessorOutcome::declined(reference, DESC, "network is required");
        };
        if !valid_network(network) {
            return ProcessorOutcome::declined(reference, DESC, "unknown network");
        }
        let Some(quantity) = request.field_u64("quantity") else {
            return ProcessorOutcome::declined(reference, DESC, "quantity is required");
        };
        if !(1..=100).contains(&quantity) {
            return ProcessorOutcome::declined(reference, DESC, "quantity must be 1 to 100");
        }

        let data = json!({
            "network": network.to_ascii_lowercase(),
            "quantity": quantity,
            "amount": request.amount,
        });
        let message = format!("{quantity} {network} recharge pin(s) generated");
        dispatch_via(&self.provider, self.product(), reference, DESC, &message, data).await
    }
}

pub struct InternetProcessor {
    provider: ProviderRef,
}

impl InternetProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for InternetProcessor {
    fn product(&self) -> ProductType {
        ProductType::Internet
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        const DESC: &str = "Internet subscription";
        let Some(isp) = request.field("isp") else {
            return ProcessorOutcome::declined(reference, DESC, "isp is required");
        };
        if !ISPS.contains(&isp.to_ascii_lowercase().as_str()) {
            return ProcessorOutcome::declined(reference, DESC, "unknown isp");
        }
        let Some(device) = request.field("device_number") else {
            return ProcessorOutcome::declined(reference, DESC, "device number is required");
        };

        let data = json!({
            "isp": isp.to_ascii_lowercase(),
            "device_number": device,
            "amount": request.amount,
        });
        let message = format!("{isp} subscription renewed for device {device}");
        dispatch_via(&self.provider, self.product(), reference, DESC, &message, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::provider::ScriptedProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_education_quantity_bounds() {
        let processor = EducationProcessor::new(Arc::new(ScriptedProvider::always(true)));
        let request: PurchaseRequest = serde_json::from_value(json!({
            "type": "education",
            "amount": 3000,
            "pin": "2580",
            "exam": "waec",
            "quantity": 11,
        }))
        .unwrap();
        let outcome = processor.process(&request, "txn_l").await;
        assert!(!outcome.success);

        let request: PurchaseRequest = serde_json::from_value(json!({
            "type": "education",
            "amount": 3000,
            "pin": "2580",
            "exam": "waec",
        }))
        .unwrap();
        // Quantity defaults to one pin.
        let outcome = processor.process(&request, "txn_m").await;
        assert!(outcome.success);
        assert_eq!(outcome.data["quantity"], 1);
    }

    #[tokio::test]
    async fn test_internet_requires_known_isp() {
        let processor = InternetProcessor::new(Arc::new(ScriptedProvider::always(true)));
        let request: PurchaseRequest = serde_json::from_value(json!({
            "type": "internet",
            "amount": 10000,
            "pin": "2580",
            "isp": "starlink",
            "device_number": "SM-99210",
        }))
        .unwrap();
        let outcome = processor.process(&request, "txn_n").await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_print_recharge_requires_quantity() {
        let processor = PrintRechargeProcessor::new(Arc::new(ScriptedProvider::always(true)));
        let request: PurchaseRequest = serde_json::from_value(json!({
            "type": "print_recharge",
            "amount": 20000,
            "pin": "2580",
            "network": "airtel",
        }))
        .unwrap();
        let outcome = processor.process(&request, "txn_o").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "quantity is required");
    }
}
