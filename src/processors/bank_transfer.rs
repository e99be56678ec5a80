use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::{ProductType, PurchaseRequest};
use crate::processors::dispatch_via;
use crate::processors::provider::ProviderRef;
use async_trait::async_trait;
use serde_json::json;

const DESCRIPTION: &str = "Bank transfer";

fn valid_account_number(account: &str) -> bool {
    account.len() == 10 && account.chars().all(|c| c.is_ascii_digit())
}

fn valid_bank_code(code: &str) -> bool {
    (3..=6).contains(&code.len()) && code.chars().all(|c| c.is_ascii_digit())
}

/// Payout to an external bank account through the provider rails.
pub struct BankTransferProcessor {
    provider: ProviderRef,
}

impl BankTransferProcessor {
    pub fn new(provider: ProviderRef) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ServiceProcessor for BankTransferProcessor {
    fn product(&self) -> ProductType {
        ProductType::Transfer
    }

    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome {
        let Some(account) = request.field("account_number") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "account number is required");
        };
        if !valid_account_number(account) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "invalid account number");
        }
        let Some(bank_code) = request.field("bank_code") else {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "bank code is required");
        };
        if !valid_bank_code(bank_code) {
            return ProcessorOutcome::declined(reference, DESCRIPTION, "invalid bank code");
        }

        let data = json!({
            "account_number": account,
            "bank_code": bank_code,
            "account_name": request.field("account_name"),
            "amount": request.amount,
        });
        let message = format!("{} sent to account {}", request.amount, account);
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

    fn request(account: &str, bank_code: &str) -> PurchaseRequest {
        serde_json::from_value(json!({
            "type": "transfer",
            "amount": 25000,
            "pin": "2580",
            "account_number": account,
            "bank_code": bank_code,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_account_and_bank_code_validation() {
        let processor = BankTransferProcessor::new(Arc::new(ScriptedProvider::always(true)));

        let outcome = processor.process(&request("00112233", "058"), "txn_p").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "invalid account number");

        let outcome = processor
            .process(&request("0011223344", "05"), "txn_q")
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "invalid bank code");

        let outcome = processor
            .process(&request("0011223344", "058"), "txn_r")
            .await;
        assert!(outcome.success);
    }
}
