use crate::domain::transaction::Transaction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// The value-added products a wallet can be spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Airtime,
    Data,
    Electricity,
    Education,
    PrintRecharge,
    Internet,
    Transfer,
    Betting,
}

impl ProductType {
    pub const ALL: [ProductType; 8] = [
        ProductType::Airtime,
        ProductType::Data,
        ProductType::Electricity,
        ProductType::Education,
        ProductType::PrintRecharge,
        ProductType::Internet,
        ProductType::Transfer,
        ProductType::Betting,
    ];
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductType::Airtime => "airtime",
            ProductType::Data => "data",
            ProductType::Electricity => "electricity",
            ProductType::Education => "education",
            ProductType::PrintRecharge => "print_recharge",
            ProductType::Internet => "internet",
            ProductType::Transfer => "transfer",
            ProductType::Betting => "betting",
        };
        f.write_str(name)
    }
}

/// Inclusive purchase amount range for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountBounds {
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Per-product amount bounds. Consumed by the orchestrator; the table
/// itself is configuration.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    bounds: HashMap<ProductType, AmountBounds>,
}

impl Default for ProductCatalog {
    fn default() -> Self {
        let mut bounds = HashMap::new();
        let mut set = |product, min, max| {
            bounds.insert(product, AmountBounds { min, max });
        };
        set(ProductType::Airtime, dec!(50), dec!(50_000));
        set(ProductType::Data, dec!(100), dec!(50_000));
        set(ProductType::Electricity, dec!(500), dec!(100_000));
        set(ProductType::Education, dec!(1_000), dec!(50_000));
        set(ProductType::PrintRecharge, dec!(100), dec!(100_000));
        set(ProductType::Internet, dec!(500), dec!(100_000));
        set(ProductType::Transfer, dec!(100), dec!(1_000_000));
        set(ProductType::Betting, dec!(100), dec!(500_000));
        Self { bounds }
    }
}

impl ProductCatalog {
    pub fn bounds(&self, product: ProductType) -> AmountBounds {
        self.bounds[&product]
    }
}

/// One purchase request as handed over by the transport layer: the typed
/// head plus whatever product-specific fields the processor expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(rename = "type")]
    pub product: ProductType,
    pub amount: Decimal,
    pub pin: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PurchaseRequest {
    /// Product-specific string field, trimmed; `None` when absent or empty.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn field_u64(&self, name: &str) -> Option<u64> {
        self.fields.get(name).and_then(Value::as_u64)
    }
}

/// Outcome of one purchase attempt. Carries the transaction in every case
/// so callers always have a reference, and the new balance only on success.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub success: bool,
    pub message: String,
    pub transaction: Transaction,
    pub new_balance: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_bounds() {
        let catalog = ProductCatalog::default();
        assert!(catalog.bounds(ProductType::Airtime).contains(dec!(1_000)));
        assert!(!catalog.bounds(ProductType::Airtime).contains(dec!(10)));
        assert!(
            !catalog
                .bounds(ProductType::Betting)
                .contains(dec!(600_000))
        );
        for product in ProductType::ALL {
            let bounds = catalog.bounds(product);
            assert!(bounds.min < bounds.max);
        }
    }

    #[test]
    fn test_purchase_request_deserialization() {
        let request: PurchaseRequest = serde_json::from_value(json!({
            "type": "airtime",
            "amount": 1000,
            "pin": "1234",
            "network": "mtn",
            "phone": "08031234567"
        }))
        .unwrap();

        assert_eq!(request.product, ProductType::Airtime);
        assert_eq!(request.amount, dec!(1000));
        assert_eq!(request.field("network"), Some("mtn"));
        assert_eq!(request.field("phone"), Some("08031234567"));
        assert_eq!(request.field("missing"), None);
    }

    #[test]
    fn test_unknown_product_rejected() {
        let result: Result<PurchaseRequest, _> = serde_json::from_value(json!({
            "type": "lottery",
            "amount": 1000,
            "pin": "1234"
        }));
        assert!(result.is_err());
    }
}
