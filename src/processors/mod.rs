//! Service Processors: one unit per product type, each validating its own
//! fields and dispatching through the provider boundary. Adding a product
//! means adding a processor and registering it; nothing central changes.

pub mod airtime;
pub mod bank_transfer;
pub mod betting;
pub mod bills;
pub mod data_bundle;
pub mod electricity;
pub mod provider;

use crate::domain::ports::{ProcessorOutcome, ServiceProcessor};
use crate::domain::product::ProductType;
use provider::{ProviderClient, ProviderRef, ProviderReply};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) const NETWORKS: [&str; 4] = ["mtn", "glo", "airtel", "9mobile"];

/// Nigerian mobile number: 11 digits, leading zero.
pub(crate) fn valid_phone(phone: &str) -> bool {
    phone.len() == 11 && phone.starts_with('0') && phone.chars().all(|c| c.is_ascii_digit())
}

pub(crate) fn valid_network(network: &str) -> bool {
    NETWORKS.contains(&network.to_ascii_lowercase().as_str())
}

/// Shared provider-call tail: maps the reply (or a transport error) onto
/// the uniform outcome, folding the provider reference into the data bag.
pub(crate) async fn dispatch_via(
    provider: &ProviderRef,
    product: ProductType,
    reference: &str,
    description: &str,
    success_message: &str,
    mut data: Value,
) -> ProcessorOutcome {
    match provider.dispatch(product, reference, &data).await {
        Ok(ProviderReply {
            approved: true,
            provider_reference,
            ..
        }) => {
            if let Value::Object(map) = &mut data {
                map.insert("provider_reference".to_string(), provider_reference.into());
            }
            ProcessorOutcome::approved(reference, description, success_message, data)
        }
        Ok(reply) => ProcessorOutcome::declined(reference, description, &reply.message),
        Err(err) => {
            tracing::warn!(%product, reference, error = %err, "provider dispatch failed");
            ProcessorOutcome::declined(reference, description, "provider unavailable")
        }
    }
}

/// Product-type keyed dispatch table for the orchestrator.
pub struct ProcessorRegistry {
    processors: HashMap<ProductType, Box<dyn ServiceProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    pub fn register(&mut self, processor: Box<dyn ServiceProcessor>) {
        self.processors.insert(processor.product(), processor);
    }

    pub fn get(&self, product: ProductType) -> Option<&dyn ServiceProcessor> {
        self.processors.get(&product).map(Box::as_ref)
    }

    /// A registry covering every product, all wired to one provider client.
    pub fn with_provider(provider: ProviderRef) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(airtime::AirtimeProcessor::new(provider.clone())));
        registry.register(Box::new(data_bundle::DataProcessor::new(provider.clone())));
        registry.register(Box::new(electricity::ElectricityProcessor::new(
            provider.clone(),
        )));
        registry.register(Box::new(bills::EducationProcessor::new(provider.clone())));
        registry.register(Box::new(bills::PrintRechargeProcessor::new(
            provider.clone(),
        )));
        registry.register(Box::new(bills::InternetProcessor::new(provider.clone())));
        registry.register(Box::new(bank_transfer::BankTransferProcessor::new(
            provider.clone(),
        )));
        registry.register(Box::new(betting::BettingProcessor::new(provider)));
        registry
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
