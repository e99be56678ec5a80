use crate::domain::product::ProductType;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Raw reply from the upstream value-added-services provider.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub approved: bool,
    pub provider_reference: String,
    pub message: String,
}

/// The network boundary every processor dispatches through.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn dispatch(
        &self,
        product: ProductType,
        reference: &str,
        payload: &Value,
    ) -> Result<ProviderReply>;
}

pub type ProviderRef = Arc<dyn ProviderClient>;

/// Stand-in for the real provider integration: a fixed latency followed by
/// a random approve/decline draw. The orchestrator's timeout and failure
/// handling must hold no matter what backs this trait.
pub struct SimulatedProvider {
    pub latency: Duration,
    pub approval_rate: f64,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(800),
            approval_rate: 0.9,
        }
    }
}

#[async_trait]
impl ProviderClient for SimulatedProvider {
    async fn dispatch(
        &self,
        product: ProductType,
        reference: &str,
        _payload: &Value,
    ) -> Result<ProviderReply> {
        tokio::time::sleep(self.latency).await;
        let approved = rand::thread_rng().gen_bool(self.approval_rate);
        let provider_reference = format!("SIM-{}", Uuid::new_v4().simple());
        tracing::debug!(%product, reference, approved, "simulated provider reply");
        Ok(ProviderReply {
            approved,
            provider_reference,
            message: if approved {
                "approved".to_string()
            } else {
                "declined by provider".to_string()
            },
        })
    }
}

/// Deterministic provider double: replays a scripted sequence of
/// approve/decline outcomes and counts how often it was called.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<bool>>,
    fallback: bool,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn always(approved: bool) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            fallback: approved,
            calls: AtomicU32::new(0),
        }
    }

    /// Replays `outcomes` in order, then keeps returning the last one.
    pub fn sequence(outcomes: Vec<bool>) -> Self {
        let fallback = outcomes.last().copied().unwrap_or(false);
        Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn dispatch(
        &self,
        _product: ProductType,
        _reference: &str,
        _payload: &Value,
    ) -> Result<ProviderReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let approved = self
            .outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or(self.fallback);
        Ok(ProviderReply {
            approved,
            provider_reference: format!("SCRIPT-{}", Uuid::new_v4().simple()),
            message: if approved {
                "approved".to_string()
            } else {
                "declined by provider".to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_simulated_provider_rates() {
        let always = SimulatedProvider {
            latency: Duration::ZERO,
            approval_rate: 1.0,
        };
        let reply = always
            .dispatch(ProductType::Airtime, "txn_x", &json!({}))
            .await
            .unwrap();
        assert!(reply.approved);
        assert!(reply.provider_reference.starts_with("SIM-"));

        let never = SimulatedProvider {
            latency: Duration::ZERO,
            approval_rate: 0.0,
        };
        let reply = never
            .dispatch(ProductType::Airtime, "txn_x", &json!({}))
            .await
            .unwrap();
        assert!(!reply.approved);
    }

    #[tokio::test]
    async fn test_scripted_provider_sequence() {
        let provider = ScriptedProvider::sequence(vec![false, true]);
        let first = provider
            .dispatch(ProductType::Betting, "txn_x", &json!({}))
            .await
            .unwrap();
        let second = provider
            .dispatch(ProductType::Betting, "txn_x", &json!({}))
            .await
            .unwrap();
        let third = provider
            .dispatch(ProductType::Betting, "txn_x", &json!({}))
            .await
            .unwrap();

        assert!(!first.approved);
        assert!(second.approved);
        // Sequence exhausted, last outcome repeats.
        assert!(third.approved);
        assert_eq!(provider.call_count(), 3);
    }
}
