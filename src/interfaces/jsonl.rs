use crate::domain::product::PurchaseRequest;
use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};
use uuid::Uuid;

/// One wallet operation as submitted by a client. The purchase variant
/// flattens the product-specific fields so processors see them verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationRequest {
    Register {
        user_id: Uuid,
        #[serde(default)]
        password_hash: String,
        #[serde(default)]
        kyc_level: u8,
    },
    SetupPin {
        user_id: Uuid,
        pin: String,
        confirm_pin: String,
    },
    Fund {
        user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    },
    Transfer {
        user_id: Uuid,
        recipient: Uuid,
        amount: Decimal,
        description: Option<String>,
    },
    Purchase {
        user_id: Uuid,
        #[serde(flatten)]
        request: PurchaseRequest,
    },
    RetryBet {
        reference: String,
    },
    Freeze {
        user_id: Uuid,
    },
    Unfreeze {
        user_id: Uuid,
    },
}

/// Reads operations from a JSON-lines source, one object per line. Blank
/// lines are skipped; malformed lines surface as per-line errors so a bad
/// record does not abort the batch.
pub struct OperationReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<OperationRequest>> {
        self.reader
            .lines()
            .filter(|line| {
                line.as_ref()
                    .map(|l| !l.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|line| {
                let line = line?;
                serde_json::from_str::<OperationRequest>(&line).map_err(WalletError::from)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = concat!(
            "{\"op\":\"fund\",\"user_id\":\"11111111-1111-1111-1111-111111111111\",\"amount\":1500.0}\n",
            "\n",
            "{\"op\":\"purchase\",\"user_id\":\"11111111-1111-1111-1111-111111111111\",",
            "\"type\":\"airtime\",\"amount\":1000,\"pin\":\"2580\",\"network\":\"mtn\",\"phone\":\"08031234567\"}\n",
        );
        let reader = OperationReader::new(data.as_bytes());
        let operations: Vec<Result<OperationRequest>> = reader.operations().collect();

        assert_eq!(operations.len(), 2);
        match operations[0].as_ref().unwrap() {
            OperationRequest::Fund { amount, .. } => assert_eq!(*amount, dec!(1500.0)),
            other => panic!("unexpected operation: {other:?}"),
        }
        match operations[1].as_ref().unwrap() {
            OperationRequest::Purchase { request, .. } => {
                assert_eq!(request.product, ProductType::Airtime);
                assert_eq!(request.field("network"), Some("mtn"));
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "{\"op\":\"unknown_op\",\"user_id\":\"11111111-1111-1111-1111-111111111111\"}\n";
        let reader = OperationReader::new(data.as_bytes());
        let operations: Vec<Result<OperationRequest>> = reader.operations().collect();
        assert!(operations[0].is_err());
    }
}
