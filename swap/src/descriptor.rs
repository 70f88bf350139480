//! Swap descriptor parsing and integrity validation
//!
//! The maker returns a `/`-delimited descriptor string alongside the payment
//! hash. The descriptor is untrusted input: every field it carries must match
//! the terms we sent before the session may proceed.

use thiserror::Error;

use crate::api::InitSwapRequest;

/// Descriptor rejection reasons
///
/// Any variant is fatal to the swap session and is never retried.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Wrong number of `/`-delimited fields
    #[error("swap descriptor has {0} fields, expected 6")]
    FieldCount(usize),
    /// A numeric field failed to parse
    #[error("swap descriptor field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    /// A field disagrees with the requested terms
    #[error("swap descriptor field '{field}' mismatch: expected '{expected}', got '{actual}'")]
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
}

/// Parsed maker swap descriptor
///
/// Field order on the wire: `from_amount/from_asset/to_amount/to_asset/
/// timeout_sec/payment_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapString {
    pub from_amount: u64,
    pub from_asset: String,
    pub to_amount: u64,
    pub to_asset: String,
    pub timeout_sec: u64,
    pub payment_hash: String,
    /// Original descriptor text, echoed back verbatim in later phases
    pub raw: String,
}

impl SwapString {
    /// Parse a raw descriptor, requiring exactly six fields
    pub fn parse(raw: &str) -> Result<Self, DescriptorError> {
        let fields: Vec<&str> = raw.split('/').collect();
        if fields.len() != 6 {
            return Err(DescriptorError::FieldCount(fields.len()));
        }

        let number = |field: &'static str, value: &str| -> Result<u64, DescriptorError> {
            value.parse().map_err(|_| DescriptorError::InvalidNumber {
                field,
                value: value.to_string(),
            })
        };

        Ok(Self {
            from_amount: number("from_amount", fields[0])?,
            from_asset: fields[1].to_string(),
            to_amount: number("to_amount", fields[2])?,
            to_asset: fields[3].to_string(),
            timeout_sec: number("timeout_sec", fields[4])?,
            payment_hash: fields[5].to_string(),
            raw: raw.to_string(),
        })
    }

    /// Check every descriptor field against the init request and the
    /// payment hash the maker returned with it
    pub fn validate_against(
        &self,
        request: &InitSwapRequest,
        payment_hash: &str,
    ) -> Result<(), DescriptorError> {
        let mismatch = |field: &'static str, expected: String, actual: String| {
            DescriptorError::Mismatch {
                field,
                expected,
                actual,
            }
        };

        if self.from_amount != request.from_amount {
            return Err(mismatch(
                "from_amount",
                request.from_amount.to_string(),
                self.from_amount.to_string(),
            ));
        }
        if self.from_asset != request.from_asset {
            return Err(mismatch(
                "from_asset",
                request.from_asset.clone(),
                self.from_asset.clone(),
            ));
        }
        if self.to_amount != request.to_amount {
            return Err(mismatch(
                "to_amount",
                request.to_amount.to_string(),
                self.to_amount.to_string(),
            ));
        }
        if self.to_asset != request.to_asset {
            return Err(mismatch(
                "to_asset",
                request.to_asset.clone(),
                self.to_asset.clone(),
            ));
        }
        if self.payment_hash != payment_hash {
            return Err(mismatch(
                "payment_hash",
                payment_hash.to_string(),
                self.payment_hash.clone(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> InitSwapRequest {
        InitSwapRequest {
            from_amount: 100_000,
            from_asset: "btc".to_string(),
            to_amount: 5_000_000_000,
            to_asset: "asset-x".to_string(),
            rfq_id: Some("rfq-1".to_string()),
        }
    }

    #[test]
    fn parses_well_formed_descriptor() {
        let parsed = SwapString::parse("100000/btc/5000000000/asset-x/600/abc").unwrap();
        assert_eq!(parsed.from_amount, 100_000);
        assert_eq!(parsed.from_asset, "btc");
        assert_eq!(parsed.to_amount, 5_000_000_000);
        assert_eq!(parsed.to_asset, "asset-x");
        assert_eq!(parsed.timeout_sec, 600);
        assert_eq!(parsed.payment_hash, "abc");
        assert_eq!(parsed.raw, "100000/btc/5000000000/asset-x/600/abc");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = SwapString::parse("100000/btc/5000000000/asset-x/600").unwrap_err();
        assert!(matches!(err, DescriptorError::FieldCount(5)));

        let err = SwapString::parse("100000/btc/5000000000/asset-x/600/abc/extra").unwrap_err();
        assert!(matches!(err, DescriptorError::FieldCount(7)));
    }

    #[test]
    fn rejects_non_numeric_amount() {
        let err = SwapString::parse("lots/btc/5000000000/asset-x/600/abc").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::InvalidNumber {
                field: "from_amount",
                ..
            }
        ));
    }

    #[test]
    fn accepts_descriptor_matching_request() {
        let parsed = SwapString::parse("100000/btc/5000000000/asset-x/600/abc").unwrap();
        assert!(parsed.validate_against(&request(), "abc").is_ok());
    }

    #[test]
    fn rejects_tampered_amount() {
        let parsed = SwapString::parse("100000/btc/500000001/asset-x/600/abc").unwrap();
        let err = parsed.validate_against(&request(), "abc").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Mismatch {
                field: "to_amount",
                ..
            }
        ));
    }

    #[test]
    fn rejects_foreign_payment_hash() {
        let parsed = SwapString::parse("100000/btc/5000000000/asset-x/600/abc").unwrap();
        let err = parsed.validate_against(&request(), "other-hash").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Mismatch {
                field: "payment_hash",
                ..
            }
        ));
    }
}
