// contract-abi/src/lib.rs

//! Contract-call ABI type system and codec
//!
//! This crate turns a JSON interface description plus caller parameters into
//! the exact byte layout a contract call expects, and back:
//! - Type descriptors parsed from declared type tokens (`uint256[2][]`, tuples)
//! - An owned value tree built from JSON params or decoded bytes
//! - The head/tail codec with 32-byte words
//! - An interface catalog with overload-aware lookup by name, selector or topic
//! - A process-wide selector cache
//! - A facade tying schema text, params and payload bytes together

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod definition;
pub mod facade;
pub mod factory;
pub mod selector;
pub mod types;
pub mod value;

pub use builder::{build_params, build_value};
pub use catalog::InterfaceCatalog;
pub use codec::{decode, decode_fields, encode, SolidityCodec, TypeCodec, WORD_SIZE};
pub use definition::{MethodDescriptor, MethodKind, NamedField};
pub use facade::{ContractAbiCodec, VmMode};
pub use factory::AbiDefinitionFactory;
pub use selector::{Selector, SelectorCache};
pub use types::{LeafType, Shape, TypeDescriptor};
pub use value::AbiValue;

pub use blockchain_crypto::HashAlgorithm;

/// Result type for ABI operations
pub type AbiResult<T> = Result<T, AbiError>;

/// Errors raised while parsing schemas, building values or running the codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Tuple types are not supported in signatures: {0}")]
    TupleTypeUnsupported(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Method {0} is overloaded, look it up by selector instead")]
    AmbiguousMethod(String),

    #[error("Value out of range: {0}")]
    ValueRange(String),

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("No codec registered for {0} mode")]
    CodecUnavailable(String),
}

impl From<serde_json::Error> for AbiError {
    fn from(e: serde_json::Error) -> Self {
        AbiError::InvalidParams(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AbiError::AmbiguousMethod("get".into());
        assert!(err.to_string().contains("selector"));

        let err: AbiError = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err().into();
        assert!(matches!(err, AbiError::InvalidParams(_)));
    }
}
