// contract-abi/src/value.rs

use crate::types::TypeDescriptor;
use blockchain_crypto::Address;
use num_bigint::{BigInt, BigUint};
use serde_json::{Map, Value};

/// Prefix used when rendering raw bytes into JSON output
pub const HEX_PREFIX: &str = "hex://";

/// A typed value ready to encode, or freshly decoded
///
/// Trees are built per call and own their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint { bits: usize, value: BigUint },
    Int { bits: usize, value: BigInt },
    Bool(bool),
    Address(Address),
    /// `bytes` is exactly `size` long
    FixedBytes { size: usize, bytes: Vec<u8> },
    Bytes(Vec<u8>),
    String(String),
    FixedList { element: TypeDescriptor, items: Vec<AbiValue> },
    DynamicList { element: TypeDescriptor, items: Vec<AbiValue> },
    Tuple(Vec<(String, AbiValue)>),
}

impl AbiValue {
    pub fn uint(bits: usize, value: impl Into<BigUint>) -> Self {
        AbiValue::Uint { bits, value: value.into() }
    }

    pub fn int(bits: usize, value: impl Into<BigInt>) -> Self {
        AbiValue::Int { bits, value: value.into() }
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiValue::Bytes(_) | AbiValue::String(_) | AbiValue::DynamicList { .. } => true,
            AbiValue::FixedList { element, items } => match items.first() {
                Some(first) => first.is_dynamic(),
                None => element.is_dynamic(),
            },
            AbiValue::Tuple(fields) => fields.iter().any(|(_, v)| v.is_dynamic()),
            _ => false,
        }
    }

    /// Words this value occupies in its parent's head
    pub fn head_words(&self) -> usize {
        if self.is_dynamic() {
            return 1;
        }
        match self {
            AbiValue::FixedList { items, .. } => items.iter().map(|v| v.head_words()).sum(),
            AbiValue::Tuple(fields) => fields.iter().map(|(_, v)| v.head_words()).sum(),
            _ => 1,
        }
    }

    /// Positional JSON rendering: integers as decimal strings, tuples as arrays
    pub fn to_json(&self) -> Value {
        match self {
            AbiValue::Uint { value, .. } => Value::String(value.to_string()),
            AbiValue::Int { value, .. } => Value::String(value.to_string()),
            AbiValue::Bool(b) => Value::Bool(*b),
            AbiValue::Address(addr) => Value::String(addr.to_hex()),
            AbiValue::FixedBytes { bytes, .. } | AbiValue::Bytes(bytes) => {
                Value::String(format!("{}{}", HEX_PREFIX, hex::encode(bytes)))
            }
            AbiValue::String(s) => Value::String(s.clone()),
            AbiValue::FixedList { items, .. } | AbiValue::DynamicList { items, .. } => {
                Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            AbiValue::Tuple(fields) => Value::Array(fields.iter().map(|(_, v)| v.to_json()).collect()),
        }
    }

    /// Like [`to_json`](Self::to_json) but tuples become objects keyed by
    /// component name. Unnamed components fall back to their index.
    pub fn to_json_object(&self) -> Value {
        match self {
            AbiValue::FixedList { items, .. } | AbiValue::DynamicList { items, .. } => {
                Value::Array(items.iter().map(|v| v.to_json_object()).collect())
            }
            AbiValue::Tuple(fields) => {
                let mut map = Map::new();
                for (i, (name, v)) in fields.iter().enumerate() {
                    let key = if name.is_empty() { i.to_string() } else { name.clone() };
                    map.insert(key, v.to_json_object());
                }
                Value::Object(map)
            }
            leaf => leaf.to_json(),
        }
    }
}

/// Render a decoded parameter list as a JSON array
pub fn values_to_json(values: &[AbiValue]) -> Value {
    Value::Array(values.iter().map(|v| v.to_json()).collect())
}
