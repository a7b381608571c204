// contract-abi/src/builder.rs

//! Builds [`AbiValue`] trees from caller-supplied JSON
//!
//! The walk mirrors the decoder: peel the outermost extent first, then expand
//! tuples component by component, then validate leaves.

use crate::definition::NamedField;
use crate::types::{LeafType, Shape, TypeDescriptor};
use crate::value::{AbiValue, HEX_PREFIX};
use crate::{AbiError, AbiResult};
use blockchain_crypto::Address;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::One;
use serde_json::Value;

/// Build one value per field from a positional array or a name-keyed object
pub fn build_params(fields: &[NamedField], params: &Value) -> AbiResult<Vec<AbiValue>> {
    let named = build_fields(fields, params, "params")?;
    Ok(named.into_iter().map(|(_, v)| v).collect())
}

/// Build a value tree for a single declared type
pub fn build_value(ty: &TypeDescriptor, source: &Value) -> AbiResult<AbiValue> {
    match ty.shape()? {
        Shape::DynamicList(element) => {
            let items = expect_array(source, ty)?
                .iter()
                .map(|item| build_value(&element, item))
                .collect::<AbiResult<Vec<_>>>()?;
            Ok(AbiValue::DynamicList { element, items })
        }
        Shape::FixedList(k, element) => {
            let source = expect_array(source, ty)?;
            if source.len() != k {
                return Err(AbiError::InvalidParams(format!(
                    "{} expects {} elements, got {}",
                    ty,
                    k,
                    source.len()
                )));
            }
            let items = source
                .iter()
                .map(|item| build_value(&element, item))
                .collect::<AbiResult<Vec<_>>>()?;
            Ok(AbiValue::FixedList { element, items })
        }
        Shape::Tuple(components) => {
            build_fields(components, source, ty.raw_type()).map(AbiValue::Tuple)
        }
        Shape::Leaf(leaf) => build_leaf(leaf, source),
    }
}

fn build_fields(
    fields: &[NamedField],
    source: &Value,
    context: &str,
) -> AbiResult<Vec<(String, AbiValue)>> {
    match source {
        Value::Array(items) => {
            if items.len() != fields.len() {
                return Err(AbiError::InvalidParams(format!(
                    "{} expects {} values, got {}",
                    context,
                    fields.len(),
                    items.len()
                )));
            }
            fields
                .iter()
                .zip(items)
                .map(|(field, item)| Ok((field.name.clone(), build_value(&field.ty, item)?)))
                .collect()
        }
        Value::Object(map) => fields
            .iter()
            .map(|field| {
                let item = map.get(&field.name).ok_or_else(|| {
                    AbiError::InvalidParams(format!("{} is missing field '{}'", context, field.name))
                })?;
                Ok((field.name.clone(), build_value(&field.ty, item)?))
            })
            .collect(),
        Value::Null if fields.is_empty() => Ok(Vec::new()),
        other => Err(AbiError::InvalidParams(format!(
            "{} expects an array or object, got {}",
            context, other
        ))),
    }
}

fn expect_array<'a>(source: &'a Value, ty: &TypeDescriptor) -> AbiResult<&'a Vec<Value>> {
    source
        .as_array()
        .ok_or_else(|| AbiError::InvalidParams(format!("{} expects an array, got {}", ty, source)))
}

fn build_leaf(leaf: LeafType, source: &Value) -> AbiResult<AbiValue> {
    match leaf {
        LeafType::Uint(bits) => {
            let value = json_to_biguint(source)?;
            check_uint_range(&value, bits)?;
            Ok(AbiValue::Uint { bits, value })
        }
        LeafType::Int(bits) => {
            let value = json_to_bigint(source)?;
            check_int_range(&value, bits)?;
            Ok(AbiValue::Int { bits, value })
        }
        LeafType::Bool => match source {
            Value::Bool(b) => Ok(AbiValue::Bool(*b)),
            Value::String(s) if s == "true" => Ok(AbiValue::Bool(true)),
            Value::String(s) if s == "false" => Ok(AbiValue::Bool(false)),
            other => Err(AbiError::InvalidParams(format!("expected bool, got {}", other))),
        },
        LeafType::Address => {
            let text = expect_str(source, "address")?;
            Address::from_hex(text)
                .map(AbiValue::Address)
                .map_err(|e| AbiError::InvalidParams(e.to_string()))
        }
        LeafType::FixedBytes(size) => {
            let mut bytes = text_to_bytes(expect_str(source, "bytes")?)?;
            if bytes.len() > size {
                return Err(AbiError::ValueRange(format!(
                    "bytes{} cannot hold {} bytes",
                    size,
                    bytes.len()
                )));
            }
            bytes.resize(size, 0);
            Ok(AbiValue::FixedBytes { size, bytes })
        }
        LeafType::Bytes => text_to_bytes(expect_str(source, "bytes")?).map(AbiValue::Bytes),
        LeafType::String => match source {
            Value::String(s) => Ok(AbiValue::String(s.clone())),
            Value::Number(n) => Ok(AbiValue::String(n.to_string())),
            Value::Bool(b) => Ok(AbiValue::String(b.to_string())),
            other => Err(AbiError::InvalidParams(format!("expected string, got {}", other))),
        },
    }
}

fn expect_str<'a>(source: &'a Value, what: &str) -> AbiResult<&'a str> {
    source
        .as_str()
        .ok_or_else(|| AbiError::InvalidParams(format!("expected {} string, got {}", what, source)))
}

/// `hex://` and `0x` mark hex text; anything else is taken as UTF-8 bytes
fn text_to_bytes(text: &str) -> AbiResult<Vec<u8>> {
    let hex_body = text.strip_prefix(HEX_PREFIX).or_else(|| text.strip_prefix("0x"));
    match hex_body {
        Some(body) => hex::decode(body).map_err(|e| AbiError::InvalidParams(format!("{}: {}", text, e))),
        None => Ok(text.as_bytes().to_vec()),
    }
}

fn parse_magnitude(text: &str) -> Option<BigUint> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => BigUint::parse_bytes(hex.as_bytes(), 16),
        Some(_) => None,
        None if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            BigUint::parse_bytes(text.as_bytes(), 10)
        }
        None => None,
    }
}

fn json_to_biguint(source: &Value) -> AbiResult<BigUint> {
    match source {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(BigUint::from(v))
            } else if n.as_i64().is_some() {
                Err(AbiError::ValueRange(format!("{} is negative", n)))
            } else {
                Err(AbiError::InvalidParams(format!(
                    "{} is not an integer, pass large values as strings",
                    n
                )))
            }
        }
        Value::String(s) => {
            if s.trim_start().starts_with('-') {
                return Err(AbiError::ValueRange(format!("{} is negative", s)));
            }
            parse_magnitude(s).ok_or_else(|| AbiError::InvalidParams(format!("invalid integer '{}'", s)))
        }
        other => Err(AbiError::InvalidParams(format!("expected integer, got {}", other))),
    }
}

fn json_to_bigint(source: &Value) -> AbiResult<BigInt> {
    match source {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(BigInt::from(v))
            } else if let Some(v) = n.as_u64() {
                Ok(BigInt::from(v))
            } else {
                Err(AbiError::InvalidParams(format!(
                    "{} is not an integer, pass large values as strings",
                    n
                )))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let (sign, body) = match trimmed.strip_prefix('-') {
                Some(rest) => (Sign::Minus, rest),
                None => (Sign::Plus, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            let magnitude = parse_magnitude(body)
                .ok_or_else(|| AbiError::InvalidParams(format!("invalid integer '{}'", s)))?;
            Ok(BigInt::from_biguint(sign, magnitude))
        }
        other => Err(AbiError::InvalidParams(format!("expected integer, got {}", other))),
    }
}

pub(crate) fn check_uint_range(value: &BigUint, bits: usize) -> AbiResult<()> {
    if value.bits() > bits as u64 {
        return Err(AbiError::ValueRange(format!("{} does not fit in uint{}", value, bits)));
    }
    Ok(())
}

pub(crate) fn check_int_range(value: &BigInt, bits: usize) -> AbiResult<()> {
    let bound = BigInt::one() << (bits - 1);
    let fits = if value.sign() == Sign::Minus {
        -value <= bound
    } else {
        value < &bound
    };
    if !fits {
        return Err(AbiError::ValueRange(format!("{} does not fit in int{}", value, bits)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(token: &str) -> TypeDescriptor {
        TypeDescriptor::parse(token).unwrap()
    }

    #[test]
    fn test_uint_bounds() {
        assert!(build_value(&ty("uint8"), &json!(255)).is_ok());
        assert!(matches!(build_value(&ty("uint8"), &json!(256)), Err(AbiError::ValueRange(_))));
        assert!(matches!(build_value(&ty("uint256"), &json!(-1)), Err(AbiError::ValueRange(_))));
        assert!(matches!(build_value(&ty("uint256"), &json!("-5")), Err(AbiError::ValueRange(_))));

        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert!(build_value(&ty("uint256"), &json!(max)).is_ok());
        assert_eq!(
            build_value(&ty("uint32"), &json!("0xff")).unwrap(),
            AbiValue::uint(32, 255u32)
        );
        assert!(matches!(build_value(&ty("uint256"), &json!(1.5)), Err(AbiError::InvalidParams(_))));
        assert!(matches!(build_value(&ty("uint256"), &json!("12a")), Err(AbiError::InvalidParams(_))));
    }

    #[test]
    fn test_int_bounds() {
        assert!(build_value(&ty("int8"), &json!(-128)).is_ok());
        assert!(build_value(&ty("int8"), &json!(127)).is_ok());
        assert!(matches!(build_value(&ty("int8"), &json!(128)), Err(AbiError::ValueRange(_))));
        assert!(matches!(build_value(&ty("int8"), &json!(-129)), Err(AbiError::ValueRange(_))));
        assert_eq!(
            build_value(&ty("int256"), &json!("-11111111111111111111111")).unwrap(),
            AbiValue::Int {
                bits: 256,
                value: "-11111111111111111111111".parse().unwrap()
            }
        );
    }

    #[test]
    fn test_leaf_kinds() {
        assert_eq!(build_value(&ty("bool"), &json!("true")).unwrap(), AbiValue::Bool(true));
        assert!(build_value(&ty("bool"), &json!(1)).is_err());

        let addr = build_value(&ty("address"), &json!("0x692a70d2e424a56d2c6c27aa97d1a86395877b3a"));
        assert!(matches!(addr, Ok(AbiValue::Address(_))));
        assert!(build_value(&ty("address"), &json!("0x1234")).is_err());

        assert_eq!(
            build_value(&ty("bytes4"), &json!("ab")).unwrap(),
            AbiValue::FixedBytes { size: 4, bytes: vec![b'a', b'b', 0, 0] }
        );
        assert!(matches!(build_value(&ty("bytes2"), &json!("abc")), Err(AbiError::ValueRange(_))));
        assert_eq!(
            build_value(&ty("bytes"), &json!("hex://0102")).unwrap(),
            AbiValue::Bytes(vec![1, 2])
        );
        assert_eq!(
            build_value(&ty("string"), &json!(42)).unwrap(),
            AbiValue::String("42".into())
        );
    }

    #[test]
    fn test_lists() {
        let fixed = build_value(&ty("uint8[2]"), &json!([1, 2])).unwrap();
        assert!(matches!(fixed, AbiValue::FixedList { ref items, .. } if items.len() == 2));
        assert!(matches!(build_value(&ty("uint8[2]"), &json!([1])), Err(AbiError::InvalidParams(_))));

        let nested = build_value(&ty("uint8[][2]"), &json!([[1, 2, 3], []])).unwrap();
        match nested {
            AbiValue::FixedList { items, .. } => {
                assert!(matches!(&items[0], AbiValue::DynamicList { items, .. } if items.len() == 3));
                assert!(matches!(&items[1], AbiValue::DynamicList { items, .. } if items.is_empty()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tuple_by_name_and_position() {
        let item = ty("tuple").with_components(vec![
            NamedField::new("a", ty("int256")),
            NamedField::new("b", ty("string")),
        ]);
        let by_name = build_value(&item, &json!({"b": "x", "a": 1})).unwrap();
        let by_position = build_value(&item, &json!([1, "x"])).unwrap();
        assert_eq!(by_name, by_position);

        assert!(matches!(build_value(&item, &json!({"a": 1})), Err(AbiError::InvalidParams(_))));
    }

    #[test]
    fn test_unsupported_leaf() {
        assert!(matches!(build_value(&ty("uint7"), &json!(1)), Err(AbiError::UnsupportedType(_))));
        assert!(matches!(build_value(&ty("bytes33"), &json!("a")), Err(AbiError::UnsupportedType(_))));
    }

    #[test]
    fn test_param_count() {
        let fields = vec![NamedField::new("x", ty("uint256"))];
        assert!(build_params(&fields, &json!([1])).is_ok());
        assert!(matches!(build_params(&fields, &json!([])), Err(AbiError::InvalidParams(_))));
        assert!(build_params(&[], &Value::Null).unwrap().is_empty());
    }
}
