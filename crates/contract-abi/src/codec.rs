// contract-abi/src/codec.rs

//! Head/tail codec over 32-byte words
//!
//! A unit is a sibling sequence (top-level params, list elements or tuple
//! components). Its head holds static values inline and one offset word per
//! dynamic value; tails follow in sibling order. Offsets are measured from the
//! start of the unit, which for a dynamic list is just past its length word.

use crate::builder::{check_int_range, check_uint_range};
use crate::definition::NamedField;
use crate::types::{LeafType, Shape, TypeDescriptor};
use crate::value::AbiValue;
use crate::{AbiError, AbiResult};
use blockchain_crypto::{Address, ADDRESS_SIZE};
use num_bigint::{BigInt, BigUint, Sign};
use tracing::trace;

/// Size of one ABI word
pub const WORD_SIZE: usize = 32;

/// A wire format for value trees. The EVM layout lives here; other VM targets
/// plug in their own implementation.
pub trait TypeCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn serialize(&self, values: &[AbiValue]) -> AbiResult<Vec<u8>>;

    fn deserialize(&self, data: &[u8], fields: &[NamedField]) -> AbiResult<Vec<AbiValue>>;
}

/// The EVM head/tail layout
#[derive(Debug, Default, Clone, Copy)]
pub struct SolidityCodec;

impl TypeCodec for SolidityCodec {
    fn name(&self) -> &'static str {
        "solidity"
    }

    fn serialize(&self, values: &[AbiValue]) -> AbiResult<Vec<u8>> {
        encode(values)
    }

    fn deserialize(&self, data: &[u8], fields: &[NamedField]) -> AbiResult<Vec<AbiValue>> {
        decode_fields(data, fields)
    }
}

/// Encode a parameter list as one unit
pub fn encode(values: &[AbiValue]) -> AbiResult<Vec<u8>> {
    let refs: Vec<&AbiValue> = values.iter().collect();
    let mut out = Vec::new();
    encode_unit(&refs, &mut out)?;
    trace!(values = values.len(), bytes = out.len(), "encoded unit");
    Ok(out)
}

fn encode_unit(values: &[&AbiValue], out: &mut Vec<u8>) -> AbiResult<()> {
    let head_len: usize = values.iter().map(|v| v.head_words() * WORD_SIZE).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        if value.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            encode_value(value, &mut tail)?;
        } else {
            encode_value(value, &mut head)?;
        }
    }

    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(())
}

fn encode_value(value: &AbiValue, out: &mut Vec<u8>) -> AbiResult<()> {
    match value {
        AbiValue::Uint { bits, value } => {
            check_width(*bits)?;
            check_uint_range(value, *bits)?;
            out.extend_from_slice(&uint_word(value));
        }
        AbiValue::Int { bits, value } => {
            check_width(*bits)?;
            check_int_range(value, *bits)?;
            out.extend_from_slice(&int_word(value));
        }
        AbiValue::Bool(b) => {
            let mut word = [0u8; WORD_SIZE];
            word[WORD_SIZE - 1] = u8::from(*b);
            out.extend_from_slice(&word);
        }
        AbiValue::Address(addr) => {
            let mut word = [0u8; WORD_SIZE];
            word[WORD_SIZE - ADDRESS_SIZE..].copy_from_slice(addr.as_bytes());
            out.extend_from_slice(&word);
        }
        AbiValue::FixedBytes { size, bytes } => {
            if *size == 0 || *size > WORD_SIZE || bytes.len() != *size {
                return Err(AbiError::ValueRange(format!(
                    "bytes{} holding {} bytes",
                    size,
                    bytes.len()
                )));
            }
            let mut word = [0u8; WORD_SIZE];
            word[..bytes.len()].copy_from_slice(bytes);
            out.extend_from_slice(&word);
        }
        AbiValue::Bytes(bytes) => encode_bytes(bytes, out),
        AbiValue::String(s) => encode_bytes(s.as_bytes(), out),
        AbiValue::DynamicList { items, .. } => {
            out.extend_from_slice(&usize_word(items.len()));
            let refs: Vec<&AbiValue> = items.iter().collect();
            encode_unit(&refs, out)?;
        }
        AbiValue::FixedList { items, .. } => {
            let refs: Vec<&AbiValue> = items.iter().collect();
            encode_unit(&refs, out)?;
        }
        AbiValue::Tuple(fields) => {
            let refs: Vec<&AbiValue> = fields.iter().map(|(_, v)| v).collect();
            encode_unit(&refs, out)?;
        }
    }
    Ok(())
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD_SIZE;
    if rem != 0 {
        out.resize(out.len() + WORD_SIZE - rem, 0);
    }
}

fn check_width(bits: usize) -> AbiResult<()> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::UnsupportedType(format!("integer width {}", bits)));
    }
    Ok(())
}

fn usize_word(n: usize) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn uint_word(value: &BigUint) -> [u8; WORD_SIZE] {
    let bytes = value.to_bytes_be();
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
    word
}

fn int_word(value: &BigInt) -> [u8; WORD_SIZE] {
    let bytes = value.to_signed_bytes_be();
    let fill = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
    let mut word = [fill; WORD_SIZE];
    word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
    word
}

/// Decode a unit starting at offset 0 against a list of declared types
pub fn decode(data: &[u8], types: &[TypeDescriptor]) -> AbiResult<Vec<AbiValue>> {
    trace!(types = types.len(), bytes = data.len(), "decoding unit");
    Decoder::new(data).unit(0, types.iter())
}

/// Decode a unit starting at offset 0 against a field list
pub fn decode_fields(data: &[u8], fields: &[NamedField]) -> AbiResult<Vec<AbiValue>> {
    Decoder::new(data).unit(0, fields.iter().map(|f| &f.ty))
}

/// Per-call decoding state.
///
/// Every word, length and payload read is charged against `budget`, which
/// starts at the input length. A canonical encoding reads each byte at most
/// once, so only aliased offsets can run it dry.
struct Decoder<'a> {
    data: &'a [u8],
    budget: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            budget: data.len(),
        }
    }

    fn unit<'t>(
        &mut self,
        base: usize,
        types: impl Iterator<Item = &'t TypeDescriptor>,
    ) -> AbiResult<Vec<AbiValue>> {
        let mut cursor = base;
        let mut values = Vec::new();

        for ty in types {
            if ty.is_dynamic() {
                let offset = self.read_usize(cursor)?;
                let at = base
                    .checked_add(offset)
                    .ok_or_else(|| malformed(format!("offset {} overflows", offset)))?;
                values.push(self.value(at, ty)?);
                cursor += WORD_SIZE;
            } else {
                values.push(self.value(cursor, ty)?);
                cursor = cursor
                    .checked_add(ty.head_words().saturating_mul(WORD_SIZE))
                    .ok_or_else(|| malformed(format!("{} overflows the head", ty)))?;
            }
        }

        Ok(values)
    }

    fn value(&mut self, at: usize, ty: &TypeDescriptor) -> AbiResult<AbiValue> {
        match ty.shape()? {
            Shape::DynamicList(element) => {
                let len = self.read_usize(at)?;
                let start = at + WORD_SIZE;
                // every element needs at least one head word
                if len > self.remaining(start) / WORD_SIZE {
                    return Err(malformed(format!("list length {} exceeds the buffer", len)));
                }
                let items = self.unit(start, std::iter::repeat(&element).take(len))?;
                Ok(AbiValue::DynamicList { element, items })
            }
            Shape::FixedList(k, element) => {
                let stride = if element.is_dynamic() {
                    WORD_SIZE
                } else {
                    element.head_words().saturating_mul(WORD_SIZE)
                };
                match k.checked_mul(stride) {
                    Some(need) if need <= self.remaining(at) => {}
                    _ => {
                        return Err(malformed(format!(
                            "{} does not fit in the buffer at {}",
                            ty, at
                        )))
                    }
                }
                let items = self.unit(at, std::iter::repeat(&element).take(k))?;
                Ok(AbiValue::FixedList { element, items })
            }
            Shape::Tuple(components) => {
                let values = self.unit(at, components.iter().map(|c| &c.ty))?;
                Ok(AbiValue::Tuple(
                    components.iter().map(|c| c.name.clone()).zip(values).collect(),
                ))
            }
            Shape::Leaf(leaf) => self.leaf(at, leaf),
        }
    }

    fn leaf(&mut self, at: usize, leaf: LeafType) -> AbiResult<AbiValue> {
        match leaf {
            LeafType::Uint(bits) => {
                let value = BigUint::from_bytes_be(self.read_word(at)?);
                if value.bits() > bits as u64 {
                    return Err(malformed(format!("{} does not fit in uint{}", value, bits)));
                }
                Ok(AbiValue::Uint { bits, value })
            }
            LeafType::Int(bits) => {
                let value = BigInt::from_signed_bytes_be(self.read_word(at)?);
                check_int_range(&value, bits)
                    .map_err(|_| malformed(format!("{} does not fit in int{}", value, bits)))?;
                Ok(AbiValue::Int { bits, value })
            }
            LeafType::Bool => {
                let word = self.read_word(at)?;
                if word[..WORD_SIZE - 1].iter().any(|b| *b != 0) || word[WORD_SIZE - 1] > 1 {
                    return Err(malformed(format!("bad bool word at {}", at)));
                }
                Ok(AbiValue::Bool(word[WORD_SIZE - 1] == 1))
            }
            LeafType::Address => {
                let word = self.read_word(at)?;
                let (padding, addr) = word.split_at(WORD_SIZE - ADDRESS_SIZE);
                if padding.iter().any(|b| *b != 0) {
                    return Err(malformed(format!("dirty address padding at {}", at)));
                }
                Address::from_slice(addr)
                    .map(AbiValue::Address)
                    .map_err(|e| malformed(e.to_string()))
            }
            LeafType::FixedBytes(size) => {
                let word = self.read_word(at)?;
                if word[size..].iter().any(|b| *b != 0) {
                    return Err(malformed(format!("dirty bytes{} padding at {}", size, at)));
                }
                Ok(AbiValue::FixedBytes { size, bytes: word[..size].to_vec() })
            }
            LeafType::Bytes => self.read_bytes(at).map(|b| AbiValue::Bytes(b.to_vec())),
            LeafType::String => {
                let bytes = self.read_bytes(at)?;
                String::from_utf8(bytes.to_vec())
                    .map(AbiValue::String)
                    .map_err(|e| malformed(format!("string at {}: {}", at, e)))
            }
        }
    }

    fn remaining(&self, at: usize) -> usize {
        self.data.len().saturating_sub(at)
    }

    fn charge(&mut self, n: usize) -> AbiResult<()> {
        self.budget = self.budget.checked_sub(n).ok_or_else(|| {
            malformed(format!(
                "aliased offsets read more than the {}-byte input",
                self.data.len()
            ))
        })?;
        Ok(())
    }

    fn read_word(&mut self, at: usize) -> AbiResult<&'a [u8]> {
        let data = self.data;
        let end = at
            .checked_add(WORD_SIZE)
            .ok_or_else(|| malformed(format!("offset {} overflows", at)))?;
        let word = data.get(at..end).ok_or_else(|| {
            malformed(format!("word at {} runs past the {}-byte buffer", at, data.len()))
        })?;
        self.charge(WORD_SIZE)?;
        Ok(word)
    }

    fn read_usize(&mut self, at: usize) -> AbiResult<usize> {
        let word = self.read_word(at)?;
        let (high, low) = word.split_at(WORD_SIZE - 8);
        if high.iter().any(|b| *b != 0) {
            return Err(malformed(format!("length or offset at {} is too large", at)));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(low);
        usize::try_from(u64::from_be_bytes(buf))
            .map_err(|_| malformed(format!("length or offset at {} is too large", at)))
    }

    fn read_bytes(&mut self, at: usize) -> AbiResult<&'a [u8]> {
        let data = self.data;
        let len = self.read_usize(at)?;
        let start = at + WORD_SIZE;
        let end = start
            .checked_add(len)
            .ok_or_else(|| malformed(format!("length {} overflows", len)))?;
        let bytes = data.get(start..end).ok_or_else(|| {
            malformed(format!("{} bytes at {} run past the {}-byte buffer", len, start, data.len()))
        })?;
        self.charge(len)?;
        Ok(bytes)
    }
}

fn malformed(msg: String) -> AbiError {
    AbiError::MalformedEncoding(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_value;
    use serde_json::json;

    fn ty(token: &str) -> TypeDescriptor {
        TypeDescriptor::parse(token).unwrap()
    }

    fn encode_json(token: &str, value: serde_json::Value) -> Vec<u8> {
        let value = build_value(&ty(token), &value).unwrap();
        encode(&[value]).unwrap()
    }

    #[test]
    fn test_uint_word() {
        let buffer = encode_json("uint256", json!("111111"));
        assert_eq!(
            hex::encode(&buffer),
            "000000000000000000000000000000000000000000000000000000000001b207"
        );
        let decoded = decode(&buffer, &[ty("uint256")]).unwrap();
        assert_eq!(decoded[0].to_json(), json!("111111"));
    }

    #[test]
    fn test_int_word() {
        let buffer = encode_json("int256", json!("-11111111111111111111111"));
        assert_eq!(
            hex::encode(&buffer),
            "fffffffffffffffffffffffffffffffffffffffffffffda5aa5b91a256638e39"
        );
        let decoded = decode(&buffer, &[ty("int256")]).unwrap();
        assert_eq!(decoded[0].to_json(), json!("-11111111111111111111111"));
    }

    #[test]
    fn test_fixed_list_inline() {
        let buffer = encode_json("int256[3]", json!(["-1", "-2", "-3"]));
        assert_eq!(buffer.len(), 3 * WORD_SIZE);
        assert_eq!(&buffer[..WORD_SIZE], &[0xff; WORD_SIZE]);
        assert_eq!(buffer[3 * WORD_SIZE - 1], 0xfd);

        let decoded = decode(&buffer, &[ty("int256[3]")]).unwrap();
        assert_eq!(decoded[0].to_json(), json!(["-1", "-2", "-3"]));
    }

    #[test]
    fn test_dynamic_list_offsets() {
        let buffer = encode_json("uint256[]", json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 0]));
        assert_eq!(buffer.len(), 12 * WORD_SIZE);
        assert_eq!(buffer[WORD_SIZE - 1], 0x20);
        assert_eq!(buffer[2 * WORD_SIZE - 1], 0x0a);
        assert_eq!(buffer[3 * WORD_SIZE - 1], 0x01);
        assert_eq!(buffer[12 * WORD_SIZE - 1], 0x00);
    }

    #[test]
    fn test_leaf_layouts() {
        let flag = encode_json("bool", json!(true));
        assert_eq!(flag[WORD_SIZE - 1], 1);
        assert!(flag[..WORD_SIZE - 1].iter().all(|b| *b == 0));

        let addr = encode_json("address", json!("0xbe5422d15f39373eb0a97ff8c10fbd0e40e29338"));
        assert!(addr[..12].iter().all(|b| *b == 0));
        assert_eq!(addr[12], 0xbe);
        let decoded = decode(&addr, &[ty("address")]).unwrap();
        assert_eq!(decoded[0].to_json(), json!("0xbe5422d15f39373eb0a97ff8c10fbd0e40e29338"));

        // bytesN is left-aligned
        let fixed = encode_json("bytes4", json!("0x01020304"));
        assert_eq!(&fixed[..4], &[1, 2, 3, 4]);
        assert!(fixed[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_string_padding() {
        let buffer = encode_json("string", json!("Hello world!"));
        assert_eq!(buffer.len(), 3 * WORD_SIZE);
        assert_eq!(buffer[WORD_SIZE - 1], 0x20);
        assert_eq!(buffer[2 * WORD_SIZE - 1], 0x0c);
        assert_eq!(&buffer[2 * WORD_SIZE..2 * WORD_SIZE + 12], b"Hello world!");

        let exact = encode_json("bytes", json!(format!("0x{}", "ab".repeat(32))));
        assert_eq!(exact.len(), 3 * WORD_SIZE);

        let empty = encode_json("string", json!(""));
        assert_eq!(empty.len(), 2 * WORD_SIZE);
    }

    #[test]
    fn test_dynamic_fixed_list_has_no_length() {
        let buffer = encode_json("string[2]", json!(["a", "b"]));
        // offset to the list, then the list's own unit: two offsets and two tails
        assert_eq!(buffer[WORD_SIZE - 1], 0x20);
        assert_eq!(buffer[2 * WORD_SIZE - 1], 0x40);
        assert_eq!(buffer[3 * WORD_SIZE - 1], 0x80);
        assert_eq!(buffer.len(), 7 * WORD_SIZE);

        let decoded = decode(&buffer, &[ty("string[2]")]).unwrap();
        assert_eq!(decoded[0].to_json(), json!(["a", "b"]));
    }

    #[test]
    fn test_uint_range_on_encode() {
        let value = AbiValue::uint(8, 256u32);
        assert!(matches!(encode(&[value]), Err(AbiError::ValueRange(_))));
        let value = AbiValue::uint(7, 1u32);
        assert!(matches!(encode(&[value]), Err(AbiError::UnsupportedType(_))));
    }

    #[test]
    fn test_truncated_input() {
        let buffer = encode_json("string", json!("Hello world!"));
        let err = decode(&buffer[..WORD_SIZE + 4], &[ty("string")]).unwrap_err();
        assert!(matches!(err, AbiError::MalformedEncoding(_)));

        assert!(decode(&[0u8; 31], &[ty("uint256")]).is_err());
    }

    #[test]
    fn test_offset_past_end() {
        let mut buffer = vec![0u8; WORD_SIZE];
        buffer[WORD_SIZE - 1] = 0x40;
        assert!(matches!(
            decode(&buffer, &[ty("bytes")]),
            Err(AbiError::MalformedEncoding(_))
        ));

        let mut huge = vec![0xffu8; WORD_SIZE];
        huge.extend_from_slice(&[0u8; WORD_SIZE]);
        assert!(matches!(
            decode(&huge, &[ty("uint256[]")]),
            Err(AbiError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_list_length_guard() {
        let mut buffer = vec![0u8; 2 * WORD_SIZE];
        buffer[WORD_SIZE - 1] = 0x20;
        buffer[2 * WORD_SIZE - 1] = 0x05;
        assert!(matches!(
            decode(&buffer, &[ty("uint256[]")]),
            Err(AbiError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_huge_fixed_extent() {
        let data = [0u8; 2 * WORD_SIZE];
        for token in ["uint256[8589934592]", "string[8589934592]", "uint8[4294967296][4294967296]"] {
            assert!(matches!(
                decode(&data, &[ty(token)]),
                Err(AbiError::MalformedEncoding(_))
            ));
        }
    }

    fn aliased_bytes_list(entries: usize, payload: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&usize_word(WORD_SIZE));
        data.extend_from_slice(&usize_word(entries));
        for _ in 0..entries {
            data.extend_from_slice(&usize_word(entries * WORD_SIZE));
        }
        data.extend_from_slice(&usize_word(payload));
        data.resize(data.len() + payload, 0xab);
        data
    }

    #[test]
    fn test_aliased_offsets_exhaust_budget() {
        let single = decode(&aliased_bytes_list(1, 256), &[ty("bytes[]")]).unwrap();
        assert_eq!(single[0].to_json()[0], json!(format!("hex://{}", "ab".repeat(256))));

        assert!(matches!(
            decode(&aliased_bytes_list(4, 256), &[ty("bytes[]")]),
            Err(AbiError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_non_canonical_words() {
        let mut flag = vec![0u8; WORD_SIZE];
        flag[WORD_SIZE - 1] = 2;
        assert!(decode(&flag, &[ty("bool")]).is_err());

        let narrow = vec![0xffu8; WORD_SIZE];
        assert!(decode(&narrow, &[ty("uint8")]).is_err());
        assert_eq!(
            decode(&narrow, &[ty("int8")]).unwrap()[0],
            AbiValue::int(8, -1)
        );

        let mut text = encode_json("string", json!("ab"));
        text[2 * WORD_SIZE] = 0xff;
        assert!(matches!(
            decode(&text, &[ty("string")]),
            Err(AbiError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_solidity_codec_trait() {
        let codec: &dyn TypeCodec = &SolidityCodec;
        let fields = vec![NamedField::new("x", ty("uint256"))];
        let bytes = codec.serialize(&[AbiValue::uint(256, 7u32)]).unwrap();
        let values = codec.deserialize(&bytes, &fields).unwrap();
        assert_eq!(values, vec![AbiValue::uint(256, 7u32)]);
        assert_eq!(codec.name(), "solidity");
    }
}
