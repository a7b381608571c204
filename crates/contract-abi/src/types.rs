// contract-abi/src/types.rs

//! Declared ABI types
//!
//! A [`TypeDescriptor`] is parsed once from a token such as `uint256[2][]`.
//! Extents are kept in source order; the rightmost extent is the outermost
//! array dimension and is peeled first when a value is built or decoded.

use crate::definition::NamedField;
use crate::{AbiError, AbiResult};
use std::fmt;

/// Extent value marking a dynamic (`[]`) dimension
pub const DYNAMIC_EXTENT: usize = 0;

/// Scalar types accepted at the leaves of a type tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafType {
    Uint(usize),
    Int(usize),
    Bool,
    Address,
    FixedBytes(usize),
    Bytes,
    String,
}

impl LeafType {
    /// Validate a base type name and its width
    pub fn parse(base: &str) -> AbiResult<Self> {
        match base {
            "bool" => return Ok(LeafType::Bool),
            "address" => return Ok(LeafType::Address),
            "string" => return Ok(LeafType::String),
            "bytes" => return Ok(LeafType::Bytes),
            _ => {}
        }

        if let Some(width) = base.strip_prefix("uint") {
            return parse_int_width(width, base).map(LeafType::Uint);
        }
        if let Some(width) = base.strip_prefix("int") {
            return parse_int_width(width, base).map(LeafType::Int);
        }
        if let Some(width) = base.strip_prefix("bytes") {
            let size = parse_digits(width, base)?;
            if size == 0 || size > 32 {
                return Err(AbiError::UnsupportedType(format!(
                    "{}: fixed bytes width must be within [1, 32]",
                    base
                )));
            }
            return Ok(LeafType::FixedBytes(size));
        }

        Err(AbiError::UnsupportedType(base.to_string()))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, LeafType::Bytes | LeafType::String)
    }

    /// Name used in canonical signatures (`uint` becomes `uint256`)
    pub fn canonical(&self) -> String {
        match self {
            LeafType::Uint(bits) => format!("uint{}", bits),
            LeafType::Int(bits) => format!("int{}", bits),
            LeafType::Bool => "bool".into(),
            LeafType::Address => "address".into(),
            LeafType::FixedBytes(size) => format!("bytes{}", size),
            LeafType::Bytes => "bytes".into(),
            LeafType::String => "string".into(),
        }
    }
}

fn parse_digits(digits: &str, token: &str) -> AbiResult<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AbiError::UnsupportedType(token.to_string()));
    }
    digits
        .parse::<usize>()
        .map_err(|_| AbiError::UnsupportedType(token.to_string()))
}

fn parse_int_width(digits: &str, token: &str) -> AbiResult<usize> {
    if digits.is_empty() {
        return Ok(256);
    }
    let bits = parse_digits(digits, token)?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::UnsupportedType(format!(
            "{}: integer width must be a multiple of 8 within [8, 256]",
            token
        )));
    }
    Ok(bits)
}

/// One-step classification of a descriptor, consumed by the value builder
/// and the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape<'a> {
    DynamicList(TypeDescriptor),
    FixedList(usize, TypeDescriptor),
    Tuple(&'a [NamedField]),
    Leaf(LeafType),
}

/// A parsed type token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    raw: String,
    base: String,
    extents: Vec<usize>,
    components: Vec<NamedField>,
}

impl TypeDescriptor {
    /// Parse a declared type token like `string[][1][2][3]` or `tuple[]`
    pub fn parse(token: &str) -> AbiResult<Self> {
        let raw = token.trim();
        if raw.is_empty() {
            return Err(AbiError::UnsupportedType("empty type token".into()));
        }

        let (base, mut rest) = match raw.find('[') {
            Some(i) => (&raw[..i], &raw[i..]),
            None => (raw, ""),
        };
        let base = base.trim();
        if base.is_empty() {
            return Err(AbiError::UnsupportedType(raw.to_string()));
        }

        let mut extents = Vec::new();
        while !rest.is_empty() {
            let body = rest
                .strip_prefix('[')
                .ok_or_else(|| AbiError::UnsupportedType(raw.to_string()))?;
            let close = body
                .find(']')
                .ok_or_else(|| AbiError::UnsupportedType(raw.to_string()))?;
            let dim = body[..close].trim();
            if dim.is_empty() {
                extents.push(DYNAMIC_EXTENT);
            } else {
                let k = parse_digits(dim, raw)?;
                if k == 0 {
                    return Err(AbiError::UnsupportedType(format!(
                        "{}: fixed dimension must be positive",
                        raw
                    )));
                }
                extents.push(k);
            }
            rest = &body[close + 1..];
        }

        Ok(Self {
            raw: raw.to_string(),
            base: base.to_string(),
            extents,
            components: Vec::new(),
        })
    }

    /// Attach tuple components read from the schema
    pub fn with_components(mut self, components: Vec<NamedField>) -> Self {
        self.components = components;
        self
    }

    pub fn raw_type(&self) -> &str {
        &self.raw
    }

    pub fn base_type(&self) -> &str {
        &self.base
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn components(&self) -> &[NamedField] {
        &self.components
    }

    pub fn extents_size(&self) -> usize {
        self.extents.len()
    }

    /// 1-based extent lookup; `extent(extents_size())` is the outermost
    pub fn extent(&self, index: usize) -> Option<usize> {
        index.checked_sub(1).and_then(|i| self.extents.get(i).copied())
    }

    pub fn is_list(&self) -> bool {
        !self.extents.is_empty()
    }

    pub fn is_fixed_list(&self) -> bool {
        matches!(self.extents.last(), Some(k) if *k != DYNAMIC_EXTENT)
    }

    pub fn is_dynamic_list(&self) -> bool {
        self.extents.last() == Some(&DYNAMIC_EXTENT)
    }

    pub fn is_tuple(&self) -> bool {
        self.base.contains("tuple")
    }

    /// Drop the outermost dimension, returning it
    pub fn remove_extent(&mut self) -> Option<usize> {
        let removed = self.extents.pop();
        if removed.is_some() {
            self.raw = self.render_raw();
        }
        removed
    }

    /// Descriptor of one element of the outermost dimension
    pub fn element_type(&self) -> TypeDescriptor {
        let mut element = self.clone();
        element.remove_extent();
        element
    }

    fn render_raw(&self) -> String {
        let mut out = self.base.clone();
        push_extents(&mut out, &self.extents);
        out
    }

    /// Rendering used in canonical signatures: tuples become `(c1,c2)`
    pub fn canonical(&self) -> String {
        let mut out = if self.is_tuple() {
            let inner: Vec<String> = self.components.iter().map(|c| c.ty.canonical()).collect();
            format!("({})", inner.join(","))
        } else {
            LeafType::parse(&self.base)
                .map(|leaf| leaf.canonical())
                .unwrap_or_else(|_| self.base.clone())
        };
        push_extents(&mut out, &self.extents);
        out
    }

    /// Type-level dynamic classification
    pub fn is_dynamic(&self) -> bool {
        if self.extents.contains(&DYNAMIC_EXTENT) {
            return true;
        }
        if self.is_tuple() {
            return self.components.iter().any(|c| c.ty.is_dynamic());
        }
        self.base == "string" || self.base == "bytes"
    }

    /// Number of 32-byte words this type occupies in its parent's head
    pub fn head_words(&self) -> usize {
        if self.is_dynamic() {
            return 1;
        }
        let unit = if self.is_tuple() {
            self.components.iter().map(|c| c.ty.head_words()).sum()
        } else {
            1
        };
        self.extents.iter().fold(unit, |acc, k| acc.saturating_mul(*k))
    }

    /// Peel one level off the type tree
    pub fn shape(&self) -> AbiResult<Shape<'_>> {
        match self.extents.last() {
            Some(&DYNAMIC_EXTENT) => Ok(Shape::DynamicList(self.element_type())),
            Some(&k) => Ok(Shape::FixedList(k, self.element_type())),
            None if self.is_tuple() => {
                if self.components.is_empty() {
                    return Err(AbiError::UnsupportedType(format!(
                        "{}: tuple without components",
                        self.raw
                    )));
                }
                Ok(Shape::Tuple(&self.components))
            }
            None => LeafType::parse(&self.base).map(Shape::Leaf),
        }
    }
}

fn push_extents(out: &mut String, extents: &[usize]) {
    for k in extents {
        if *k == DYNAMIC_EXTENT {
            out.push_str("[]");
        } else {
            out.push_str(&format!("[{}]", k));
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, ty: &str) -> NamedField {
        NamedField::new(name, TypeDescriptor::parse(ty).unwrap())
    }

    #[test]
    fn test_extent_reduction() {
        let mut ty = TypeDescriptor::parse("string[][1][2][3]").unwrap();
        assert_eq!(ty.extents(), &[0, 1, 2, 3]);
        assert_eq!(ty.extents_size(), 4);
        assert_eq!(ty.extent(4), Some(3));
        assert!(ty.is_fixed_list());
        assert!(!ty.is_dynamic_list());

        assert_eq!(ty.remove_extent(), Some(3));
        assert_eq!(ty.extents(), &[0, 1, 2]);
        ty.remove_extent();
        assert_eq!(ty.extents(), &[0, 1]);
        ty.remove_extent();
        assert_eq!(ty.extents(), &[0]);
        assert!(ty.is_dynamic_list());
        ty.remove_extent();
        assert!(ty.extents().is_empty());
        assert_eq!(ty.raw_type(), "string");
        assert_eq!(ty.shape().unwrap(), Shape::Leaf(LeafType::String));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(TypeDescriptor::parse(""), Err(AbiError::UnsupportedType(_))));
        assert!(TypeDescriptor::parse("uint256[x]").is_err());
        assert!(TypeDescriptor::parse("uint256[2").is_err());
        assert!(TypeDescriptor::parse("uint256[2]x").is_err());
        assert!(TypeDescriptor::parse("[2]").is_err());
        assert!(TypeDescriptor::parse("uint8[0]").is_err());
        assert!(TypeDescriptor::parse(" bool[ 3 ] ").is_ok());
    }

    #[test]
    fn test_leaf_widths() {
        assert_eq!(LeafType::parse("uint").unwrap(), LeafType::Uint(256));
        assert_eq!(LeafType::parse("int8").unwrap(), LeafType::Int(8));
        assert_eq!(LeafType::parse("bytes32").unwrap(), LeafType::FixedBytes(32));
        assert!(LeafType::parse("bytes33").is_err());
        assert!(LeafType::parse("bytes0").is_err());
        assert!(LeafType::parse("uint7").is_err());
        assert!(LeafType::parse("int255").is_err());
        assert!(LeafType::parse("uint264").is_err());
        assert!(LeafType::parse("fixed128x18").is_err());
    }

    #[test]
    fn test_canonical_tuple() {
        let account = TypeDescriptor::parse("tuple")
            .unwrap()
            .with_components(vec![field("accountAddr", "address"), field("points", "int")]);
        let person = TypeDescriptor::parse("tuple[]").unwrap().with_components(vec![
            field("name", "string"),
            field("age", "uint256"),
            NamedField::new("account", account),
        ]);
        assert_eq!(person.canonical(), "(string,uint256,(address,int256))[]");
        assert!(person.is_dynamic());
        assert!(person.is_dynamic_list());
        assert!(person.is_tuple());
    }

    #[test]
    fn test_dynamic_classification() {
        assert!(!TypeDescriptor::parse("uint256[3]").unwrap().is_dynamic());
        assert!(TypeDescriptor::parse("string[3]").unwrap().is_dynamic());
        assert!(TypeDescriptor::parse("uint8[][2]").unwrap().is_dynamic());
        assert!(TypeDescriptor::parse("bytes").unwrap().is_dynamic());
        assert!(!TypeDescriptor::parse("bytes32").unwrap().is_dynamic());

        let item = TypeDescriptor::parse("tuple[2]")
            .unwrap()
            .with_components(vec![field("a", "int256"), field("b", "bool"), field("c", "address")]);
        assert!(!item.is_dynamic());
        assert_eq!(item.head_words(), 6);
        assert_eq!(TypeDescriptor::parse("uint256[2][3]").unwrap().head_words(), 6);
        assert_eq!(TypeDescriptor::parse("string[2]").unwrap().head_words(), 1);
    }

    #[test]
    fn test_empty_tuple_shape() {
        let ty = TypeDescriptor::parse("tuple").unwrap();
        assert!(matches!(ty.shape(), Err(AbiError::UnsupportedType(_))));
    }
}
