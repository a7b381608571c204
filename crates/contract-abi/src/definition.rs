// contract-abi/src/definition.rs

use crate::selector::{Selector, SelectorCache};
use crate::types::TypeDescriptor;
use blockchain_crypto::{Hash, HashAlgorithm, Hashable};
use std::fmt;

/// A named, typed parameter slot. Position in the owning `Vec` is wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedField {
    pub name: String,
    pub ty: TypeDescriptor,
    /// Only meaningful for event inputs
    pub indexed: bool,
}

impl NamedField {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
        }
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }
}

/// Kind of a schema entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Constructor,
    Function,
    Event,
    Fallback,
    Receive,
}

impl MethodKind {
    /// Returns `None` for entry types this catalog does not know
    pub fn from_schema(kind: &str) -> Option<Self> {
        match kind {
            "constructor" => Some(MethodKind::Constructor),
            "function" => Some(MethodKind::Function),
            "event" => Some(MethodKind::Event),
            "fallback" => Some(MethodKind::Fallback),
            "receive" => Some(MethodKind::Receive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Constructor => "constructor",
            MethodKind::Function => "function",
            MethodKind::Event => "event",
            MethodKind::Fallback => "fallback",
            MethodKind::Receive => "receive",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One function, constructor, event, fallback or receive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub kind: MethodKind,
    pub constant: bool,
    pub payable: bool,
    pub anonymous: bool,
    pub state_mutability: String,
    pub inputs: Vec<NamedField>,
    pub outputs: Vec<NamedField>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            constant: false,
            payable: false,
            anonymous: false,
            state_mutability: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn is_constant(&self) -> bool {
        self.constant || self.state_mutability == "view"
    }

    pub fn is_payable(&self) -> bool {
        self.payable || self.state_mutability == "payable"
    }

    pub fn is_event(&self) -> bool {
        self.kind == MethodKind::Event
    }

    /// `name(t1,t2,...)` with tuples expanded; parameter names never appear
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|f| f.ty.canonical()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First four bytes of the signature hash, served from the process-wide cache
    pub fn selector(&self, algorithm: HashAlgorithm) -> Selector {
        SelectorCache::global().selector(&self.signature(), algorithm)
    }

    /// Selector as lowercase hex without prefix
    pub fn method_id(&self, algorithm: HashAlgorithm) -> String {
        hex::encode(self.selector(algorithm))
    }

    /// Full-width signature hash used as an event's first topic
    pub fn topic(&self, algorithm: HashAlgorithm) -> Hash {
        self.signature().as_str().hash_with(algorithm)
    }

    /// Event inputs carried in the log data rather than in topics
    pub fn non_indexed_inputs(&self) -> Vec<NamedField> {
        self.inputs.iter().filter(|f| !f.indexed).cloned().collect()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.signature())
    }
}
