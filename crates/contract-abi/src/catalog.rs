// contract-abi/src/catalog.rs

use crate::definition::{MethodDescriptor, MethodKind};
use crate::selector::Selector;
use crate::{AbiError, AbiResult};
use blockchain_crypto::{Hash, HashAlgorithm};
use std::collections::BTreeMap;

/// Read-only index of one contract's methods and events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceCatalog {
    methods: BTreeMap<String, Vec<MethodDescriptor>>,
    events: BTreeMap<String, Vec<MethodDescriptor>>,
}

impl InterfaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, constructor, fallback or receive entry under `key`
    pub fn add_method(&mut self, key: impl Into<String>, method: MethodDescriptor) -> AbiResult<()> {
        insert_overload(&mut self.methods, key.into(), method)
    }

    pub fn add_event(&mut self, event: MethodDescriptor) -> AbiResult<()> {
        insert_overload(&mut self.events, event.name.clone(), event)
    }

    /// All overloads registered under `name`
    pub fn get_method(&self, name: &str, allow_overload: bool) -> AbiResult<&[MethodDescriptor]> {
        let overloads = self
            .methods
            .get(name)
            .ok_or_else(|| AbiError::UnknownMethod(name.to_string()))?;
        if overloads.len() > 1 && !allow_overload {
            return Err(AbiError::AmbiguousMethod(name.to_string()));
        }
        Ok(overloads)
    }

    pub fn get_method_by_selector(
        &self,
        selector: &Selector,
        algorithm: HashAlgorithm,
    ) -> AbiResult<&MethodDescriptor> {
        self.methods
            .values()
            .flatten()
            .find(|m| &m.selector(algorithm) == selector)
            .ok_or_else(|| AbiError::UnknownMethod(format!("selector 0x{}", hex::encode(selector))))
    }

    /// Lookup by hex method id, `0x` prefix optional
    pub fn get_method_by_method_id(
        &self,
        method_id: &str,
        algorithm: HashAlgorithm,
    ) -> AbiResult<&MethodDescriptor> {
        let selector = parse_selector(method_id)?;
        self.get_method_by_selector(&selector, algorithm)
    }

    pub fn get_event(&self, name: &str, allow_overload: bool) -> AbiResult<&[MethodDescriptor]> {
        let overloads = self
            .events
            .get(name)
            .ok_or_else(|| AbiError::UnknownEvent(name.to_string()))?;
        if overloads.len() > 1 && !allow_overload {
            return Err(AbiError::AmbiguousMethod(name.to_string()));
        }
        Ok(overloads)
    }

    /// Lookup by full 32-byte topic hex, `0x` prefix optional
    pub fn get_event_by_topic(&self, topic: &str, algorithm: HashAlgorithm) -> AbiResult<&MethodDescriptor> {
        let wanted = Hash::from_hex(topic.trim())
            .map_err(|e| AbiError::UnknownEvent(format!("topic {}: {}", topic, e)))?;
        self.events
            .values()
            .flatten()
            .find(|e| e.topic(algorithm) == wanted)
            .ok_or_else(|| AbiError::UnknownEvent(format!("topic {}", topic)))
    }

    pub fn constructor(&self) -> Option<&MethodDescriptor> {
        self.methods
            .get(MethodKind::Constructor.as_str())
            .and_then(|v| v.iter().find(|m| m.kind == MethodKind::Constructor))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values().flatten()
    }

    pub fn events(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.events.values().flatten()
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.events.is_empty()
    }
}

fn insert_overload(
    table: &mut BTreeMap<String, Vec<MethodDescriptor>>,
    key: String,
    method: MethodDescriptor,
) -> AbiResult<()> {
    let overloads = table.entry(key).or_default();
    let signature = method.signature();
    if overloads.iter().any(|m| m.signature() == signature) {
        return Err(AbiError::SchemaParse(format!("duplicate entry {}", signature)));
    }
    overloads.push(method);
    Ok(())
}

fn parse_selector(method_id: &str) -> AbiResult<Selector> {
    let trimmed = method_id.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(body)
        .map_err(|e| AbiError::UnknownMethod(format!("method id {}: {}", method_id, e)))?;
    let selector: Selector = bytes
        .as_slice()
        .try_into()
        .map_err(|_| AbiError::UnknownMethod(format!("method id {} is not 4 bytes", method_id)))?;
    Ok(selector)
}
