// contract-abi/src/factory.rs

use crate::catalog::InterfaceCatalog;
use crate::definition::{MethodDescriptor, MethodKind, NamedField};
use crate::types::TypeDescriptor;
use crate::{AbiError, AbiResult};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Builds catalogs and descriptors from JSON schemas or signature strings
#[derive(Debug, Default, Clone, Copy)]
pub struct AbiDefinitionFactory;

impl AbiDefinitionFactory {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON interface description into a catalog
    pub fn build_abi(&self, abi: &str) -> AbiResult<InterfaceCatalog> {
        let root = parse_schema(abi)?;
        self.build_abi_value(&root)
    }

    pub fn build_abi_value(&self, root: &Value) -> AbiResult<InterfaceCatalog> {
        let entries = root
            .as_array()
            .ok_or_else(|| AbiError::SchemaParse("interface description must be a JSON array".into()))?;

        let mut catalog = InterfaceCatalog::new();
        for entry in entries {
            let kind_name = entry_kind(entry)?;
            let Some(kind) = MethodKind::from_schema(kind_name) else {
                warn!(kind = kind_name, "skipping unrecognized schema entry");
                continue;
            };

            let method = self.build_method_value(entry)?;
            trace!(signature = %method.signature(), kind = %kind, "schema entry");
            match kind {
                MethodKind::Event => catalog.add_event(method)?,
                MethodKind::Function => {
                    let key = method.name.clone();
                    catalog.add_method(key, method)?
                }
                MethodKind::Constructor | MethodKind::Fallback | MethodKind::Receive => {
                    catalog.add_method(kind.as_str(), method)?
                }
            }
        }

        debug!(
            methods = catalog.methods().count(),
            events = catalog.events().count(),
            "interface catalog built"
        );
        Ok(catalog)
    }

    /// Every non-event entry named `name`; `"constructor"` selects constructors
    pub fn build_methods(&self, abi: &str, name: &str) -> AbiResult<Vec<MethodDescriptor>> {
        let root = parse_schema(abi)?;
        let entries = root
            .as_array()
            .ok_or_else(|| AbiError::SchemaParse("interface description must be a JSON array".into()))?;

        let mut methods = Vec::new();
        for entry in entries {
            let kind = MethodKind::from_schema(entry_kind(entry)?);
            let matches = match kind {
                Some(MethodKind::Constructor) => name == MethodKind::Constructor.as_str(),
                Some(MethodKind::Function) => entry.get("name").and_then(Value::as_str) == Some(name),
                _ => false,
            };
            if matches {
                methods.push(self.build_method_value(entry)?);
            }
        }
        Ok(methods)
    }

    /// Build one descriptor from a schema entry
    pub fn build_method_value(&self, entry: &Value) -> AbiResult<MethodDescriptor> {
        let kind_name = entry_kind(entry)?;
        let kind = MethodKind::from_schema(kind_name)
            .ok_or_else(|| AbiError::SchemaParse(format!("unrecognized entry type '{}'", kind_name)))?;

        let name = match kind {
            MethodKind::Function | MethodKind::Event => entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            other => other.as_str().to_string(),
        };

        let mut method = MethodDescriptor::new(name, kind);
        method.constant = flag(entry, "constant");
        method.payable = flag(entry, "payable");
        method.anonymous = flag(entry, "anonymous");
        method.state_mutability = entry
            .get("stateMutability")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        method.inputs = build_fields(entry.get("inputs"))?;
        method.outputs = build_fields(entry.get("outputs"))?;
        Ok(method)
    }

    /// Parse `name(t1, t2, ...)`. Tuple parameters cannot be expressed this way.
    pub fn build_method_by_signature(&self, signature: &str) -> AbiResult<MethodDescriptor> {
        let sig = signature.trim();
        let open = sig
            .find('(')
            .ok_or_else(|| AbiError::SchemaParse(format!("'{}' has no parameter list", signature)))?;
        if !sig.ends_with(')') {
            return Err(AbiError::SchemaParse(format!("'{}' must end with ')'", signature)));
        }
        let close = sig.len() - 1;
        if close < open {
            return Err(AbiError::SchemaParse(format!("'{}' is malformed", signature)));
        }

        let name = sig[..open].trim();
        if name.is_empty() {
            return Err(AbiError::SchemaParse(format!("'{}' has no method name", signature)));
        }

        let body = &sig[open + 1..close];
        if body.contains('(') || body.contains(')') || body.contains("tuple") {
            return Err(AbiError::TupleTypeUnsupported(signature.to_string()));
        }

        let mut method = MethodDescriptor::new(name, MethodKind::Function);
        if !body.trim().is_empty() {
            method.inputs = body
                .split(',')
                .map(|token| TypeDescriptor::parse(token).map(|ty| NamedField::new("", ty)))
                .collect::<AbiResult<Vec<_>>>()?;
        }
        Ok(method)
    }
}

fn parse_schema(abi: &str) -> AbiResult<Value> {
    serde_json::from_str(abi).map_err(|e| AbiError::SchemaParse(e.to_string()))
}

fn entry_kind(entry: &Value) -> AbiResult<&str> {
    entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AbiError::SchemaParse(format!("entry without a type: {}", entry)))
}

fn flag(entry: &Value, key: &str) -> bool {
    entry.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn build_fields(fields: Option<&Value>) -> AbiResult<Vec<NamedField>> {
    let Some(fields) = fields else {
        return Ok(Vec::new());
    };
    let fields = fields
        .as_array()
        .ok_or_else(|| AbiError::SchemaParse(format!("expected a field array, got {}", fields)))?;
    fields.iter().map(build_field).collect()
}

fn build_field(field: &Value) -> AbiResult<NamedField> {
    let token = field
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AbiError::SchemaParse(format!("field without a type: {}", field)))?;
    let name = field.get("name").and_then(Value::as_str).unwrap_or_default();

    let mut ty = TypeDescriptor::parse(token)?;
    if field.get("components").is_some() {
        ty = ty.with_components(build_fields(field.get("components"))?);
    }

    Ok(NamedField::new(name, ty).indexed(flag(field, "indexed")))
}
