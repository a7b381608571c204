// contract-abi/src/facade.rs

//! Entry points taking schema text, JSON params and payload bytes
//!
//! Schema-taking operations build a fresh catalog per call. Callers encoding
//! many calls against one contract should build the catalog once with
//! [`AbiDefinitionFactory`] and use the `*_with` variants.

use crate::builder::build_params;
use crate::catalog::InterfaceCatalog;
use crate::codec::{SolidityCodec, TypeCodec};
use crate::definition::{MethodDescriptor, NamedField};
use crate::factory::AbiDefinitionFactory;
use crate::selector::Selector;
use crate::value::values_to_json;
use crate::{AbiError, AbiResult};
use blockchain_crypto::HashAlgorithm;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Execution target the payload is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmMode {
    #[default]
    Evm,
    Wasm,
}

impl fmt::Display for VmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmMode::Evm => f.write_str("evm"),
            VmMode::Wasm => f.write_str("wasm"),
        }
    }
}

/// Encodes calls and decodes results for one hash algorithm and VM target
#[derive(Clone)]
pub struct ContractAbiCodec {
    hash: HashAlgorithm,
    vm_mode: VmMode,
    factory: AbiDefinitionFactory,
    evm_codec: SolidityCodec,
    wasm_codec: Option<Arc<dyn TypeCodec>>,
}

impl fmt::Debug for ContractAbiCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractAbiCodec")
            .field("hash", &self.hash)
            .field("vm_mode", &self.vm_mode)
            .field("wasm_codec", &self.wasm_codec.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl Default for ContractAbiCodec {
    fn default() -> Self {
        Self::new(HashAlgorithm::default(), VmMode::default())
    }
}

impl ContractAbiCodec {
    pub fn new(hash: HashAlgorithm, vm_mode: VmMode) -> Self {
        Self {
            hash,
            vm_mode,
            factory: AbiDefinitionFactory::new(),
            evm_codec: SolidityCodec,
            wasm_codec: None,
        }
    }

    /// Register the wire format used in [`VmMode::Wasm`]
    pub fn with_wasm_codec(mut self, codec: Arc<dyn TypeCodec>) -> Self {
        self.wasm_codec = Some(codec);
        self
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn vm_mode(&self) -> VmMode {
        self.vm_mode
    }

    fn codec(&self) -> AbiResult<&dyn TypeCodec> {
        match self.vm_mode {
            VmMode::Evm => Ok(&self.evm_codec),
            VmMode::Wasm => self
                .wasm_codec
                .as_deref()
                .ok_or_else(|| AbiError::CodecUnavailable(self.vm_mode.to_string())),
        }
    }

    fn catalog(&self, abi: &str) -> AbiResult<InterfaceCatalog> {
        self.factory.build_abi(abi)
    }

    pub fn selector(&self, method: &MethodDescriptor) -> Selector {
        method.selector(self.hash)
    }

    fn encode_fields(&self, fields: &[NamedField], params: &str) -> AbiResult<Vec<u8>> {
        let params = parse_params(params)?;
        let values = build_params(fields, &params)?;
        self.codec()?.serialize(&values)
    }

    fn decode_fields(&self, fields: &[NamedField], data: &[u8]) -> AbiResult<String> {
        let values = self.codec()?.deserialize(data, fields)?;
        Ok(values_to_json(&values).to_string())
    }

    /// Deploy code followed by the encoded constructor arguments
    pub fn encode_constructor(&self, abi: &str, deploy_code: &[u8], params: &str) -> AbiResult<Vec<u8>> {
        let catalog = self.catalog(abi)?;
        let inputs = catalog.constructor().map(|c| c.inputs.as_slice()).unwrap_or_default();
        let encoded = self.encode_fields(inputs, params)?;

        let mut out = Vec::with_capacity(deploy_code.len() + encoded.len());
        out.extend_from_slice(deploy_code);
        out.extend_from_slice(&encoded);
        Ok(out)
    }

    pub fn encode_method(&self, abi: &str, name: &str, params: &str) -> AbiResult<Vec<u8>> {
        let catalog = self.catalog(abi)?;
        let method = &catalog.get_method(name, false)?[0];
        self.encode_method_with(method, params)
    }

    pub fn encode_method_by_method_id(&self, abi: &str, method_id: &str, params: &str) -> AbiResult<Vec<u8>> {
        let catalog = self.catalog(abi)?;
        let method = catalog.get_method_by_method_id(method_id, self.hash)?;
        self.encode_method_with(method, params)
    }

    pub fn encode_method_by_signature(&self, signature: &str, params: &str) -> AbiResult<Vec<u8>> {
        let method = self.factory.build_method_by_signature(signature)?;
        self.encode_method_with(&method, params)
    }

    /// Selector followed by the encoded inputs
    pub fn encode_method_with(&self, method: &MethodDescriptor, params: &str) -> AbiResult<Vec<u8>> {
        let selector = self.selector(method);
        debug!(signature = %method.signature(), selector = %hex::encode(selector), "encoding call");

        let encoded = self.encode_fields(&method.inputs, params)?;
        let mut out = Vec::with_capacity(selector.len() + encoded.len());
        out.extend_from_slice(&selector);
        out.extend_from_slice(&encoded);
        Ok(out)
    }

    pub fn decode_method_input(&self, abi: &str, name: &str, data: &[u8]) -> AbiResult<String> {
        let catalog = self.catalog(abi)?;
        let method = &catalog.get_method(name, false)?[0];
        self.decode_method_input_with(method, data)
    }

    pub fn decode_method_input_by_method_id(&self, abi: &str, method_id: &str, data: &[u8]) -> AbiResult<String> {
        let catalog = self.catalog(abi)?;
        let method = catalog.get_method_by_method_id(method_id, self.hash)?;
        self.decode_method_input_with(method, data)
    }

    pub fn decode_method_input_by_signature(&self, signature: &str, data: &[u8]) -> AbiResult<String> {
        let method = self.factory.build_method_by_signature(signature)?;
        self.decode_method_input_with(&method, data)
    }

    /// Decode call data; the leading selector must belong to `method`
    pub fn decode_method_input_with(&self, method: &MethodDescriptor, data: &[u8]) -> AbiResult<String> {
        let selector = self.selector(method);
        if data.len() < selector.len() {
            return Err(AbiError::MalformedEncoding(format!(
                "call data of {} bytes has no selector",
                data.len()
            )));
        }
        let (prefix, body) = data.split_at(selector.len());
        if prefix != selector.as_slice() {
            return Err(AbiError::MalformedEncoding(format!(
                "selector 0x{} does not match {} (0x{})",
                hex::encode(prefix),
                method.signature(),
                hex::encode(selector)
            )));
        }
        self.decode_fields(&method.inputs, body)
    }

    pub fn decode_method_output(&self, abi: &str, name: &str, data: &[u8]) -> AbiResult<String> {
        let catalog = self.catalog(abi)?;
        let method = &catalog.get_method(name, false)?[0];
        self.decode_method_output_with(method, data)
    }

    pub fn decode_method_output_with(&self, method: &MethodDescriptor, data: &[u8]) -> AbiResult<String> {
        self.decode_fields(&method.outputs, data)
    }

    /// Decode the non-indexed inputs carried in an event's log data
    pub fn decode_event(&self, abi: &str, name: &str, data: &[u8]) -> AbiResult<String> {
        let catalog = self.catalog(abi)?;
        let event = &catalog.get_event(name, false)?[0];
        self.decode_event_with(event, data)
    }

    pub fn decode_event_by_topic(&self, abi: &str, topic: &str, data: &[u8]) -> AbiResult<String> {
        let catalog = self.catalog(abi)?;
        let event = catalog.get_event_by_topic(topic, self.hash)?;
        self.decode_event_with(event, data)
    }

    pub fn decode_event_with(&self, event: &MethodDescriptor, data: &[u8]) -> AbiResult<String> {
        self.decode_fields(&event.non_indexed_inputs(), data)
    }
}

fn parse_params(params: &str) -> AbiResult<Value> {
    if params.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(serde_json::from_str(params)?)
}
