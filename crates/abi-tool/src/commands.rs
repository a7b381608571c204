// abi-tool/src/commands.rs
use contract_abi::{AbiDefinitionFactory, ContractAbiCodec};

/// How a call is resolved against the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Name(String),
    MethodId(String),
    Signature(String),
}

/// How an event is resolved against the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    Name(String),
    Topic(String),
}

pub fn parse_hex(input: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    Ok(hex::decode(body)?)
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn require_abi(abi: Option<&str>) -> anyhow::Result<&str> {
    abi.ok_or_else(|| anyhow::anyhow!("--abi is required unless --signature is given"))
}

pub fn selector(codec: &ContractAbiCodec, signature: &str) -> anyhow::Result<String> {
    let method = AbiDefinitionFactory::new().build_method_by_signature(signature)?;
    Ok(to_hex(&method.selector(codec.hash_algorithm())))
}

/// One line per method (`selector signature`) and event (`topic signature`)
pub fn list_signatures(codec: &ContractAbiCodec, abi: &str) -> anyhow::Result<String> {
    let catalog = AbiDefinitionFactory::new().build_abi(abi)?;
    let hash = codec.hash_algorithm();

    let mut lines = Vec::new();
    for method in catalog.methods() {
        lines.push(format!("{} {}", to_hex(&method.selector(hash)), method));
    }
    for event in catalog.events() {
        lines.push(format!("0x{} {}", event.topic(hash).to_hex(), event));
    }
    Ok(lines.join("\n"))
}

pub fn encode(
    codec: &ContractAbiCodec,
    abi: Option<&str>,
    target: &CallTarget,
    params: &str,
) -> anyhow::Result<String> {
    let bytes = match target {
        CallTarget::Name(name) => codec.encode_method(require_abi(abi)?, name, params)?,
        CallTarget::MethodId(id) => codec.encode_method_by_method_id(require_abi(abi)?, id, params)?,
        CallTarget::Signature(sig) => codec.encode_method_by_signature(sig, params)?,
    };
    Ok(to_hex(&bytes))
}

pub fn encode_constructor(
    codec: &ContractAbiCodec,
    abi: &str,
    code: &str,
    params: &str,
) -> anyhow::Result<String> {
    let code = parse_hex(code)?;
    Ok(to_hex(&codec.encode_constructor(abi, &code, params)?))
}

pub fn decode_input(
    codec: &ContractAbiCodec,
    abi: Option<&str>,
    target: &CallTarget,
    data: &str,
) -> anyhow::Result<String> {
    let data = parse_hex(data)?;
    let decoded = match target {
        CallTarget::Name(name) => codec.decode_method_input(require_abi(abi)?, name, &data)?,
        CallTarget::MethodId(id) => codec.decode_method_input_by_method_id(require_abi(abi)?, id, &data)?,
        CallTarget::Signature(sig) => codec.decode_method_input_by_signature(sig, &data)?,
    };
    Ok(decoded)
}

pub fn decode_output(codec: &ContractAbiCodec, abi: &str, method: &str, data: &str) -> anyhow::Result<String> {
    let data = parse_hex(data)?;
    Ok(codec.decode_method_output(abi, method, &data)?)
}

pub fn decode_event(
    codec: &ContractAbiCodec,
    abi: &str,
    target: &EventTarget,
    data: &str,
) -> anyhow::Result<String> {
    let data = parse_hex(data)?;
    let decoded = match target {
        EventTarget::Name(name) => codec.decode_event(abi, name, &data)?,
        EventTarget::Topic(topic) => codec.decode_event_by_topic(abi, topic, &data)?,
    };
    Ok(decoded)
}
