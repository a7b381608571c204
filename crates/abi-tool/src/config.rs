// abi-tool/src/config.rs
use blockchain_crypto::HashAlgorithm;
use contract_abi::{ContractAbiCodec, VmMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Digest used for selectors and event topics
    pub hash_algorithm: HashAlgorithm,
    pub vm_mode: VmMode,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Keccak256,
            vm_mode: VmMode::Evm,
            log_level: "info".into(),
        }
    }
}

impl ToolConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn codec(&self) -> ContractAbiCodec {
        ContractAbiCodec::new(self.hash_algorithm, self.vm_mode)
    }
}
