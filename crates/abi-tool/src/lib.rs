// abi-tool/src/lib.rs
pub mod commands;
pub mod config;

pub use config::ToolConfig;
