// abi-tool/src/main.rs
use abi_tool::commands::{self, CallTarget, EventTarget};
use abi_tool::ToolConfig;
use blockchain_crypto::HashAlgorithm;
use clap::{Args, Parser, Subcommand};
use contract_abi::VmMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "abi-tool")]
#[command(about = "Encode and decode contract calls against a JSON interface", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the hash algorithm (keccak256, sha256, sha3_256)
    #[arg(long, global = true)]
    hash: Option<String>,

    /// Prepare payloads for the WASM target
    #[arg(long, global = true)]
    wasm: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Args)]
struct CallArgs {
    /// Interface description (JSON file)
    #[arg(short, long)]
    abi: Option<String>,

    /// Method name
    #[arg(short, long, conflicts_with_all = ["method_id", "signature"])]
    method: Option<String>,

    /// Method id as hex, for overloaded methods
    #[arg(long)]
    method_id: Option<String>,

    /// Signature like `f(uint256,string)`, no interface needed
    #[arg(short, long, conflicts_with = "method_id")]
    signature: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the selector of a signature
    Selector {
        signature: String,
    },

    /// List selectors and topics of every entry in an interface
    Signatures {
        #[arg(short, long)]
        abi: String,
    },

    /// Encode call data
    Encode {
        #[command(flatten)]
        call: CallArgs,

        /// JSON params, positional array or object keyed by input name
        #[arg(short, long, default_value = "[]")]
        params: String,
    },

    /// Encode deploy code followed by constructor arguments
    EncodeConstructor {
        #[arg(short, long)]
        abi: String,

        /// Deploy code as hex
        #[arg(long)]
        code: String,

        #[arg(short, long, default_value = "[]")]
        params: String,
    },

    /// Decode call data (selector included)
    DecodeInput {
        #[command(flatten)]
        call: CallArgs,

        /// Call data as hex
        #[arg(long)]
        data: String,
    },

    /// Decode a method's return data
    DecodeOutput {
        #[arg(short, long)]
        abi: String,

        #[arg(short, long)]
        method: String,

        #[arg(long)]
        data: String,
    },

    /// Decode the non-indexed fields of an event log
    DecodeEvent {
        #[arg(short, long)]
        abi: String,

        /// Event name
        #[arg(short, long, conflicts_with = "topic")]
        event: Option<String>,

        /// Event topic as hex
        #[arg(short, long)]
        topic: Option<String>,

        #[arg(long)]
        data: String,
    },

    /// Write a default configuration file
    InitConfig {
        #[arg(short, long, default_value = "./abi-tool.toml")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ToolConfig::from_file(path)?,
        None => ToolConfig::default(),
    };
    if let Some(hash) = &cli.hash {
        config.hash_algorithm = hash.parse::<HashAlgorithm>()?;
    }
    if cli.wasm {
        config.vm_mode = VmMode::Wasm;
    }

    // Initialize logging
    let log_level = if cli.debug { "debug".to_string() } else { config.log_level.clone() };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("abi_tool={},contract_abi={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(hash = %config.hash_algorithm, vm = %config.vm_mode, "configuration loaded");
    let codec = config.codec();

    let output = match cli.command {
        Commands::Selector { signature } => commands::selector(&codec, &signature)?,
        Commands::Signatures { abi } => commands::list_signatures(&codec, &read_abi(&abi)?)?,
        Commands::Encode { call, params } => {
            let (abi, target) = resolve_call(call)?;
            commands::encode(&codec, abi.as_deref(), &target, &params)?
        }
        Commands::EncodeConstructor { abi, code, params } => {
            commands::encode_constructor(&codec, &read_abi(&abi)?, &code, &params)?
        }
        Commands::DecodeInput { call, data } => {
            let (abi, target) = resolve_call(call)?;
            commands::decode_input(&codec, abi.as_deref(), &target, &data)?
        }
        Commands::DecodeOutput { abi, method, data } => {
            commands::decode_output(&codec, &read_abi(&abi)?, &method, &data)?
        }
        Commands::DecodeEvent { abi, event, topic, data } => {
            let target = match (event, topic) {
                (Some(name), _) => EventTarget::Name(name),
                (None, Some(topic)) => EventTarget::Topic(topic),
                (None, None) => return Err(anyhow::anyhow!("either --event or --topic is required")),
            };
            commands::decode_event(&codec, &read_abi(&abi)?, &target, &data)?
        }
        Commands::InitConfig { output } => {
            config.to_file(&output)?;
            tracing::info!("Configuration written to {}", output);
            return Ok(());
        }
    };

    println!("{}", output);
    Ok(())
}

fn read_abi(path: &str) -> anyhow::Result<String> {
    tracing::debug!("Loading interface from {}", path);
    Ok(std::fs::read_to_string(path)?)
}

fn resolve_call(call: CallArgs) -> anyhow::Result<(Option<String>, CallTarget)> {
    let abi = call.abi.as_deref().map(read_abi).transpose()?;
    let target = match (call.method, call.method_id, call.signature) {
        (Some(name), _, _) => CallTarget::Name(name),
        (None, Some(id), _) => CallTarget::MethodId(id),
        (None, None, Some(sig)) => CallTarget::Signature(sig),
        (None, None, None) => {
            return Err(anyhow::anyhow!("one of --method, --method-id or --signature is required"))
        }
    };
    Ok((abi, target))
}
