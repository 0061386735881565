//! Inbound EDI pipeline CLI
//!
//! Runs one invocation per S3 notification event.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edi_inbound::{build_runtime, event::decode_object_key, invoke, Config, InboundEvent};

#[derive(Parser)]
#[command(name = "edi-inbound")]
#[command(about = "Translate inbound EDI files from S3 into purchase-order JSON", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or JSON). Environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the mapping identifier
    #[arg(long, global = true)]
    mapping_id: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one notification event (default: event JSON on stdin)
    Invoke {
        /// Path to the event JSON, or '-' for stdin
        #[arg(short, long, conflicts_with_all = ["bucket", "key"])]
        event: Option<PathBuf>,

        /// Bucket of a synthetic single-record event
        #[arg(long, requires = "key")]
        bucket: Option<String>,

        /// Object key of a synthetic single-record event (URL-encoded as S3 sends it)
        #[arg(long, requires = "bucket")]
        key: Option<String>,
    },

    /// Validate configuration
    Validate,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Decode an object key the way notification keys are decoded
    ObjectKey {
        /// Key as it appears in the event
        raw: String,
    },
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => invoke_command(cli.config, cli.mapping_id, None, None, None),

        Some(Commands::Invoke { event, bucket, key }) => {
            invoke_command(cli.config, cli.mapping_id, event, bucket, key)
        }

        Some(Commands::Validate) => {
            validate_command(cli.config, cli.mapping_id)?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::GenerateConfig { output }) => {
            generate_config_command(output)?;
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::ObjectKey { raw }) => {
            println!("{}", decode_object_key(&raw)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the config file (if any), then apply environment and CLI overrides.
fn load_config(path: Option<PathBuf>, mapping_id: Option<String>) -> Result<Config> {
    let mut config = match &path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    config.apply_env(|name| std::env::var(name).ok());

    if let Some(id) = mapping_id {
        config.stedi.mapping_id = id;
    }

    Ok(config)
}

fn read_event(event: Option<PathBuf>, bucket: Option<String>, key: Option<String>) -> Result<InboundEvent> {
    if let (Some(bucket), Some(key)) = (bucket, key) {
        return Ok(InboundEvent::for_object(bucket, key));
    }

    let json = match event {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    InboundEvent::from_json(&json).context("Failed to parse event")
}

fn invoke_command(
    config_path: Option<PathBuf>,
    mapping_id: Option<String>,
    event: Option<PathBuf>,
    bucket: Option<String>,
    key: Option<String>,
) -> Result<ExitCode> {
    let config = load_config(config_path, mapping_id)?;
    let event = read_event(event, bucket, key)?;

    let runtime = build_runtime()?;
    let response = runtime.block_on(invoke(&config, &event))?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validate_command(config_path: Option<PathBuf>, mapping_id: Option<String>) -> Result<()> {
    let mut config = load_config(config_path, mapping_id)?;
    config.validate()?;

    // Never echo the credential
    config.stedi.api_key = "<set>".to_string();
    println!("Configuration is valid\n---\n{}", config.to_yaml()?);
    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    // Generate a commented YAML config
    let yaml = r#"# Inbound EDI Pipeline Configuration

# === STEDI: translation and mapping services ===
stedi:
  # API key. Prefer the STEDI_API_KEY environment variable.
  # api_key: ""

  # Mapping applied to translated documents (or STEDI_MAPPING_ID)
  mapping_id: ""

  # Service endpoints
  translate_url: "https://edi-core.stedi.com/2021-06-05/translate"
  mappings_base_url: "https://mappings.stedi.com/2021-06-01/mappings"

  # Formats sent to /translate
  input_format: "edi"
  output_format: "jedi@2.0-beta"

  # Per-request timeout in seconds (omit to use the HTTP client default)
  # timeout_secs: 30

# === STORAGE: where buckets live ===
# Defaults to S3 with credentials from the environment. Available keys:
#   local_root: "/tmp/edi-buckets"          # one subdirectory per bucket instead of S3
#   region: "us-east-1"                     # AWS_REGION overrides it
#   endpoint_url: "http://localhost:4566"   # LocalStack, MinIO, ...
storage: {}

# === OUTPUT: stored purchase orders ===
output:
  # Artifacts are written to {prefix}/{id_field value}-{n}.json
  prefix: "orders"
  id_field: "po_number"

  # n is random in [0, suffix_bound)
  suffix_bound: 100

  # Ignore notifications for objects under prefix (avoids re-processing our own output)
  skip_own_artifacts: true
"#;

    std::fs::write(&output, yaml)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}
