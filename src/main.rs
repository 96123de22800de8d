use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gemini_image_relay::app::{GenerateInput, Relay};
use gemini_image_relay::models::{AspectRatio, Config, ImageSize, UploadedImage};
use gemini_image_relay::settings::SettingsOverride;
use gemini_image_relay::Error;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-image-relay")]
#[command(about = "Relay prompts and reference images to a Gemini image generation gateway")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate text and images from a prompt and optional reference images.
    Generate {
        prompt: String,
        /// Reference image (png, jpg, jpeg, gif, webp). Repeatable.
        #[arg(short, long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
        #[arg(long, default_value = "1:1", value_parser = parse_aspect_ratio)]
        aspect_ratio: AspectRatio,
        #[arg(long, default_value = "2K", value_parser = parse_image_size)]
        image_size: ImageSize,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Show or change the stored API key and endpoint.
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// List or clear generation history.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Check that the endpoint accepts the configured key.
    Ping {
        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryCommand {
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    Clear,
}

/// Per-request overrides of the stored settings.
#[derive(Debug, Args)]
struct OverrideArgs {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    api_url: Option<String>,
}

impl From<OverrideArgs> for SettingsOverride {
    fn from(args: OverrideArgs) -> Self {
        Self {
            api_key: args.api_key,
            api_url: args.api_url,
        }
    }
}

fn parse_aspect_ratio(input: &str) -> std::result::Result<AspectRatio, String> {
    input.parse().map_err(|_| {
        let allowed: Vec<&str> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
        format!(
            "Invalid aspect ratio '{}'. Expected one of: {}",
            input,
            allowed.join(", ")
        )
    })
}

fn parse_image_size(input: &str) -> std::result::Result<ImageSize, String> {
    input
        .parse()
        .map_err(|_| format!("Invalid image size '{}'. Expected 1K, 2K or 4K", input))
}

async fn read_upload(path: &Path) -> gemini_image_relay::Result<UploadedImage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::Validation(format!("Could not read image {}: {}", path.display(), e))
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedImage { bytes, filename })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(relay: &Relay, command: Command) -> gemini_image_relay::Result<serde_json::Value> {
    match command {
        Command::Generate {
            prompt,
            images,
            aspect_ratio,
            image_size,
            overrides,
        } => {
            let mut uploads = Vec::with_capacity(images.len());
            for path in &images {
                uploads.push(read_upload(path).await?);
            }

            let results = relay
                .generate(&GenerateInput {
                    prompt,
                    images: uploads,
                    aspect_ratio,
                    image_size,
                    overrides: overrides.into(),
                })
                .await?;
            Ok(json!({ "success": true, "results": results }))
        }
        Command::Settings {
            action: SettingsCommand::Show,
        } => Ok(serde_json::to_value(relay.settings_view().await?)?),
        Command::Settings {
            action: SettingsCommand::Set { api_key, api_url },
        } => {
            let view = relay
                .update_settings(&SettingsOverride { api_key, api_url })
                .await?;
            Ok(json!({ "success": true, "settings": view }))
        }
        Command::History {
            action: HistoryCommand::List { limit },
        } => Ok(json!({ "history": relay.history(limit).await? })),
        Command::History {
            action: HistoryCommand::Clear,
        } => {
            relay.clear_history().await?;
            Ok(json!({ "success": true }))
        }
        Command::Ping { overrides } => {
            let body = relay.ping(&overrides.into()).await?;
            Ok(json!({ "success": true, "response": body }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_image_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let relay = match Relay::from_config(&config).await {
        Ok(relay) => relay,
        Err(e) => {
            error!("Failed to initialize relay: {}", e);
            std::process::exit(1);
        }
    };

    match run(&relay, args.command).await {
        Ok(output) => {
            info!("Done");
            print_json(&output)
        }
        Err(e) => {
            error!("Request failed: {}", e);
            let output = match &e {
                Error::EmptyResult => json!({ "error": "Nothing was generated" }),
                other => json!({ "error": other.to_string(), "details": other.details() }),
            };
            eprintln!("{}", serde_json::to_string_pretty(&output)?);
            std::process::exit(1);
        }
    }
}
