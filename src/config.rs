use crate::transport::ResponseMode;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Chat backend endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Reuse an existing backend session instead of starting a new one
    #[arg(long)]
    pub session_id: Option<String>,

    /// How to read the backend's reply
    #[arg(long, value_enum)]
    pub response_mode: Option<ResponseMode>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub response_mode: ResponseMode,
    pub timeout_secs: u64,
    pub session_id: Option<String>,
    pub greeting: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub title: String,
    pub assistant_name: String,
    pub placeholder: String,
    pub color: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Chat with Medibot".to_string(),
            assistant_name: "Medibot".to_string(),
            placeholder: "Ask a medical question...".to_string(),
            color: true,
        }
    }
}

impl ChatConfig {
    /// Parsed endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url, config::ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| {
            config::ConfigError::Message(format!("invalid chat.endpoint {:?}: {e}", self.endpoint))
        })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let ui = UiConfig::default();
        let mut builder = Config::builder()
            .set_default("chat.endpoint", "http://127.0.0.1:8000/chat")?
            .set_default("chat.response_mode", ResponseMode::Auto.as_str())?
            .set_default("chat.timeout_secs", 300)?
            .set_default("ui.title", ui.title)?
            .set_default("ui.assistant_name", ui.assistant_name)?
            .set_default("ui.placeholder", ui.placeholder)?
            .set_default("ui.color", ui.color)?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", LogFormat::Text.as_str())?;

        // Explicit file must exist; otherwise pick up ./medibot.{yaml,toml,json} if present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path))),
            None => builder.add_source(File::with_name("medibot").required(false)),
        };

        // E.g. MEDIBOT_CHAT__ENDPOINT=http://localhost:9000/chat
        builder = builder.add_source(
            Environment::with_prefix("MEDIBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > env > config file > defaults.
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("chat.endpoint", endpoint)?;
        }
        if let Some(session_id) = cli.session_id {
            builder = builder.set_override("chat.session_id", session_id)?;
        }
        if let Some(mode) = cli.response_mode {
            builder = builder.set_override("chat.response_mode", mode.as_str())?;
        }
        if let Some(secs) = cli.timeout_secs {
            builder = builder.set_override("chat.timeout_secs", secs)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format.as_str())?;
        }
        if cli.no_color {
            builder = builder.set_override("ui.color", false)?;
        }

        let cfg = builder.build()?;
        let app: Self = cfg.try_deserialize()?;
        app.chat.endpoint_url()?;
        Ok(app)
    }
}
