use common::Environment;
use segmentation::ModelConfig;
use serde::Deserialize;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub listen_addr: String,
    pub max_upload_bytes: usize,
    pub jpeg_quality: u8,
    #[serde(default)]
    pub otel_endpoint: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=100).contains(&self.jpeg_quality),
            "jpeg_quality must be within 1..=100, got {}",
            self.jpeg_quality
        );
        anyhow::ensure!(
            self.max_upload_bytes > 0,
            "max_upload_bytes must be greater than zero"
        );
        self.model.validate()?;
        Ok(())
    }
}

/// Load configuration from defaults overridden by `SEGMENT_*` environment
/// variables. Nested keys use `__`, e.g. `SEGMENT_MODEL__PATH`.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    load(env_source())
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("SEGMENT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load(env: config::Environment) -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("environment", "development")?
        .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
        .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as u64)?
        .set_default(
            "jpeg_quality",
            segmentation::codec::DEFAULT_JPEG_QUALITY as u64,
        )?
        .add_source(env)
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    Ok(config)
}
