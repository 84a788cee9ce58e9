use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_PREFIX: &str = "WARREN";
pub const DEFAULT_CONFIG: &str = "warren";

#[warren_derive::warren_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads layered configuration: a base file, then `WARREN__`-prefixed environment overrides.
///
/// Nested keys use double underscores, so `WARREN__ROUTING__ROOT_PATH` sets
/// `routing.root_path`. Without a `path` the loader looks for `warren.{toml,yaml,json}`
/// in the working directory; unlike an explicit path, that default file may be absent.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicit file is missing, a source is malformed,
/// or the merged values do not fit `T`.
///
/// # Example
/// ```rust
/// use warren_domain::config::ApiConfig;
/// use warren_kernel::config::load_config;
///
/// let cfg: ApiConfig = load_config(None::<&str>).unwrap_or_default();
/// assert!(cfg.routing.head_routes);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
