use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding `base.yaml` and the per-environment overlays, relative to the working
/// directory.
const CONFIGURATION_DIR: &str = "configuration";
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Overrides come from `APP_`-prefixed variables. `__` descends into nested keys, so
/// `APP_STORE__REGION` sets `store.region`, and list keys split on `,`, so
/// `APP_TABLES=Orders,Customers` sets `tables`.
const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_SEPARATOR: &str = "__";
const LIST_SEPARATOR: &str = ",";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to parse APP_ENVIRONMENT: {0}")]
    Environment(#[source] std::io::Error),

    #[error("failed to build configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// A configuration type loadable with [`load_config`].
pub trait Config {
    /// Keys whose environment overrides are comma separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads `T` from `configuration/` in the current directory, for the environment named by
/// `APP_ENVIRONMENT`.
///
/// Later layers override earlier ones: `base.yaml`, then the optional `{environment}.yaml`, then
/// `APP_` environment variables.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    load_config_from(&base_path.join(CONFIGURATION_DIR), environment)
}

/// Loads configuration from `configuration_directory` for the given `environment`.
///
/// Same layering as [`load_config`], without looking at the current directory or
/// `APP_ENVIRONMENT`.
pub fn load_config_from<T>(
    configuration_directory: &Path,
    environment: Environment,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    load_config_from_vars(configuration_directory, environment, std::env::vars())
}

/// Like [`load_config_from`], but takes the overrides from `vars` instead of the process
/// environment.
///
/// Override values are kept as strings, so a table named `12345` stays a string. List keys are
/// split on `,` and blank items are dropped.
pub fn load_config_from_vars<T, I>(
    configuration_directory: &Path,
    environment: Environment,
    vars: I,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
    I: IntoIterator<Item = (String, String)>,
{
    let vars = vars.into_iter().collect::<config::Map<String, String>>();

    let environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .source(Some(vars.clone()));

    let mut builder = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join(BASE_CONFIG_FILE)))
        // Overlays are optional.
        .add_source(
            config::File::from(configuration_directory.join(format!("{environment}.yaml")))
                .required(false),
        )
        // E.g. `APP_STORE__CREDENTIALS__PROFILE__NAME=admin` sets
        // `WiperConfig { store: DynamoDbConfig { credentials: Profile { name } } }` to `admin`.
        .add_source(environment_source);

    // The raw `a,b` string from the source above is replaced by the split list.
    for key in T::LIST_PARSE_KEYS {
        if let Some(value) = vars.get(&env_var_name(key)) {
            let items = value
                .split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>();
            builder = builder.set_override(*key, items)?;
        }
    }

    Ok(builder.build()?.try_deserialize::<T>()?)
}

/// `store.region` becomes `APP_STORE__REGION`.
fn env_var_name(key: &str) -> String {
    format!(
        "{ENV_PREFIX}{ENV_PREFIX_SEPARATOR}{}",
        key.to_uppercase().replace('.', ENV_SEPARATOR)
    )
}
