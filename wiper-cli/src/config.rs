use wiper_config::load_config;
use wiper_config::shared::WiperConfig;

/// Loads the [`WiperConfig`] and validates it.
pub fn load_wiper_config() -> anyhow::Result<WiperConfig> {
    let config = load_config::<WiperConfig>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use wiper_config::shared::CredentialsConfig;
    use wiper_config::{Environment, load_config_from, load_config_from_vars};

    use super::*;

    fn configuration_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("configuration")
    }

    fn shipped_config(environment: Environment) -> WiperConfig {
        load_config_from::<WiperConfig>(&configuration_dir(), environment).unwrap()
    }

    fn config_with_vars(environment: Environment, vars: &[(&str, &str)]) -> WiperConfig {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        load_config_from_vars::<WiperConfig, _>(&configuration_dir(), environment, vars).unwrap()
    }

    #[test]
    fn shipped_configurations_are_valid() {
        for environment in [Environment::Dev, Environment::Staging, Environment::Prod] {
            let config = shipped_config(environment);
            assert!(config.validate().is_ok(), "{environment} config is invalid");
            assert_eq!(config.tables.len(), 5);
        }
    }

    #[test]
    fn dev_targets_local_store_without_deleting() {
        let config = shipped_config(Environment::Dev);
        assert_eq!(
            config.store.endpoint_url.as_deref(),
            Some("http://localhost:8000")
        );
        assert!(config.dry_run);

        let config = shipped_config(Environment::Prod);
        assert!(!config.dry_run);
        assert_eq!(config.drain.page_size, Some(500));
    }

    #[test]
    fn env_vars_override_shipped_configuration() {
        let config = config_with_vars(
            Environment::Prod,
            &[
                ("APP_TABLES", "Orders-1,Customers"),
                ("APP_DRY_RUN", "true"),
                ("APP_DRAIN__PAGE_SIZE", "50"),
                ("APP_STORE__CREDENTIALS__PROFILE__NAME", "ops"),
            ],
        );

        assert_eq!(config.tables, vec!["Orders-1", "Customers"]);
        assert!(config.dry_run);
        assert_eq!(config.drain.page_size, Some(50));
        assert!(matches!(
            &config.store.credentials,
            CredentialsConfig::Profile { name } if name == "ops"
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn single_table_run_replaces_the_table_list() {
        let table = "Resident-35lif7vbsfb5zn6ajvzqpyr5a4-NONE";
        let config = config_with_vars(Environment::Dev, &[("APP_TABLES", table)]);
        assert_eq!(config.tables, vec![table]);

        let config = config_with_vars(Environment::Dev, &[("APP_TABLES", "12345")]);
        assert_eq!(config.tables, vec!["12345"]);
    }
}
