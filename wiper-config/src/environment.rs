use std::fmt;
use std::io::Error;

/// Variable selecting the environment. Unset means [`Environment::Prod`].
const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Deployment environment of the wiper.
///
/// Picks the `configuration/{name}.yaml` overlay and the log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Prod,
    Staging,
    /// Local runs, usually against DynamoDB Local.
    Dev,
}

impl Environment {
    const ALL: [Environment; 3] = [Self::Prod, Self::Staging, Self::Dev];

    /// Reads the environment from `APP_ENVIRONMENT`.
    pub fn load() -> Result<Environment, Error> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(name) => Self::try_from(name),
            Err(_) => Ok(Self::Prod),
        }
    }

    /// Staging is treated like production.
    pub fn is_prod(&self) -> bool {
        *self != Self::Dev
    }

    /// Name used for the configuration file and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Staging => "staging",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for Environment {
    type Error = Error;

    /// Parses an environment name, ignoring case.
    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|environment| environment.name().eq_ignore_ascii_case(&name))
            .ok_or_else(|| {
                Error::other(format!(
                    "{name} is not a supported environment, expected one of prod, staging or dev"
                ))
            })
    }
}
