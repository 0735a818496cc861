use std::error;
use std::fmt;

/// Result alias for everything that talks to a table store.
pub type WipeResult<T> = Result<T, WipeError>;

/// Error raised while draining tables.
///
/// Either a single failure, made of an [`ErrorKind`], a static description and an optional
/// detail, or the collected failures of several tables.
#[derive(Debug, Clone)]
pub struct WipeError {
    repr: Repr,
}

#[derive(Debug, Clone)]
enum Repr {
    Single {
        kind: ErrorKind,
        description: &'static str,
        detail: Option<String>,
    },
    Many(Vec<WipeError>),
}

/// What went wrong, independent of the message.
///
/// Every kind fails the table it happened on in the same way. Kinds only tell the logs a
/// throttled table apart from a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    // Store
    StoreOperationFailed,
    StoreConnectionFailed,
    StoreThrottled,
    TableNotFound,
    AuthenticationError,

    // Records
    MissingPrimaryKey,
    UnsupportedKeyType,
    InvalidData,

    // Deletes
    UnprocessedDeletes,

    // Configuration
    ConfigError,

    Unknown,
}

impl WipeError {
    fn single(kind: ErrorKind, description: &'static str, detail: Option<String>) -> WipeError {
        WipeError {
            repr: Repr::Single {
                kind,
                description,
                detail,
            },
        }
    }

    /// Collects several errors into one.
    pub fn many(errors: Vec<WipeError>) -> WipeError {
        WipeError {
            repr: Repr::Many(errors),
        }
    }

    /// Kind of this error, or of the first collected error. [`ErrorKind::Unknown`] when nothing
    /// was collected.
    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            Repr::Single { kind, .. } => *kind,
            Repr::Many(errors) => errors.first().map_or(ErrorKind::Unknown, WipeError::kind),
        }
    }

    /// Kinds of every error contained, in order.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match &self.repr {
            Repr::Single { kind, .. } => vec![*kind],
            Repr::Many(errors) => errors.iter().flat_map(WipeError::kinds).collect(),
        }
    }

    /// Dynamic detail of this error, or the first one found among the collected errors.
    pub fn detail(&self) -> Option<&str> {
        match &self.repr {
            Repr::Single { detail, .. } => detail.as_deref(),
            Repr::Many(errors) => errors.iter().find_map(WipeError::detail),
        }
    }
}

/// Errors are equal when their kinds line up and they both carry a detail or both do not.
/// Descriptions and detail texts are ignored.
impl PartialEq for WipeError {
    fn eq(&self, other: &WipeError) -> bool {
        match (&self.repr, &other.repr) {
            (
                Repr::Single {
                    kind: a, detail: da, ..
                },
                Repr::Single {
                    kind: b, detail: db, ..
                },
            ) => a == b && da.is_some() == db.is_some(),
            (Repr::Many(a), Repr::Many(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for WipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Single {
                kind,
                description,
                detail,
            } => {
                write!(f, "{kind:?}: {description}")?;
                if let Some(detail) = detail {
                    write!(f, " -> {detail}")?;
                }

                Ok(())
            }
            Repr::Many(errors) => match errors.as_slice() {
                [] => f.write_str("Multiple errors occurred (empty)"),
                [error] => fmt::Display::fmt(error, f),
                errors => {
                    write!(f, "Multiple errors occurred ({} total):", errors.len())?;
                    for (position, error) in errors.iter().enumerate() {
                        write!(f, "\n  {}: {error}", position + 1)?;
                    }

                    Ok(())
                }
            },
        }
    }
}

impl error::Error for WipeError {}

impl From<(ErrorKind, &'static str)> for WipeError {
    fn from((kind, description): (ErrorKind, &'static str)) -> WipeError {
        WipeError::single(kind, description, None)
    }
}

impl From<(ErrorKind, &'static str, String)> for WipeError {
    fn from((kind, description, detail): (ErrorKind, &'static str, String)) -> WipeError {
        WipeError::single(kind, description, Some(detail))
    }
}

impl<E> From<Vec<E>> for WipeError
where
    E: Into<WipeError>,
{
    fn from(errors: Vec<E>) -> WipeError {
        WipeError::many(errors.into_iter().map(Into::into).collect())
    }
}

/// Invalid configuration surfaces as [`ErrorKind::ConfigError`].
impl From<wiper_config::shared::ValidationError> for WipeError {
    fn from(err: wiper_config::shared::ValidationError) -> WipeError {
        WipeError::single(
            ErrorKind::ConfigError,
            "Invalid wiper configuration",
            Some(err.to_string()),
        )
    }
}
