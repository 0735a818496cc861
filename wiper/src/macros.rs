//! Macros for wipe error handling.

/// Creates a [`crate::error::WipeError`] from error kind and description, with an optional
/// detail that is converted with `to_string`.
#[macro_export]
macro_rules! wipe_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::WipeError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::WipeError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates and returns a [`crate::error::WipeError`] from the current function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::wipe_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::wipe_error!($kind, $desc, $detail))
    };
}
