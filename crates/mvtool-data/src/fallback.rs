//! Choosing between a resolved value and a caller-supplied default.

use crate::error::{DataError, Result};

/// Returns `primary` if present, else `fallback`, else a client input error
/// carrying `message`.
pub fn resolve<T>(primary: Option<T>, fallback: Option<T>, message: &str) -> Result<T> {
    primary
        .or(fallback)
        .ok_or_else(|| DataError::client_input(message))
}

/// [`resolve`] for a parent of the given kind, failing with
/// "No fallback <kind> provided."
pub fn resolve_parent<T>(resolved: Option<T>, fallback: Option<T>, parent_kind: &str) -> Result<T> {
    resolve(
        resolved,
        fallback,
        &format!("No fallback {parent_kind} provided."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primary_wins_over_fallback() {
        assert_eq!(resolve(Some(1), Some(2), "none").unwrap(), 1);
        assert_eq!(resolve(None, Some(2), "none").unwrap(), 2);
    }

    #[test]
    fn nothing_is_a_client_error() {
        let err = resolve_parent::<i32>(None, None, "catalog").unwrap_err();
        assert!(err.is_client_input());
        assert_eq!(err.to_string(), "No fallback catalog provided.");
    }
}
