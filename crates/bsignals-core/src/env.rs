//! Environment variable utilities
//!
//! Typed lookups with defaults, used by the runtime configuration.
//!
//! ```ignore
//! use bsignals_core::env::{env_get, env_get_opt};
//!
//! let poll_ms: u64 = env_get("BSIG_POOL_POLL_MS", 100);
//! let max_async: Option<usize> = env_get_opt("BSIG_MAX_ASYNC_THREADS");
//! ```

use std::str::FromStr;

/// Get environment variable parsed as `T`, or return `default`
///
/// Unset and unparsable values both fall back to the default.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true; any other
/// set value is false. Unset returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as optional value
///
/// `Some(T)` only if the variable is set and parses.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        let val: usize = env_get("__BSIG_TEST_UNSET_VAR__", 42);
        assert_eq!(val, 42);
    }

    #[test]
    fn test_env_get_opt_none() {
        let val: Option<usize> = env_get_opt("__BSIG_TEST_UNSET_VAR__");
        assert!(val.is_none());
    }

    #[test]
    fn test_env_get_with_set_var() {
        std::env::set_var("__BSIG_TEST_NUM__", " 123 ");
        let val: usize = env_get("__BSIG_TEST_NUM__", 0);
        assert_eq!(val, 123);
        std::env::remove_var("__BSIG_TEST_NUM__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        assert!(env_get_bool("__BSIG_TEST_UNSET_VAR__", true));

        for truthy in ["1", "true", "TRUE", "yes", "on"] {
            std::env::set_var("__BSIG_TEST_BOOL__", truthy);
            assert!(env_get_bool("__BSIG_TEST_BOOL__", false), "{}", truthy);
        }
        for falsy in ["0", "false", "garbage"] {
            std::env::set_var("__BSIG_TEST_BOOL__", falsy);
            assert!(!env_get_bool("__BSIG_TEST_BOOL__", true), "{}", falsy);
        }
        std::env::remove_var("__BSIG_TEST_BOOL__");
    }

    #[test]
    fn test_env_get_invalid_parse() {
        std::env::set_var("__BSIG_TEST_INVALID__", "not_a_number");
        let val: usize = env_get("__BSIG_TEST_INVALID__", 99);
        assert_eq!(val, 99);
        std::env::remove_var("__BSIG_TEST_INVALID__");
    }
}
