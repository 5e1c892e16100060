//! Helpers for reading configuration from environment variables.

use std::str::FromStr;

/// Interpret a string value such as "1" or "no" as a boolean.
pub fn str_as_bool(s: &str) -> bool {
    match s {
        "1" | "true" | "t" | "yes" | "y" => true,
        "0" | "false" | "f" | "no" | "n" => false,
        _ => {
            tracing::warn!("Unrecognized boolean value \"{}\"", s);
            false
        }
    }
}

/// Return whether a feature flag controlled by an environment variable is
/// enabled.
pub fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .as_ref()
        .map(|s| str_as_bool(s))
        .unwrap_or(default)
}

/// Parse the value of an environment variable.
///
/// Returns `None` if the variable is unset. A value that fails to parse is
/// logged and treated as unset.
pub fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Ignoring invalid value \"{}\" for {}", value, name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{env_value, str_as_bool};
    use crate::MemorySpace;
    use axom_testing::TestCases;

    #[test]
    fn test_str_as_bool() {
        let cases = [
            ("1", true),
            ("yes", true),
            ("t", true),
            ("0", false),
            ("n", false),
            ("maybe", false),
        ];

        cases.test_each(|&(value, expected)| {
            assert_eq!(str_as_bool(value), expected);
        });
    }

    #[test]
    fn test_env_value_unset() {
        assert_eq!(
            env_value::<MemorySpace>("AXOM_TEST_VARIABLE_WHICH_IS_NEVER_SET"),
            None
        );
    }
}
