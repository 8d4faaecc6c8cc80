//! Shared helpers for CLI commands

use crate::error::{CliError, Result};

/// Split a `key=value` argument
///
/// The value may itself contain `=`; the key must be non-empty.
pub fn parse_key_value(arg: &str, flag: &str, shape: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::input(
            format!("invalid {} '{}'", flag, arg),
            format!("expected {}", shape),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("mesh=linkerd", "--layer", "layer=option").unwrap(),
            ("mesh".to_string(), "linkerd".to_string())
        );
        assert_eq!(
            parse_key_value("url=http://x?a=b", "--param", "name=value").unwrap(),
            ("url".to_string(), "http://x?a=b".to_string())
        );
        assert_eq!(parse_key_value("empty=", "--param", "name=value").unwrap().1, "");
    }

    #[test]
    fn test_parse_key_value_rejects_missing_key() {
        assert!(parse_key_value("linkerd", "--layer", "layer=option").is_err());
        assert!(parse_key_value("=linkerd", "--layer", "layer=option").is_err());
    }
}
