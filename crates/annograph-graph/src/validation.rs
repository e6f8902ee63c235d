//! Relationship type validation.

use regex::Regex;
use std::sync::LazyLock;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;

/// Pattern every relationship type must match.
pub const RELATIONSHIP_TYPE_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

static RELATIONSHIP_TYPE_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(RELATIONSHIP_TYPE_PATTERN).ok());

/// Reject relationship types that are not plain identifiers.
pub fn validate_relationship_type(rel_type: &str) -> AppResult<()> {
    let regex = RELATIONSHIP_TYPE_REGEX
        .as_ref()
        .ok_or_else(|| AppError::internal("Relationship type pattern failed to compile"))?;
    if regex.is_match(rel_type) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Invalid relationship type '{rel_type}': use letters, digits and underscores, not starting with a digit"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annograph_core::ErrorKind;

    #[test]
    fn test_accepts_identifiers() {
        for ok in ["CONNECTS_TO", "_x", "a1", "FeedsInto"] {
            assert!(validate_relationship_type(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_injection_and_malformed() {
        for bad in ["", "1abc", "has space", "A]->(b) DETACH DELETE b //", "a-b", "é"] {
            let err = validate_relationship_type(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "{bad}");
        }
    }
}
