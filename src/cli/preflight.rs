//! Pre-flight checks before operations that call hosted APIs.
//!
//! Validates that the required API keys are present before starting
//! operations that would otherwise fail midway.

use crate::error::{Result, SyllabusError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions calls the model and embeds queries.
    Query,
    /// Indexing embeds course content.
    Index,
    /// Listing courses only reads the store.
    Catalog,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Query => {
            check_api_key("ANTHROPIC_API_KEY", "sk-ant-...")?;
            check_api_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::Index => {
            check_api_key("OPENAI_API_KEY", "sk-...")?;
        }
        Operation::Catalog => {}
    }
    Ok(())
}

/// Check that an API key variable is set and non-empty.
fn check_api_key(name: &str, example: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SyllabusError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            name, name, example
        ))),
        Err(_) => Err(SyllabusError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            name, name, example
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_catalog_no_requirements() {
        assert!(check(Operation::Catalog).is_ok());
    }

    #[test]
    fn test_missing_key_names_variable() {
        let err = check_api_key("SYLLABUS_TEST_UNSET_KEY", "x").unwrap_err();
        assert!(err.to_string().contains("SYLLABUS_TEST_UNSET_KEY not set"));
    }
}
