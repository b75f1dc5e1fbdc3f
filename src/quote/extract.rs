//! Resource identifier extraction from the inbound path.

use thiserror::Error;

/// The inbound path does not address exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected URI format: {expected}")]
pub struct ExtractError {
    /// Shape the caller should have used, e.g. `/quote/<symbol>`.
    pub expected: String,
}

/// Pull the resource id out of `/<prefix>/<id>`.
///
/// The path split on `/` must give exactly three segments and the third must
/// be non-empty. `expected` only feeds the error message.
pub fn extract_resource(path: &str, expected: &str) -> Result<String, ExtractError> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [_, _, id] if !id.is_empty() => Ok((*id).to_string()),
        _ => Err(ExtractError {
            expected: expected.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HINT: &str = "/quote/<symbol>";

    #[test]
    fn extracts_third_segment() {
        assert_eq!(extract_resource("/quote/ABC", HINT).unwrap(), "ABC");
        // The prefix itself is not checked.
        assert_eq!(extract_resource("/anything/MSFT", HINT).unwrap(), "MSFT");
    }

    #[test]
    fn rejects_wrong_shapes() {
        for path in ["/quote/", "/quote", "/", "", "/quote/ABC/extra", "quote/ABC", "//"] {
            let err = extract_resource(path, HINT).unwrap_err();
            assert_eq!(err.to_string(), "Expected URI format: /quote/<symbol>", "path {path:?}");
        }
    }
}
