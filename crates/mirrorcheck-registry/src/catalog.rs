//! Decoding of the registry's `/v2/_catalog` response.

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct CatalogBody {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

/// Decodes a catalog body into repository names, preserving order.
///
/// A missing or `null` `repositories` field yields an empty list.
///
/// # Errors
///
/// Returns `RegistryError::Decode` if the body is not a JSON object of
/// the expected shape.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<String>> {
    let catalog: CatalogBody = serde_json::from_slice(body)?;
    Ok(catalog.repositories.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn preserves_order() {
        let repos = decode_catalog(br#"{"repositories":["b","a","c"]}"#).expect("decode");
        assert_eq!(repos, vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_array_is_empty_list() {
        let repos = decode_catalog(br#"{"repositories":[]}"#).expect("decode");
        assert!(repos.is_empty());
    }

    #[test]
    fn missing_or_null_field_is_empty_list() {
        assert!(decode_catalog(b"{}").expect("decode").is_empty());
        assert!(
            decode_catalog(br#"{"repositories":null}"#)
                .expect("decode")
                .is_empty()
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let repos =
            decode_catalog(br#"{"repositories":["x"],"next":"/v2/_catalog?last=x"}"#).expect("decode");
        assert_eq!(repos, vec!["x"]);
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            decode_catalog(b"<html>oops</html>"),
            Err(RegistryError::Decode { .. })
        ));
        assert!(matches!(
            decode_catalog(br#"{"repositories":"a"}"#),
            Err(RegistryError::Decode { .. })
        ));
    }
}
