/// Authorization header parsing
///
/// Both extractors expect exactly two whitespace-separated fields. Only the API-key
/// extractor checks the scheme word; the bearer extractor returns the second field of
/// any two-field value (`"Token abc"` yields `"abc"`).

use crate::error::HeaderError;

const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from a `Bearer <token>` header value
///
/// # Errors
/// - `MissingHeader` if the value is empty
/// - `MalformedHeader` if the value does not have exactly two fields
pub fn extract_bearer_token(header_value: &str) -> Result<&str, HeaderError> {
    let (_scheme, token) = split_two_fields(header_value)?;
    Ok(token)
}

/// Extract the key from an `ApiKey <key>` header value
///
/// # Errors
/// - `MissingHeader` if the value is empty
/// - `MalformedHeader` if the value does not have exactly two fields
/// - `WrongScheme` if the first field is not `ApiKey`
pub fn extract_api_key(header_value: &str) -> Result<&str, HeaderError> {
    let (scheme, key) = split_two_fields(header_value)?;
    if scheme != API_KEY_SCHEME {
        return Err(HeaderError::WrongScheme);
    }
    Ok(key)
}

fn split_two_fields(header_value: &str) -> Result<(&str, &str), HeaderError> {
    if header_value.is_empty() {
        return Err(HeaderError::MissingHeader);
    }

    let mut fields = header_value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(value), None) => Ok((scheme, value)),
        _ => Err(HeaderError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Ok("abc123"));
    }

    #[test]
    fn test_bearer_surrounding_whitespace() {
        assert_eq!(extract_bearer_token("  Bearer \t abc123  "), Ok("abc123"));
    }

    #[test]
    fn test_bearer_missing() {
        assert_eq!(extract_bearer_token(""), Err(HeaderError::MissingHeader));
    }

    #[test]
    fn test_bearer_field_count() {
        for value in ["Bearer", "   ", "Bearer abc 123", "abc123"] {
            assert_eq!(
                extract_bearer_token(value),
                Err(HeaderError::MalformedHeader),
                "value {:?} should be malformed",
                value
            );
        }
    }

    #[test]
    fn test_bearer_ignores_scheme_word() {
        // Only the field count is checked for bearer values.
        assert_eq!(extract_bearer_token("Token abc123"), Ok("abc123"));
        assert_eq!(extract_bearer_token("ApiKey abc123"), Ok("abc123"));
    }

    #[test]
    fn test_api_key() {
        assert_eq!(extract_api_key("ApiKey f271c81ff7084ee5b99a5091b42d486e"), Ok("f271c81ff7084ee5b99a5091b42d486e"));
    }

    #[test]
    fn test_api_key_wrong_scheme() {
        assert_eq!(extract_api_key("Bearer abc123"), Err(HeaderError::WrongScheme));
        assert_eq!(extract_api_key("apikey abc123"), Err(HeaderError::WrongScheme));
    }

    #[test]
    fn test_api_key_missing_and_malformed() {
        assert_eq!(extract_api_key(""), Err(HeaderError::MissingHeader));
        assert_eq!(extract_api_key("ApiKey"), Err(HeaderError::MalformedHeader));
        assert_eq!(extract_api_key("ApiKey a b"), Err(HeaderError::MalformedHeader));
    }
}
