use reqwest::Url;

use crate::domain::DomainError;

/// Appends `segments` to `base`, percent-encoding each one.
///
/// Names end up as single path segments, so empty names and names carrying
/// `/`, `?` or `#` are rejected instead of being reinterpreted by the server.
pub(crate) fn rest_url(base: &str, segments: &[&str]) -> Result<Url, DomainError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || s.contains(['/', '?', '#']))
    {
        return Err(DomainError::invalid_input(format!(
            "'{}' is not a valid resource name",
            bad
        )));
    }

    let mut url = Url::parse(base)
        .map_err(|e| DomainError::config(format!("Invalid base URL '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| DomainError::config(format!("Base URL '{}' cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_appended_and_encoded() {
        let url = rest_url("http://localhost:6333", &["collections", "my companies"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:6333/collections/my%20companies");

        let url = rest_url("https://db.example.co/base/", &["rest", "v1", "rpc", "f"]).unwrap();
        assert_eq!(url.as_str(), "https://db.example.co/base/rest/v1/rpc/f");
    }

    #[test]
    fn names_that_would_change_the_path_are_rejected() {
        for name in ["a/b", "a?limit=1", "a#frag", ""] {
            let err = rest_url("http://localhost:6333", &["collections", name]).unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)), "{name}");
        }
    }

    #[test]
    fn unparsable_base_is_a_config_error() {
        let err = rest_url("not a url", &["collections"]).unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }
}
