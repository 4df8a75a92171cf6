use thiserror::Error;
use url::Url;

/// Errors for a board base URL that cannot be used to build API endpoints.
#[derive(Error, Debug)]
pub enum BaseUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Base URL has no host")]
    MissingHost,
    #[error("Base URL must not carry a query or fragment")]
    HasQuery,
}

/// Validates the board's base URL.
///
/// The board is usually self-hosted, so localhost and private addresses
/// are accepted. The returned URL always
/// has a path ending in `/` so endpoint segments can be appended.
///
/// # Examples
///
/// ```
/// use confide::util::validate_base_url;
///
/// let url = validate_base_url("http://localhost:5000").unwrap();
/// assert_eq!(url.as_str(), "http://localhost:5000/");
///
/// assert!(validate_base_url("ftp://example.com").is_err());
/// ```
pub fn validate_base_url(url_str: &str) -> Result<Url, BaseUrlError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(BaseUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(BaseUrlError::MissingHost),
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(BaseUrlError::HasQuery);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_localhost() {
        let url = validate_base_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/");
    }

    #[test]
    fn test_keeps_mount_path() {
        let url = validate_base_url("https://example.com/board").unwrap();
        assert_eq!(url.path(), "/board/");

        let url = validate_base_url("https://example.com/board/").unwrap();
        assert_eq!(url.path(), "/board/");
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(matches!(
            validate_base_url("file:///etc/passwd"),
            Err(BaseUrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            validate_base_url("not a url"),
            Err(BaseUrlError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_query() {
        assert!(matches!(
            validate_base_url("https://example.com/?page=2"),
            Err(BaseUrlError::HasQuery)
        ));
    }
}
