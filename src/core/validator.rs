//! Submission URL validation

use crate::error::{Result, TubeFetchError};
use url::Url;

/// Accept any absolute URL that carries both a scheme and a host.
///
/// The parsed form is only used for the check; the caller's string is
/// handed back untouched so the collaborator sees exactly what was
/// submitted. There is no domain allow-list: whether a site is supported is
/// the collaborator's call, made during the probe.
pub fn validate_url(candidate: &str) -> Result<&str> {
    let parsed = Url::parse(candidate)
        .map_err(|e| TubeFetchError::InvalidUrl(format!("{candidate}: {e}")))?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() && !parsed.scheme().is_empty() => Ok(candidate),
        _ => Err(TubeFetchError::InvalidUrl(format!("{candidate}: missing host"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_absolute_urls() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=10",
            "http://vimeo.com/12345",
            "https://example.com/path/to/clip.mp4#frag",
            "ftp://media.example.org/file",
        ] {
            assert_eq!(validate_url(url).unwrap(), url);
        }
    }

    #[test]
    fn test_accepted_urls_are_not_normalised() {
        for url in [
            "https://example.com",
            "HTTPS://YouTube.com/watch?v=Ab",
            "https://example.com/a b",
        ] {
            assert_eq!(validate_url(url).unwrap(), url);
        }
    }

    #[test]
    fn test_rejects_without_scheme_or_host() {
        for bad in [
            "not a url",
            "",
            "   ",
            "www.youtube.com/watch?v=xxx",
            "/relative/path",
            "mailto:someone@example.com",
            "data:text/plain,hello",
            "file:///etc/passwd",
            "https://",
        ] {
            assert!(
                matches!(validate_url(bad), Err(TubeFetchError::InvalidUrl(_))),
                "accepted {bad:?}"
            );
        }
    }
}
