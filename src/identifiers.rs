//! Type-safe identifiers for pool entities.
//!
//! The only identifier this crate owns is [`EndpointUrl`]: the unique key
//! under which a remote endpoint's connection record and membership entry
//! are tracked. Wrapping the URL in a newtype prevents accidentally mixing
//! endpoint keys with arbitrary strings at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// EndpointUrl
// ============================================================================

/// Unique identifier for a remote endpoint.
///
/// One logical client maintains at most one active connection per endpoint
/// URL. The URL is validated and normalized on construction; the pool treats
/// it as an opaque key afterwards.
///
/// # Example
///
/// ```
/// use socket_warden::EndpointUrl;
///
/// let url = EndpointUrl::parse("tcp://10.0.0.7:9300").unwrap();
/// assert_eq!(url.as_str(), "tcp://10.0.0.7:9300");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointUrl(String);

impl EndpointUrl {
    /// Parses and validates an endpoint URL.
    ///
    /// The input is normalized through the `url` crate, so two spellings of
    /// the same endpoint compare equal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the input is not a valid URL.
    pub fn parse(input: impl AsRef<str>) -> Result<Self> {
        let input = input.as_ref();
        let parsed = Url::parse(input).map_err(|source| Error::InvalidUrl {
            input: input.to_owned(),
            source,
        })?;

        Ok(Self(String::from(parsed)))
    }

    /// Returns the normalized URL string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let url = EndpointUrl::parse("ws://127.0.0.1:4000").expect("valid url");
        assert_eq!(url.as_str(), "ws://127.0.0.1:4000/");
    }

    #[test]
    fn test_parse_invalid() {
        let result = EndpointUrl::parse("not a url");
        assert!(matches!(result, Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_normalized_spellings_compare_equal() {
        let a = EndpointUrl::parse("ws://127.0.0.1:4000").unwrap();
        let b = EndpointUrl::parse("ws://127.0.0.1:4000/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_matches_as_str() {
        let url = EndpointUrl::parse("tcp://node-3.internal:9300").unwrap();
        assert_eq!(url.to_string(), url.as_str());
    }
}
