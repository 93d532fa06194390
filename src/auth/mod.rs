//! Credential handling for the management API.
//!
//! Token acquisition is not this crate's job. The transport only needs to
//! know which `Authorization` header to attach:
//!
//! - [`Credentials::ApiToken`]: a static classic API token (`Api-Token <token>`)
//! - [`Credentials::PlatformToken`]: a static platform token (`Bearer <token>`)
//! - [`Credentials::OAuth`]: a [`TokenSource`] that hands out the current
//!   OAuth2 client-credentials access token (`Bearer <token>`); refreshing it
//!   is the source's responsibility
//!
//! Alternatively a pre-authenticated `reqwest::Client` can be passed to
//! [`ClientConfigBuilder::http_client`](crate::ClientConfigBuilder::http_client)
//! and credentials left unset.
//!
//! # Example
//!
//! ```rust
//! use platform_api::{ApiToken, Credentials};
//!
//! let credentials = Credentials::PlatformToken(ApiToken::new("dt0s16.abc").unwrap());
//! assert_eq!(credentials.authorization_header().unwrap(), "Bearer dt0s16.abc");
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ApiToken;

/// Error returned when a [`TokenSource`] cannot produce a token.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Failed to obtain access token: {reason}")]
pub struct TokenError {
    /// Why no token is available.
    pub reason: String,
}

/// Supplies the current bearer token for OAuth-authenticated clients.
///
/// Called once per request attempt, so implementations should return a
/// cached token and refresh it out of band.
pub trait TokenSource: Send + Sync {
    /// Returns the access token to send.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when no valid token is available.
    fn token(&self) -> Result<String, TokenError>;
}

/// Authentication attached to every outbound request.
#[derive(Clone)]
pub enum Credentials {
    /// Classic API token.
    ApiToken(ApiToken),
    /// Platform token.
    PlatformToken(ApiToken),
    /// OAuth2 bearer token from an external source.
    OAuth(Arc<dyn TokenSource>),
}

impl Credentials {
    /// Returns the `Authorization` header value for the next request.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the OAuth token source fails.
    pub fn authorization_header(&self) -> Result<String, TokenError> {
        match self {
            Self::ApiToken(token) => Ok(format!("Api-Token {}", token.as_ref())),
            Self::PlatformToken(token) => Ok(format!("Bearer {}", token.as_ref())),
            Self::OAuth(source) => {
                let token = source.token()?;
                if token.is_empty() {
                    return Err(TokenError {
                        reason: "token source returned an empty token".to_string(),
                    });
                }
                Ok(format!("Bearer {token}"))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken(_) => f.write_str("Credentials::ApiToken(*****)"),
            Self::PlatformToken(_) => f.write_str("Credentials::PlatformToken(*****)"),
            Self::OAuth(_) => f.write_str("Credentials::OAuth(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedToken(&'static str);

    impl TokenSource for FixedToken {
        fn token(&self) -> Result<String, TokenError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TokenSource for Failing {
        fn token(&self) -> Result<String, TokenError> {
            Err(TokenError {
                reason: "sso unreachable".to_string(),
            })
        }
    }

    #[test]
    fn test_api_token_header() {
        let credentials = Credentials::ApiToken(ApiToken::new("dt0c01.abc").unwrap());
        assert_eq!(
            credentials.authorization_header().unwrap(),
            "Api-Token dt0c01.abc"
        );
    }

    #[test]
    fn test_platform_token_header() {
        let credentials = Credentials::PlatformToken(ApiToken::new("dt0s16.xyz").unwrap());
        assert_eq!(credentials.authorization_header().unwrap(), "Bearer dt0s16.xyz");
    }

    #[test]
    fn test_oauth_header_uses_token_source() {
        let credentials = Credentials::OAuth(Arc::new(FixedToken("eyJhbGciOi")));
        assert_eq!(credentials.authorization_header().unwrap(), "Bearer eyJhbGciOi");

        let credentials = Credentials::OAuth(Arc::new(FixedToken("")));
        assert!(credentials.authorization_header().is_err());
    }

    #[test]
    fn test_oauth_source_failure_propagates() {
        let credentials = Credentials::OAuth(Arc::new(Failing));
        let error = credentials.authorization_header().unwrap_err();
        assert!(error.to_string().contains("sso unreachable"));
    }

    #[test]
    fn test_debug_masks_tokens() {
        let credentials = Credentials::ApiToken(ApiToken::new("secret-value").unwrap());
        let debug_output = format!("{credentials:?}");
        assert!(!debug_output.contains("secret-value"));
    }
}
