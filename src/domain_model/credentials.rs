use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

// Tokens never end up in logs.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefreshToken(***)")
    }
}

/// The access/refresh token pair identifying an authenticated session.
///
/// Both tokens are opaque. A pair is only ever constructed with both halves
/// present, so "half a session" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: AccessToken(access_token.into()),
            refresh_token: RefreshToken(refresh_token.into()),
        }
    }

    /// Builds a pair from independently stored halves.
    ///
    /// Returns `None` when either half is missing or empty.
    pub fn from_parts(access_token: Option<String>, refresh_token: Option<String>) -> Option<Self> {
        match (access_token, refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some(Self::new(access, refresh))
            }
            _ => None,
        }
    }

    pub fn access(&self) -> &str {
        &self.access_token.0
    }

    pub fn refresh(&self) -> &str {
        &self.refresh_token.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_pair_is_no_credentials() {
        assert!(Credentials::from_parts(Some("a".into()), None).is_none());
        assert!(Credentials::from_parts(None, Some("r".into())).is_none());
        assert!(Credentials::from_parts(Some("".into()), Some("r".into())).is_none());
        assert!(Credentials::from_parts(None, None).is_none());

        let pair = Credentials::from_parts(Some("a".into()), Some("r".into())).unwrap();
        assert_eq!(pair.access(), "a");
        assert_eq!(pair.refresh(), "r");
    }

    #[test]
    fn debug_output_hides_tokens() {
        let pair = Credentials::new("secret-access", "secret-refresh");
        let printed = format!("{:?}", pair);
        assert!(!printed.contains("secret"));
    }
}
