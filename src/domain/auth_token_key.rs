use rand::distributions::Alphanumeric;
use rand::thread_rng;
use rand::Rng;

pub const AUTH_TOKEN_LENGTH: usize = 40;

/// Opaque key sent as `Authorization: Token <key>`.
#[derive(Debug, Clone)]
pub struct AuthTokenKey(String);

impl TryFrom<String> for AuthTokenKey {
    type Error = InvalidAuthToken;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let is_of_right_size = value.len() == AUTH_TOKEN_LENGTH;
        let is_alphanumeric = value.chars().all(|c| c.is_ascii_alphanumeric());
        if !is_of_right_size || !is_alphanumeric {
            return Err(InvalidAuthToken());
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for AuthTokenKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AuthTokenKey {
    pub fn generate() -> Self {
        let mut rng = thread_rng();
        let raw_token: String =
            std::iter::repeat_with(|| rng.sample(Alphanumeric))
                .map(char::from)
                .take(AUTH_TOKEN_LENGTH)
                .collect();
        Self(raw_token)
    }

    /// Extracts the key from an `Authorization` header value.
    pub fn from_header(value: &str) -> Result<Self, InvalidAuthToken> {
        let key = value
            .strip_prefix("Token ")
            .ok_or(InvalidAuthToken())?
            .trim();
        Self::try_from(key.to_string())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Authentication token is invalid.")]
pub struct InvalidAuthToken();
