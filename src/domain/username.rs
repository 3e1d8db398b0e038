use unicode_segmentation::UnicodeSegmentation;

/// Reserved because `/api/users/me` addresses the current user.
const RESERVED_USERNAME: &str = "me";

#[derive(Debug, Clone)]
pub struct Username(String);

impl TryFrom<String> for Username {
    type Error = InvalidUsername;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(InvalidUsername::Empty);
        }
        if value.graphemes(true).count() > 150 {
            return Err(InvalidUsername::TooLong);
        }
        let allowed = |c: char| {
            c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_')
        };
        if !value.chars().all(allowed) {
            return Err(InvalidUsername::ForbiddenCharacters);
        }
        if value.eq_ignore_ascii_case(RESERVED_USERNAME) {
            return Err(InvalidUsername::Reserved);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InvalidUsername {
    #[error("Username is empty.")]
    Empty,
    #[error("Username is too long.")]
    TooLong,
    #[error("Username may only contain letters, digits and .@+-_ characters.")]
    ForbiddenCharacters,
    #[error("Username 'me' is reserved.")]
    Reserved,
}
