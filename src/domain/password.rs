use secrecy::Secret;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug)]
pub struct Password(Secret<String>);

impl TryFrom<String> for Password {
    type Error = InvalidPasswordError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let length = value.graphemes(true).count();
        if length < 8 {
            Err(InvalidPasswordError::PasswordTooShort)
        } else if length > 128 {
            Err(InvalidPasswordError::PasswordTooLong)
        } else {
            Ok(Self(Secret::new(value)))
        }
    }
}

impl AsRef<Secret<String>> for Password {
    fn as_ref(&self) -> &Secret<String> {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InvalidPasswordError {
    #[error("Password is too short.")]
    PasswordTooShort,
    #[error("Password is too long.")]
    PasswordTooLong,
}
