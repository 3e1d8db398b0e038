use validator::ValidateEmail;

#[derive(Debug, Clone)]
pub struct UserEmail(String);

impl TryFrom<String> for UserEmail {
    type Error = InvalidEmail;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_string();
        if value.len() > 254 {
            return Err(InvalidEmail(value));
        }
        if ValidateEmail::validate_email(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidEmail(value))
        }
    }
}
impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl std::fmt::Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{0} is not a valid email.")]
pub struct InvalidEmail(String);
