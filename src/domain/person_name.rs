use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct PersonName(String);

impl TryFrom<String> for PersonName {
    type Error = InvalidNameError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(InvalidNameError::NameIsEmpty);
        }
        if value.graphemes(true).count() > 150 {
            return Err(InvalidNameError::NameIsTooLong);
        }
        let forbidden_characters =
            ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        if value.chars().any(|c| forbidden_characters.contains(&c)) {
            Err(InvalidNameError::ForbiddenCharacters)
        } else {
            Ok(Self(value))
        }
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InvalidNameError {
    #[error("Name is too long.")]
    NameIsTooLong,
    #[error("Name is empty.")]
    NameIsEmpty,
    #[error("Name has forbidden characters.")]
    ForbiddenCharacters,
}
