use crate::routes::RegistrationPayload;

use super::{
    password::{InvalidPasswordError, Password},
    person_name::{InvalidNameError, PersonName},
    user_email::{InvalidEmail, UserEmail},
    username::{InvalidUsername, Username},
};

#[derive(Debug)]
pub struct NewUserData {
    pub email: UserEmail,
    pub username: Username,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub password: Password,
}

impl TryFrom<RegistrationPayload> for NewUserData {
    type Error = InvalidUser;

    fn try_from(payload: RegistrationPayload) -> Result<Self, Self::Error> {
        Ok(NewUserData {
            email: UserEmail::try_from(payload.email)?,
            username: Username::try_from(payload.username)?,
            first_name: PersonName::try_from(payload.first_name)
                .map_err(InvalidUser::FirstName)?,
            last_name: PersonName::try_from(payload.last_name)
                .map_err(InvalidUser::LastName)?,
            password: Password::try_from(payload.password)?,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InvalidUser {
    #[error(transparent)]
    InvalidEmail(#[from] InvalidEmail),
    #[error(transparent)]
    InvalidUsername(#[from] InvalidUsername),
    #[error("First name: {0}")]
    FirstName(#[source] InvalidNameError),
    #[error("Last name: {0}")]
    LastName(#[source] InvalidNameError),
    #[error(transparent)]
    InvalidPassword(#[from] InvalidPasswordError),
}
