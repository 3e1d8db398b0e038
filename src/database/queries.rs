mod catalogue_queries;
mod recipe_queries;
mod relation_queries;
mod shopping_list_queries;
mod subscription_queries;
mod token_queries;
mod user_queries;

pub use catalogue_queries::*;
pub use recipe_queries::*;
pub use relation_queries::*;
pub use shopping_list_queries::*;
pub use subscription_queries::*;
pub use token_queries::*;
pub use user_queries::*;

use diesel::result::{DatabaseErrorKind, Error};

pub(crate) fn is_unique_violation(error: &Error) -> bool {
    matches!(
        error,
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// The referenced row disappeared between the lookup and the insert.
pub(crate) fn is_foreign_key_violation(error: &Error) -> bool {
    matches!(
        error,
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}
