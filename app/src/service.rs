//! Domain operations behind the HTTP handlers. Every function takes the acting
//! [`Identity`](crate::auth::Identity) explicitly when access depends on it.

pub mod catalog;
pub mod meta;
pub mod orders;
pub mod shops;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures;

use sea_orm::{DbErr, SqlErr};

use crate::common::ApiError;

/// Unique-key violations surface as conflicts; everything else stays a database error.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Conflict(message.to_string()),
        _ => ApiError::DataBase(err),
    }
}

/// Trimmed text, with blank input treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" Honda ".into())), Some("Honda".into()));
    }
}
