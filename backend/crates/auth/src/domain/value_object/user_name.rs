//! User Name Value Object
//!
//! ユーザー名は、ユーザーを表示するための公開ハンドル。
//! トークンの subject には使用しない（変更可能なため、数値IDを使う）。
//!
//! ## 不変条件
//! - 長さ: 2〜32文字
//! - 使用可能文字: ASCII英数字と `_ . -`
//! - 英数字を最低1文字含む

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum length for user name (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 2;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 32;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// User name value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let name = raw.into().trim().to_string();
        let len = name.chars().count();

        if len < USER_NAME_MIN_LENGTH || len > USER_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Username must be between {} and {} characters",
                USER_NAME_MIN_LENGTH, USER_NAME_MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c))
        {
            return Err(AppError::bad_request("Username contains invalid characters")
                .with_action("Use letters, digits, '_', '.' or '-'"));
        }

        if !name.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::bad_request("Username must contain at least one letter or digit"));
        }

        Ok(Self(name))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_valid() {
        assert!(UserName::new("u1").is_ok());
        assert!(UserName::new("alice_smith").is_ok());
        assert!(UserName::new("a.b-c").is_ok());
    }

    #[test]
    fn test_user_name_length() {
        assert!(UserName::new("a").is_err());
        assert!(UserName::new("a".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
        assert!(UserName::new("a".repeat(USER_NAME_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_user_name_characters() {
        assert!(UserName::new("al ice").is_err());
        assert!(UserName::new("alice!").is_err());
        assert!(UserName::new("___").is_err());
        assert!(UserName::new("ユーザー").is_err());
    }
}
