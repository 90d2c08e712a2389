//! # Auth Errors

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown user or wrong password (generic on purpose)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing or unreadable `Authorization` header
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Logged in, but the email is not verified yet
    #[error("Email not verified")]
    EmailNotVerified,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Internal error: password hashing failed")]
    HashingFailed,

    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::AuthenticationRequired
            | AuthError::MalformedToken
            | AuthError::TokenExpired
            | AuthError::InvalidSignature => 401,

            AuthError::EmailNotVerified => 403,

            AuthError::HashingFailed | AuthError::TokenGenerationFailed => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "DIT_INVALID_CREDENTIALS",
            AuthError::AuthenticationRequired => "DIT_NOT_LOGGED",
            AuthError::EmailNotVerified => "DIT_NOT_VERIFIED",
            AuthError::MalformedToken | AuthError::TokenExpired | AuthError::InvalidSignature => {
                "DIT_INVALID_TOKEN"
            }
            AuthError::HashingFailed | AuthError::TokenGenerationFailed => "DIT_AUTH_INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::AuthenticationRequired.status_code(), 401);
        assert_eq!(AuthError::EmailNotVerified.status_code(), 403);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        let err = AuthError::InvalidCredentials;
        assert!(!err.to_string().contains("password"));
        assert!(!err.to_string().contains("email"));
    }
}
