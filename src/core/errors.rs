use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
pub enum LibraryError {
    /// Missing, invalid or expired token; the caller should redirect to login.
    #[error("Please login to continue")]
    Unauthenticated,

    /// Role mismatch; the caller should fall back to the authenticated landing page.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Account-integrity error: the token resolves but the profile record is
    /// gone. Forces a logout with an operator-facing message.
    #[error("Your account profile could not be found. Please contact a librarian.")]
    ProfileMissing,

    /// Client- or server-side validation failure, surfaced inline verbatim.
    #[error("{0}")]
    Validation(String),

    /// Server rejected a mutation (loan limit, unavailability, duplicate action).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Bounded request timeout on an auxiliary fetch.
    #[error("The request timed out. Please try again.")]
    Timeout,

    /// Transport-level failure; the user may retry manually.
    #[error("Network error: {0}")]
    Network(String),

    /// Any other HTTP failure, carrying the server's message when present.
    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Local token persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LibraryError {
    /// Maps an HTTP status plus the server's error payload (`message`,
    /// falling back to `error`) into the client taxonomy.
    pub fn from_status(status: http::StatusCode, message: Option<String>) -> Self {
        use http::StatusCode;

        let message = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());
        match status {
            StatusCode::UNAUTHORIZED => LibraryError::Unauthenticated,
            StatusCode::FORBIDDEN => LibraryError::Forbidden,
            StatusCode::NOT_FOUND => LibraryError::NotFound(message("Not found")),
            StatusCode::CONFLICT => LibraryError::Conflict(message("The request conflicts with the current state")),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                LibraryError::Validation(message("Invalid request"))
            }
            StatusCode::REQUEST_TIMEOUT => LibraryError::Timeout,
            _ => LibraryError::Api {
                status: status.as_u16(),
                message: message("Something went wrong. Please try again later."),
            },
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
