use crate::modules::auth::validation::ValidationError;

/// Which uniqueness invariant a conflicting write violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Username,
    Email,
}

/// Caller-visible outcome of a failed service operation. Validation,
/// conflict, forbidden and not-found surface verbatim; anything unexpected
/// is logged for operators and collapsed into Internal so raw causes never
/// reach the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    MalformedInput,
    Validation(ValidationError),
    Conflict(ConflictField),
    Forbidden,
    NotFound,
    InvalidOrExpiredToken,
    Internal,
}

impl ServiceError {
    pub fn message(&self) -> &'static str {
        match self {
            ServiceError::MalformedInput => "All fields are required",
            ServiceError::Validation(e) => e.message(),
            ServiceError::Conflict(ConflictField::Email) => "Email is already registered",
            ServiceError::Conflict(ConflictField::Username) => "Username is already taken",
            ServiceError::Forbidden => "Access denied",
            ServiceError::NotFound => "Not found",
            ServiceError::InvalidOrExpiredToken => "Invalid or expired token",
            ServiceError::Internal => "Something went wrong, please try again later",
        }
    }

    /// Status code the HTTP layer maps this outcome to
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::MalformedInput | ServiceError::Validation(_) => 400,
            ServiceError::Forbidden => 403,
            ServiceError::NotFound | ServiceError::InvalidOrExpiredToken => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Internal => 500,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Validation(e)
    }
}
