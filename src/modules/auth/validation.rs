/// Validation failures for credential-bearing fields. Each variant names the
/// field and the rule it broke; checks stop at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    UsernameTooShort,
    UsernameTooLong,
    UsernameInvalidCharset,
    EmailInvalidFormat,
    EmailTooLong,
    PasswordTooShort,
    PasswordMissingLetter,
    PasswordMissingDigit,
}

impl ValidationError {
    /// Caller-facing message for each rule
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::UsernameTooShort | ValidationError::UsernameTooLong => {
                "Username must be between 3 and 50 characters"
            }
            ValidationError::UsernameInvalidCharset => {
                "Username can only contain letters, numbers, dots, hyphens and underscores"
            }
            ValidationError::EmailInvalidFormat => "Please enter a valid email address",
            ValidationError::EmailTooLong => "Email cannot be longer than 180 characters",
            ValidationError::PasswordTooShort => "Password must be at least 8 characters long",
            ValidationError::PasswordMissingLetter => "Password must contain at least one letter",
            ValidationError::PasswordMissingDigit => "Password must contain at least one number",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Function to validate a username: 3-50 characters from [A-Za-z0-9_.-]
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if length < 3 {
        return Err(ValidationError::UsernameTooShort);
    }
    if length > 50 {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::UsernameInvalidCharset);
    }
    Ok(())
}

/// Function to validate email syntax. Callers must normalize (trim,
/// lowercase) before calling.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !is_well_formed_email(email) {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if email.chars().count() > 180 {
        return Err(ValidationError::EmailTooLong);
    }
    Ok(())
}

/// Single-@ local@domain grammar with a dotted domain and no whitespace
fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    if email.matches('@').count() != 1 {
        return false;
    }
    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Function to validate password strength: at least 8 characters with one
/// letter and one digit. No upper bound and no special characters required.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::PasswordMissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    Ok(())
}
