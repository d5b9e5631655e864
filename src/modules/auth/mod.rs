pub mod errors;
pub mod password;
pub mod principal;
pub mod service;
pub mod store;
pub mod tokens;
pub mod validation;

// Re-export the main types and functions
pub use errors::{ConflictField, ServiceError};
pub use password::{hash_password, verify_password};
pub use principal::{require_admin, Principal, Role};
pub use service::AccountService;
pub use store::{Account, AccountStore, StoreError};
pub use tokens::{ResetToken, ResetTokenService};
pub use validation::{validate_email, validate_password, validate_username, ValidationError};
