// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, email, utils};

// Re-export commonly used types
pub use modules::auth::errors::{ConflictField, ServiceError};
pub use modules::auth::principal::{Principal, Role};
pub use modules::auth::service::AccountService;
pub use modules::auth::store::{Account, AccountStore};
pub use modules::auth::tokens::{ResetToken, ResetTokenService};
pub use modules::config::ServiceConfig;
pub use modules::email::Mailer;

// Constants
pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const RESET_TOKEN_TTL: u64 = 3600;
pub const RESET_TOKEN_BYTES: usize = 32;
pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SALT_BYTES: usize = 16;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
pub type AccountId = u64;
