use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::modules::auth::errors::{ConflictField, ServiceError};
use crate::modules::auth::password::hash_password;
use crate::modules::auth::principal::{require_admin, Principal, Role};
use crate::modules::auth::store::{Account, AccountChanges, AccountStore, NewAccount, StoreError};
use crate::modules::auth::tokens::ResetTokenService;
use crate::modules::auth::validation::{validate_email, validate_password, validate_username};
use crate::modules::config::ServiceConfig;
use crate::modules::email::{password_reset_email, Mailer};
use crate::modules::utils::logging::{log_identity_event, log_token_event};
use crate::modules::utils::time::{format_timestamp, unix_now};
use crate::AccountId;

/// Confirmation returned by both reset flows whether or not the target
/// account exists, so callers cannot enumerate registered emails
const RESET_CONFIRMATION: &str =
    "If an account exists with this email, you will receive reset instructions.";

/// Parse a JSON request body into a typed request. Non-well-formed input is
/// rejected before any other processing.
pub fn parse_request<T: serde::de::DeserializeOwned>(data: &str) -> Result<T, ServiceError> {
    serde_json::from_str(data).map_err(|_| ServiceError::MalformedInput)
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct CreatedAccount {
    pub id: AccountId,
    pub role: Role,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct SavedResponse {
    pub saved: bool,
}

/// Caller-facing projection of an account; never carries the password hash
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl AccountView {
    fn from_account(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            created_at: format_timestamp(account.created_at),
        }
    }
}

fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Required-field check applied right after parsing; empty strings are as
/// malformed as missing keys
fn ensure_present(fields: &[&str]) -> Result<(), ServiceError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ServiceError::MalformedInput);
    }
    Ok(())
}

fn map_store_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::DuplicateEmail => ServiceError::Conflict(ConflictField::Email),
        StoreError::DuplicateUsername => ServiceError::Conflict(ConflictField::Username),
        StoreError::AccountNotFound => ServiceError::NotFound,
        StoreError::InvalidToken => ServiceError::InvalidOrExpiredToken,
    }
}

/// Composes validator, store, hasher, token service and mailer into the
/// registration, administration and reset flows. Each call is request-scoped
/// and stateless: parse, authorize admin operations, validate fields in
/// order (username, email, password), check uniqueness (email before
/// username), mutate, respond.
pub struct AccountService {
    store: Arc<AccountStore>,
    tokens: ResetTokenService,
    mailer: Arc<dyn Mailer>,
    config: ServiceConfig,
}

impl AccountService {
    pub fn new(store: Arc<AccountStore>, mailer: Arc<dyn Mailer>, config: ServiceConfig) -> Self {
        let tokens = ResetTokenService::new(Arc::clone(&store), config.token_ttl);
        Self {
            store,
            tokens,
            mailer,
            config,
        }
    }

    /// Self-service registration. The role is always `user`; only an admin
    /// can create anything else.
    pub fn register(&self, req: &RegisterRequest) -> Result<MessageResponse, ServiceError> {
        ensure_present(&[&req.username, &req.email, &req.password])?;

        let username = normalize_username(&req.username);
        let email = normalize_email(&req.email);
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&req.password)?;

        let new = NewAccount {
            username: username.clone(),
            email,
            password_hash: hash_password(&req.password),
            role: Role::User,
            created_at: unix_now(),
        };
        match self.store.insert_account(new) {
            Ok(account) => {
                log_identity_event("register", &account.username, true, None);
                Ok(MessageResponse {
                    message: "User registered successfully".to_string(),
                })
            }
            Err(e) => {
                log_identity_event("register", &username, false, Some(&e.to_string()));
                Err(map_store_error(e))
            }
        }
    }

    /// View of the calling principal's own account
    pub fn profile(&self, principal: &Principal) -> Result<AccountView, ServiceError> {
        let account = self
            .store
            .get(principal.account_id)
            .ok_or(ServiceError::NotFound)?;
        Ok(AccountView::from_account(&account))
    }

    /// Self-service "forgot password". The reply is identical whether or not
    /// the email belongs to an account; a token is issued and mailed only on
    /// a hit.
    pub fn forgot_password(
        &self,
        req: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        ensure_present(&[&req.email])?;

        let email = normalize_email(&req.email);
        validate_email(&email)?;

        if let Some(account) = self.store.find_by_email(&email) {
            self.send_reset_notification(&account)?;
        }

        Ok(MessageResponse {
            message: RESET_CONFIRMATION.to_string(),
        })
    }

    /// Admin-only account creation with a chosen role. Anything other than
    /// `"admin"` falls back to `user`.
    pub fn create_account(
        &self,
        principal: &Principal,
        req: &CreateAccountRequest,
    ) -> Result<CreatedAccount, ServiceError> {
        require_admin(principal)?;
        ensure_present(&[&req.username, &req.email, &req.password])?;

        let username = normalize_username(&req.username);
        let email = normalize_email(&req.email);
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&req.password)?;

        let role = match req.role.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::User,
        };

        let new = NewAccount {
            username: username.clone(),
            email,
            password_hash: hash_password(&req.password),
            role,
            created_at: unix_now(),
        };
        match self.store.insert_account(new) {
            Ok(account) => {
                log_identity_event(
                    "create_account",
                    &account.username,
                    true,
                    Some(account.role.as_str()),
                );
                Ok(CreatedAccount {
                    id: account.id,
                    role: account.role,
                })
            }
            Err(e) => {
                log_identity_event("create_account", &username, false, Some(&e.to_string()));
                Err(map_store_error(e))
            }
        }
    }

    /// Admin-only listing of every account, ordered by id
    pub fn list_accounts(&self, principal: &Principal) -> Result<Vec<AccountView>, ServiceError> {
        require_admin(principal)?;

        let views = self
            .store
            .list_accounts()
            .iter()
            .sorted_by(|a, b| a.id.cmp(&b.id))
            .map(AccountView::from_account)
            .collect();
        Ok(views)
    }

    /// Admin-only partial update. Only supplied fields are revalidated and
    /// changed; an unrecognized role value is silently ignored rather than
    /// rejected.
    pub fn update_account(
        &self,
        principal: &Principal,
        id: AccountId,
        req: &UpdateAccountRequest,
    ) -> Result<SavedResponse, ServiceError> {
        require_admin(principal)?;

        let mut changes = AccountChanges::default();
        if let Some(username) = &req.username {
            let username = normalize_username(username);
            validate_username(&username)?;
            changes.username = Some(username);
        }
        if let Some(email) = &req.email {
            let email = normalize_email(email);
            validate_email(&email)?;
            changes.email = Some(email);
        }
        if let Some(role) = &req.role {
            changes.role = Role::parse(role);
        }

        match self.store.update_account(id, changes) {
            Ok(account) => {
                log_identity_event("update_account", &account.username, true, None);
                Ok(SavedResponse { saved: true })
            }
            Err(e) => Err(map_store_error(e)),
        }
    }

    /// Admin-only deletion. Outstanding reset tokens die with the account.
    pub fn delete_account(
        &self,
        principal: &Principal,
        id: AccountId,
    ) -> Result<MessageResponse, ServiceError> {
        require_admin(principal)?;

        match self.store.delete_account(id) {
            Ok(removed) => {
                log_identity_event("delete_account", &removed.username, true, None);
                Ok(MessageResponse {
                    message: "User deleted".to_string(),
                })
            }
            Err(e) => Err(map_store_error(e)),
        }
    }

    /// Admin-triggered reset email for another account
    pub fn admin_reset_password(
        &self,
        principal: &Principal,
        id: AccountId,
    ) -> Result<MessageResponse, ServiceError> {
        require_admin(principal)?;

        let account = self.store.get(id).ok_or(ServiceError::NotFound)?;
        self.send_reset_notification(&account)?;

        Ok(MessageResponse {
            message: RESET_CONFIRMATION.to_string(),
        })
    }

    /// Public token redemption; the token itself is the credential. The new
    /// password is validated before the token is touched, so a rejected
    /// password leaves the token redeemable.
    pub fn reset_password_with_token(
        &self,
        token: &str,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, ServiceError> {
        ensure_present(&[&req.password])?;
        validate_password(&req.password)?;

        let new_hash = hash_password(&req.password);
        match self.tokens.consume(token, &new_hash) {
            Ok(account_id) => {
                log_token_event("redeem", &account_id.to_string(), true, None);
                Ok(MessageResponse {
                    message: "Password has been reset successfully".to_string(),
                })
            }
            Err(StoreError::InvalidToken) => Err(ServiceError::InvalidOrExpiredToken),
            Err(e) => {
                log::error!("password reset failed: {}", e);
                Err(ServiceError::Internal)
            }
        }
    }

    /// Shared by the self-service and admin-triggered flows: issue a token
    /// and mail the redemption link. Delivery failure is logged but does not
    /// roll back the token; it stays valid.
    fn send_reset_notification(&self, account: &Account) -> Result<(), ServiceError> {
        let token = match self.tokens.issue(account) {
            Ok(token) => token,
            Err(e) => {
                log::error!("failed to issue reset token: {}", e);
                return Err(ServiceError::Internal);
            }
        };

        let reset_link = self.config.reset_link(&token.token);
        let (subject, body) = password_reset_email(&account.username, &reset_link);
        match self.mailer.send(&account.email, &subject, &body) {
            Ok(_) => log_token_event("reset_email", &account.email, true, None),
            Err(e) => log_token_event("reset_email", &account.email, false, Some(&e)),
        }
        Ok(())
    }
}
