use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::modules::auth::principal::Role;
use crate::modules::auth::tokens::ResetToken;
use crate::AccountId;

/// Failure kinds reported by the store contract. Duplicate variants name the
/// violated field so callers can surface a field-specific conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    DuplicateEmail,
    DuplicateUsername,
    AccountNotFound,
    InvalidToken,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StoreError::DuplicateEmail => "email is already registered",
            StoreError::DuplicateUsername => "username is already taken",
            StoreError::AccountNotFound => "account not found",
            StoreError::InvalidToken => "token is invalid, expired or consumed",
        };
        f.write_str(text)
    }
}

impl std::error::Error for StoreError {}

/// A registered identity. Immutable value record; every transition goes
/// through the store so the uniqueness invariants hold at all times.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: u64,
}

/// Fields for a conditional insert. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: u64,
}

/// Fields for a conditional update; None leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Container for all accounts and outstanding reset tokens
#[derive(Serialize, Deserialize)]
struct StoreInner {
    next_id: AccountId,
    accounts: HashMap<AccountId, Account>,
    reset_tokens: HashMap<String, ResetToken>,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            next_id: 1,
            accounts: HashMap::new(),
            reset_tokens: HashMap::new(),
        }
    }
}

/// Single source of truth for accounts and reset tokens. Every operation is
/// one critical section, so check-then-act sequences (uniqueness check +
/// insert, token lookup + consume) cannot interleave with other writers.
pub struct AccountStore {
    inner: Mutex<StoreInner>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Conditional insert: under the lock, an existing email (checked first)
    /// or username fails the insert; otherwise the account gets the next id.
    /// Two concurrent identical registrations resolve to exactly one success.
    pub fn insert_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.lock();

        if inner.accounts.values().any(|a| a.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if inner.accounts.values().any(|a| a.username == new.username) {
            return Err(StoreError::DuplicateUsername);
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let account = Account {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: new.created_at,
        };
        inner.accounts.insert(id, account.clone());
        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.lock().accounts.get(&id).cloned()
    }

    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        self.lock()
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned()
    }

    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        self.lock()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned()
    }

    pub fn list_accounts(&self) -> Vec<Account> {
        self.lock().accounts.values().cloned().collect()
    }

    /// Conditional update: re-checks uniqueness against every other account
    /// under the same lock before applying the supplied fields.
    pub fn update_account(
        &self,
        id: AccountId,
        changes: AccountChanges,
    ) -> Result<Account, StoreError> {
        let mut inner = self.lock();

        if !inner.accounts.contains_key(&id) {
            return Err(StoreError::AccountNotFound);
        }
        if let Some(email) = &changes.email {
            if inner
                .accounts
                .values()
                .any(|a| a.id != id && a.email == *email)
            {
                return Err(StoreError::DuplicateEmail);
            }
        }
        if let Some(username) = &changes.username {
            if inner
                .accounts
                .values()
                .any(|a| a.id != id && a.username == *username)
            {
                return Err(StoreError::DuplicateUsername);
            }
        }

        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::AccountNotFound)?;
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(role) = changes.role {
            account.role = role;
        }
        Ok(account.clone())
    }

    /// Remove an account and every reset token it owns; a token never
    /// outlives its account.
    pub fn delete_account(&self, id: AccountId) -> Result<Account, StoreError> {
        let mut inner = self.lock();
        let removed = inner
            .accounts
            .remove(&id)
            .ok_or(StoreError::AccountNotFound)?;
        inner.reset_tokens.retain(|_, token| token.account_id != id);
        Ok(removed)
    }

    /// Conditional insert keyed by the token string. A collision on an
    /// unguessable 256-bit token means a caller bug, not bad luck.
    pub fn insert_reset_token(&self, token: ResetToken) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.reset_tokens.contains_key(&token.token) {
            return Err(StoreError::InvalidToken);
        }
        inner.reset_tokens.insert(token.token.clone(), token);
        Ok(())
    }

    /// Return the token record only if it exists, is unconsumed and is
    /// unexpired. Every other case is indistinguishable from "never existed".
    pub fn find_valid_token(&self, token: &str, now: u64) -> Option<ResetToken> {
        self.lock()
            .reset_tokens
            .get(token)
            .filter(|t| t.is_valid(now))
            .cloned()
    }

    /// Atomic redemption: in one critical section the token is checked for
    /// validity, the owning account's password hash is swapped, and the
    /// token is marked consumed and removed. A concurrent second redemption
    /// of the same token finds nothing and fails.
    pub fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: u64,
    ) -> Result<AccountId, StoreError> {
        let mut inner = self.lock();

        let account_id = match inner.reset_tokens.get_mut(token) {
            Some(record) if record.is_valid(now) => {
                record.consumed = true;
                record.account_id
            }
            _ => return Err(StoreError::InvalidToken),
        };

        if !inner.accounts.contains_key(&account_id) {
            // Orphaned token; drop it and report as never-existed
            inner.reset_tokens.remove(token);
            return Err(StoreError::InvalidToken);
        }
        if let Some(account) = inner.accounts.get_mut(&account_id) {
            account.password_hash = new_password_hash.to_string();
        }

        inner.reset_tokens.remove(token);
        Ok(account_id)
    }

    /// Sweep expired tokens. Consumed tokens are removed at redemption, so
    /// this only reclaims the ones left to lapse.
    pub fn purge_expired_tokens(&self, now: u64) -> usize {
        let mut inner = self.lock();
        let before = inner.reset_tokens.len();
        inner.reset_tokens.retain(|_, token| token.is_valid(now));
        before - inner.reset_tokens.len()
    }

    /// Write the store as a JSON snapshot
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let inner = self.lock();
        let data = serde_json::to_string_pretty(&*inner)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        File::create(path)?.write_all(data.as_bytes())
    }

    /// Load a store from a JSON snapshot. A missing file yields a fresh
    /// store; a corrupt one is an error rather than silent data loss.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e),
        };

        let mut data = String::new();
        file.read_to_string(&mut data)?;

        let inner: StoreInner = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
