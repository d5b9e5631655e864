use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::modules::auth::store::{Account, AccountStore, StoreError};
use crate::modules::utils::time::unix_now;
use crate::{AccountId, RESET_TOKEN_BYTES};

/// Single-use, time-bounded credential permitting exactly one password
/// change for its owning account
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetToken {
    pub token: String,
    pub account_id: AccountId,
    pub created_at: u64,
    pub expires_at: u64,
    pub consumed: bool,
}

impl ResetToken {
    /// A token is valid iff it is unconsumed and the current time is before
    /// its expiry. Existence is the store's part of the predicate.
    pub fn is_valid(&self, now: u64) -> bool {
        !self.consumed && now < self.expires_at
    }
}

/// Generate a cryptographically unguessable token string: 32 random bytes
/// (256 bits), URL-safe base64 without padding so it embeds cleanly in a
/// redemption link.
pub fn generate_token_string() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..RESET_TOKEN_BYTES).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Token lifecycle over the shared store: issue, look up by validity,
/// consume. Notification is the orchestrator's concern; the raw token is
/// returned from issue only so it can reach the notification channel and is
/// never logged.
pub struct ResetTokenService {
    store: Arc<AccountStore>,
    ttl: u64,
}

impl ResetTokenService {
    pub fn new(store: Arc<AccountStore>, ttl: u64) -> Self {
        Self { store, ttl }
    }

    /// Create and persist a fresh token for the account, expiring ttl
    /// seconds from now. Multiple outstanding tokens per account may
    /// coexist; each is independently valid.
    pub fn issue(&self, account: &Account) -> Result<ResetToken, StoreError> {
        let now = unix_now();
        let token = ResetToken {
            token: generate_token_string(),
            account_id: account.id,
            created_at: now,
            expires_at: now + self.ttl,
            consumed: false,
        };
        self.store.insert_reset_token(token.clone())?;
        Ok(token)
    }

    /// Present, unconsumed and unexpired - anything else is None, so an
    /// expired token is indistinguishable from one that never existed.
    pub fn lookup_valid(&self, token: &str) -> Option<ResetToken> {
        self.store.find_valid_token(token, unix_now())
    }

    /// Exactly-once redemption: atomically swaps the owning account's
    /// password hash and retires the token.
    pub fn consume(&self, token: &str, new_password_hash: &str) -> Result<AccountId, StoreError> {
        self.store
            .consume_reset_token(token, new_password_hash, unix_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::principal::Role;
    use crate::modules::auth::store::NewAccount;
    use crate::RESET_TOKEN_TTL;

    fn store_with_account() -> (Arc<AccountStore>, Account) {
        let store = Arc::new(AccountStore::new());
        let account = store
            .insert_account(NewAccount {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "ab:cd".to_string(),
                role: Role::User,
                created_at: unix_now(),
            })
            .unwrap();
        (store, account)
    }

    #[test]
    fn test_token_string_shape() {
        let token = generate_token_string();

        // 32 bytes -> 43 base64url characters, no padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_strings_are_unique() {
        let first = generate_token_string();
        let second = generate_token_string();
        assert_ne!(first, second);
    }

    #[test]
    fn test_validity_predicate() {
        let token = ResetToken {
            token: generate_token_string(),
            account_id: 1,
            created_at: 1000,
            expires_at: 2000,
            consumed: false,
        };

        assert!(token.is_valid(1999));
        assert!(!token.is_valid(2000));
        assert!(!token.is_valid(3000));

        let consumed = ResetToken {
            consumed: true,
            ..token
        };
        assert!(!consumed.is_valid(1999));
    }

    #[test]
    fn test_issue_sets_ttl_window() {
        let (store, account) = store_with_account();
        let service = ResetTokenService::new(store, RESET_TOKEN_TTL);

        let before = unix_now();
        let token = service.issue(&account).unwrap();

        assert_eq!(token.account_id, account.id);
        assert_eq!(token.expires_at, token.created_at + RESET_TOKEN_TTL);
        assert!(token.created_at >= before);
        assert!(service.lookup_valid(&token.token).is_some());
    }

    #[test]
    fn test_lookup_unknown_token() {
        let (store, _) = store_with_account();
        let service = ResetTokenService::new(store, RESET_TOKEN_TTL);

        assert!(service.lookup_valid("no-such-token").is_none());
    }

    #[test]
    fn test_multiple_outstanding_tokens_coexist() {
        let (store, account) = store_with_account();
        let service = ResetTokenService::new(store, RESET_TOKEN_TTL);

        let first = service.issue(&account).unwrap();
        let second = service.issue(&account).unwrap();

        assert_ne!(first.token, second.token);
        assert!(service.lookup_valid(&first.token).is_some());
        assert!(service.lookup_valid(&second.token).is_some());

        // Consuming one leaves the other independently valid
        service.consume(&first.token, "11:22").unwrap();
        assert!(service.lookup_valid(&first.token).is_none());
        assert!(service.lookup_valid(&second.token).is_some());
    }

    #[test]
    fn test_consume_changes_hash_and_retires_token() {
        let (store, account) = store_with_account();
        let service = ResetTokenService::new(Arc::clone(&store), RESET_TOKEN_TTL);

        let token = service.issue(&account).unwrap();
        let redeemed = service.consume(&token.token, "11:22").unwrap();

        assert_eq!(redeemed, account.id);
        assert_eq!(store.get(account.id).unwrap().password_hash, "11:22");
        assert_eq!(
            service.consume(&token.token, "33:44"),
            Err(StoreError::InvalidToken)
        );
    }
}
