//! Single-use confirmation tokens sent by email.
//!
//! A token is the hex HMAC-SHA256, keyed with the session secret, of the
//! action, the address and a random nonce. The pending confirmation is kept
//! in the key-value store under `confirm_email:<token>` until it is redeemed
//! or expires; redeeming removes it.

use std::time::Duration;

use hmac::{Hmac, Mac};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use rosewood_core::{AccountKind, ConfirmAction, Email};

use super::kv::{KvError, KvStore};

type HmacSha256 = Hmac<Sha256>;

/// Namespace of pending confirmations.
pub const CONFIRM_NAMESPACE: &str = "confirm_email";

/// What a token confirms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub action: ConfirmAction,
    pub kind: AccountKind,
    pub email: Email,
    /// Argon2 hash of the password chosen at registration.
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// Compute a token for `action` on `email` with the given nonce.
#[must_use]
pub fn sign(secret: &SecretString, action: ConfirmAction, email: &Email, nonce: &[u8]) -> String {
    let message = format!("{}:{}:{}", action.as_str(), email, hex::encode(nonce));
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return hex::encode(nonce);
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Issues and redeems confirmation tokens.
pub struct ConfirmTokens<'a> {
    kv: &'a KvStore,
    secret: &'a SecretString,
    ttl: Duration,
}

impl<'a> ConfirmTokens<'a> {
    #[must_use]
    pub const fn new(kv: &'a KvStore, secret: &'a SecretString, ttl: Duration) -> Self {
        Self { kv, secret, ttl }
    }

    /// Store a pending confirmation and return its token.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the confirmation cannot be stored.
    pub async fn issue(&self, pending: &PendingConfirmation) -> Result<String, KvError> {
        let nonce: [u8; 16] = rand::rng().random();
        let token = sign(self.secret, pending.action, &pending.email, &nonce);
        self.kv
            .set(CONFIRM_NAMESPACE, &token, pending, Some(self.ttl))
            .await?;
        tracing::debug!(action = pending.action.as_str(), kind = %pending.kind, "Issued confirmation token");
        Ok(token)
    }

    /// Consume a token. Returns `None` if it is unknown, expired or was issued
    /// for a different action; the token cannot be used again either way.
    ///
    /// # Errors
    ///
    /// Returns `KvError` if the stored confirmation cannot be read.
    pub async fn redeem(
        &self,
        token: &str,
        action: ConfirmAction,
    ) -> Result<Option<PendingConfirmation>, KvError> {
        let pending: Option<PendingConfirmation> = self.kv.take(CONFIRM_NAMESPACE, token).await?;
        Ok(pending.filter(|p| p.action == action))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("x7Kp2mQ9vR4tY8wZ3nB6cF1hJ5lD0sGa".to_owned())
    }

    fn pending(action: ConfirmAction) -> PendingConfirmation {
        PendingConfirmation {
            action,
            kind: AccountKind::User,
            email: Email::parse("buyer@example.com").unwrap(),
            password_hash: Some("$argon2id$...".to_owned()),
        }
    }

    #[test]
    fn test_sign_depends_on_every_input() {
        let secret = secret();
        let email = Email::parse("buyer@example.com").unwrap();
        let other = Email::parse("other@example.com").unwrap();
        let base = sign(&secret, ConfirmAction::Register, &email, b"nonce");

        assert_eq!(base.len(), 64);
        assert_eq!(base, sign(&secret, ConfirmAction::Register, &email, b"nonce"));
        assert_ne!(base, sign(&secret, ConfirmAction::ResetPassword, &email, b"nonce"));
        assert_ne!(base, sign(&secret, ConfirmAction::Register, &other, b"nonce"));
        assert_ne!(base, sign(&secret, ConfirmAction::Register, &email, b"other"));
        assert_ne!(
            base,
            sign(
                &SecretString::from("another-key".to_owned()),
                ConfirmAction::Register,
                &email,
                b"nonce"
            )
        );
    }

    #[tokio::test]
    async fn test_issue_and_redeem_once() {
        let kv = KvStore::new();
        let secret = secret();
        let tokens = ConfirmTokens::new(&kv, &secret, Duration::from_secs(60));

        let token = tokens.issue(&pending(ConfirmAction::Register)).await.unwrap();
        let redeemed = tokens.redeem(&token, ConfirmAction::Register).await.unwrap();
        assert_eq!(redeemed, Some(pending(ConfirmAction::Register)));

        assert_eq!(tokens.redeem(&token, ConfirmAction::Register).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_action_is_rejected() {
        let kv = KvStore::new();
        let secret = secret();
        let tokens = ConfirmTokens::new(&kv, &secret, Duration::from_secs(60));

        let token = tokens.issue(&pending(ConfirmAction::Register)).await.unwrap();
        assert_eq!(tokens.redeem(&token, ConfirmAction::ResetPassword).await.unwrap(), None);
        assert_eq!(tokens.redeem("unknown", ConfirmAction::Register).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tokens_are_unique_per_issue() {
        let kv = KvStore::new();
        let secret = secret();
        let tokens = ConfirmTokens::new(&kv, &secret, Duration::from_secs(60));

        let first = tokens.issue(&pending(ConfirmAction::Register)).await.unwrap();
        let second = tokens.issue(&pending(ConfirmAction::Register)).await.unwrap();
        assert_ne!(first, second);
    }
}
