//! Session tokens issued by the identity provider.
//!
//! A token has the form `{user_id}.{hex hmac-sha256(user_id)}`, keyed with the
//! secret shared with the provider.

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SESSION_COOKIE: &str = "mediashare_session";

type HmacSha256 = Hmac<Sha256>;

/// The signed-in user, inserted into request extensions by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[derive(Clone)]
pub struct SessionVerifier {
    secret: Vec<u8>,
}

impl SessionVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.secret).expect("hmac key of any size")
    }

    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        format!("{}.{}", user_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the user id when the token carries a valid signature.
    pub fn verify(&self, token: &str) -> Option<AuthUser> {
        let (user_id, signature) = token.rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(AuthUser(user_id.to_string()))
    }
}
