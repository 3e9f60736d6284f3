use crate::error::{LedgerError, Result};
use crate::schemas::UserNick;
use crate::service::LedgerService;
use actix_web::dev::Payload;
use actix_web::{http::header::HeaderValue, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::num::ParseIntError;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

const CREDENTIALS_ERROR: &str = "Could not validate credentials";

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LedgerError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Issues and checks bearer tokens of the form
/// `<username>.<expires_at>.<hex hmac>`.
#[derive(Clone)]
pub struct TokenKeys {
    key: Vec<u8>,
    lifetime: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, lifetime_minutes: i64) -> Self {
        let mut sha256_hasher = Sha256::new();
        sha256_hasher.update(secret.as_bytes());
        TokenKeys {
            key: sha256_hasher.finalize().to_vec(),
            lifetime: Duration::minutes(lifetime_minutes),
        }
    }

    pub fn issue(&self, username: &str) -> Result<String> {
        let expires_at = (Utc::now() + self.lifetime).timestamp();
        let payload = format!("{username}.{expires_at}");
        let signature = self.sign(&payload)?;
        let hex = signature
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        Ok(format!("{payload}.{hex}"))
    }

    /// Returns the username the token was issued to.
    pub fn verify(&self, token: &str) -> Result<UserNick> {
        let unauthorized = || LedgerError::Unauthorized(CREDENTIALS_ERROR.to_string());

        let mut parts = token.rsplitn(3, '.');
        let (Some(hex), Some(expires_at), Some(username)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(unauthorized());
        };
        if username.is_empty() || hex.len() % 2 != 0 {
            return Err(unauthorized());
        }

        let signature = hex
            .as_bytes()
            .chunks(2)
            .map(|n| u8::from_str_radix(std::str::from_utf8(n).unwrap_or("zz"), 16))
            .collect::<std::result::Result<Vec<u8>, ParseIntError>>()
            .map_err(|_| unauthorized())?;

        let mut mac = self.mac()?;
        mac.update(format!("{username}.{expires_at}").as_bytes());
        mac.verify_slice(&signature).map_err(|_| unauthorized())?;

        let expires_at: i64 = expires_at.parse().map_err(|_| unauthorized())?;
        if expires_at < Utc::now().timestamp() {
            return Err(unauthorized());
        }
        Ok(username.to_string())
    }

    fn sign(&self, payload: &str) -> Result<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| LedgerError::Internal(format!("invalid token key: {e}")))
    }
}

fn bearer_token(request: &HttpRequest) -> Option<String> {
    let authorization = request
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .map(HeaderValue::to_str)?
        .ok()?;
    let token = authorization
        .strip_prefix("Bearer ")
        .or_else(|| authorization.strip_prefix("bearer "))?;
    Some(token.trim().to_string())
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentMember(pub UserNick);

impl FromRequest for CurrentMember {
    type Error = LedgerError;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(request);
        let service = request.app_data::<web::Data<Arc<LedgerService>>>().cloned();
        Box::pin(async move {
            let token = token.ok_or_else(|| LedgerError::Unauthorized("Not authenticated".to_string()))?;
            let service = service
                .ok_or_else(|| LedgerError::Internal("ledger service is not configured".to_string()))?;
            let username = service.tokens().verify(&token)?;
            if !service.user_exists(&username).await? {
                return Err(LedgerError::Unauthorized(CREDENTIALS_ERROR.to_string()));
            }
            Ok(CurrentMember(username))
        })
    }
}
