//! Token plumbing for the HTTP surface.
//!
//! Two token kinds flow through here. A *login token* is minted by the external credential module; the
//! `/auth` route validates it, checks the account against the engine, and answers with an *access token*
//! minted by [`TokenIssuer`]. Every protected route then recovers [`JwtClaims`] from the access token via
//! the `FromRequest` extractor. Identity checks happen in the extractor; authorization stays an explicit
//! predicate in each handler.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use parkside_engine::{db_types::Role, traits::LoginIdentity};
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

/// Claims carried by an access token issued by this server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The account's email.
    pub sub: String,
    pub user_id: i64,
    pub role: Role,
    pub exp: i64,
}

impl JwtClaims {
    /// The authorization predicate for administrative routes.
    pub fn require_admin(&self) -> Result<(), crate::errors::ServerError> {
        if self.role.may_administer() {
            Ok(())
        } else {
            Err(crate::errors::ServerError::InsufficientPermissions(format!(
                "The {} role may not perform this operation",
                self.role
            )))
        }
    }
}

/// What the credential module asserts about a subject: an email, an expiry, and optionally the role the
/// bearer wishes to act as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginToken {
    pub sub: String,
    #[serde(default)]
    pub desired_role: Option<Role>,
    pub exp: i64,
}

/// Validates a login token against the shared login secret and returns its claims.
pub fn check_login_token<S: AsRef<str>>(token: S, config: &AuthConfig) -> Result<LoginToken, AuthError> {
    let key = DecodingKey::from_secret(config.login_secret.reveal().as_bytes());
    let data = decode::<LoginToken>(token.as_ref(), &key, &Validation::default())
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;
    debug!("🔑️ Login token validated for {}", data.claims.sub);
    Ok(data.claims)
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes()),
            lifetime: config.access_token_lifetime,
        }
    }

    /// Issue a new access token for the given identity. This method DOES NOT verify that the identity is
    /// legitimate; that must be done prior to calling `issue_token`.
    pub fn issue_token(&self, identity: &LoginIdentity) -> Result<String, AuthError> {
        let claims = JwtClaims {
            sub: identity.email.clone(),
            user_id: identity.user_id,
            role: identity.role,
            exp: (Utc::now() + self.lifetime).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }

    pub fn decode_claims(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(data.claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = crate::errors::ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, crate::errors::ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| crate::errors::ServerError::InitializeError("TokenIssuer is not configured".into()))?;
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))?;
    let claims = issuer.decode_claims(token)?;
    Ok(claims)
}
