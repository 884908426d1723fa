//! Access tokens
//!
//! Access tokens are HS256-signed JWTs. They are issued by the login route and carry the user's id, email address and
//! roles, so that authenticated routes do not need to touch the database to authorise a request.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Utc;
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use storefront_engine::db_types::{Role, User, UserId};

use crate::{
    config::AuthConfig,
    data_objects::AccessToken,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(with = "user_id_as_string")]
    pub sub: UserId,
    pub email: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

// The registered `sub` claim is a string
mod user_id_as_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use storefront_engine::db_types::UserId;

    pub fn serialize<S: Serializer>(id: &UserId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.value())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserId, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<i64>().map(UserId::from).map_err(serde::de::Error::custom)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            debug!("💻️ No access token claims found for {}", req.path());
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
    expiry: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, expiry: config.token_expiry }
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &User) -> Result<AccessToken, ServerError> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user.id,
            email: user.email.clone(),
            roles: user.role.granted_roles(),
            iat: now,
            exp: now + self.expiry.num_seconds(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
        trace!("💻️ Issued access token for {}", user.id);
        Ok(AccessToken::bearer(token, self.expiry.num_seconds()))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, validation: Validation::new(Algorithm::HS256) }
    }

    /// Checks the signature and expiry of the token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ValidationError("The access token has expired".into()),
            ErrorKind::InvalidSignature => AuthError::ValidationError("Signature has failed verification".into()),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }
}
