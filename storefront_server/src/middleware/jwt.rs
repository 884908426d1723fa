//! Access token middleware.
//!
//! Wrap any scope or service that requires a logged-in user with this middleware. It reads the bearer token from the
//! `Authorization` header, verifies it, and stores the claims in the request extensions, where handlers (via the
//! [`JwtClaims`] extractor) and the ACL middleware can find them. Requests without a valid token are rejected with
//! 401 Unauthorized.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;

use crate::{
    auth::{JwtClaims, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    verifier: Rc<TokenVerifier>,
}

impl JwtMiddlewareFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        JwtMiddlewareFactory { verifier: Rc::new(verifier) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { verifier: Rc::clone(&self.verifier), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    verifier: Rc<TokenVerifier>,
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".into()))
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Rc::clone(&self.verifier);
        Box::pin(async move {
            let claims: JwtClaims = bearer_token(&req).and_then(|t| verifier.verify(&t)).map_err(|e| {
                debug!("💻️ Rejected request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            trace!("💻️ Access token accepted for {}", claims.sub);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
