//! Access control list middleware for the storefront server.
//! This middleware can be placed on any route or service that sits behind the access token middleware.
//!
//! It checks the claims of the verified access token against the required roles for the route. If the user has all the
//! required roles, the request will be allowed to continue. Otherwise, a 403 Forbidden response will be returned.
use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ok, Ready};
use log::*;
use storefront_engine::db_types::Role;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let jwt_claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
                warn!("💻️ No JWT claims found in request extensions for {}", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            if required_roles.iter().all(|role| jwt_claims.roles.contains(role)) {
                service.call(req).await
            } else {
                debug!("💻️ {} does not have the roles required for {}", jwt_claims.sub, req.path());
                Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(
                    "Insufficient permissions.".into(),
                ))
                .into())
            }
        })
    }
}
