use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::Client;

use crate::config::AppConfig;
use crate::middleware::auth_context::CurrentUser;
use crate::services::token_service::{verify_token, TokenError};

/// Bearer-token authentication. The token only identifies the account; the
/// user record is re-loaded from the store on every request so deactivation
/// and role changes take effect immediately, without a token blacklist.
///
/// Per-request flow: no/malformed header -> 401; invalid or expired token ->
/// 401; unknown or inactive account -> 401; otherwise a fresh `CurrentUser`
/// is attached to the request and the inner service runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match bearer_token(&req) {
                Some(token) => token,
                None => return Err(ErrorUnauthorized("No authorization header")),
            };

            let config = req
                .app_data::<web::Data<AppConfig>>()
                .ok_or_else(|| ErrorInternalServerError("Server configuration missing"))?;

            let claims = match verify_token(&token, &config.jwt_secret) {
                Ok(claims) => claims,
                Err(TokenError::Expired) => return Err(ErrorUnauthorized("Token expired")),
                Err(TokenError::Invalid) => return Err(ErrorUnauthorized("Invalid token")),
            };

            let user_id = ObjectId::parse_str(&claims.sub)
                .map_err(|_| ErrorUnauthorized("Invalid token"))?;

            let client = req
                .app_data::<web::Data<Arc<Client>>>()
                .ok_or_else(|| ErrorInternalServerError("Database handle missing"))?;

            let user = crate::db::mongo::users(client)
                .find_one(doc! { "_id": user_id })
                .await
                .map_err(|err| {
                    log::error!("Failed to load user for auth: {:?}", err);
                    ErrorInternalServerError("Failed to verify account")
                })?;

            let user = match user {
                Some(user) => user,
                None => return Err(ErrorUnauthorized("Account not found")),
            };
            if !user.is_active {
                return Err(ErrorUnauthorized("Account deactivated"));
            }

            req.extensions_mut().insert(CurrentUser {
                id: user_id,
                email: user.email,
                role: user.role,
            });

            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?;
    let value = header.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|token| token.to_string())
}
