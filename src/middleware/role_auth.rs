use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::middleware::auth_context::CurrentUser;
use crate::models::user::UserRole;

/// Role gate for routes inside an `AuthMiddleware`-wrapped scope. Reads the
/// `CurrentUser` the auth layer attached, so the role check always runs
/// against the stored record rather than token claims.
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user = req.extensions().get::<CurrentUser>().cloned();

        match user {
            Some(user) => {
                if user.role == self.required_role || user.role == UserRole::Admin {
                    Box::pin(self.service.call(req))
                } else {
                    log::debug!(
                        "Role check failed for {}: required {:?}, has {:?}",
                        user.id,
                        self.required_role,
                        user.role
                    );
                    Box::pin(ready(Err(ErrorForbidden("Insufficient permissions"))))
                }
            }
            None => Box::pin(ready(Err(ErrorUnauthorized("User not authenticated")))),
        }
    }
}
