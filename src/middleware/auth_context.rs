use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest,
};
use mongodb::bson::oid::ObjectId;

use crate::models::user::UserRole;

/// The authenticated caller, freshly loaded from the store by
/// `AuthMiddleware`. Role comes from the user record, never from the token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<CurrentUser>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(ErrorUnauthorized("User not authenticated")))
        }
    }
}

/// Pure ownership predicates, run after the resource is loaded and before
/// anything is mutated.
pub fn owns(owner: &ObjectId, user: &CurrentUser) -> bool {
    *owner == user.id
}

pub fn owns_or_admin(owner: &ObjectId, user: &CurrentUser) -> bool {
    user.role == UserRole::Admin || *owner == user.id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: ObjectId, role: UserRole) -> CurrentUser {
        CurrentUser {
            id,
            email: "t@x.com".to_string(),
            role,
        }
    }

    #[test]
    fn owner_passes_both_checks() {
        let id = ObjectId::new();
        let caller = user(id, UserRole::User);
        assert!(owns(&id, &caller));
        assert!(owns_or_admin(&id, &caller));
    }

    #[test]
    fn stranger_fails_both_checks() {
        let caller = user(ObjectId::new(), UserRole::User);
        let other = ObjectId::new();
        assert!(!owns(&other, &caller));
        assert!(!owns_or_admin(&other, &caller));
    }

    #[test]
    fn admin_overrides_ownership_only_where_allowed() {
        let caller = user(ObjectId::new(), UserRole::Admin);
        let other = ObjectId::new();
        assert!(!owns(&other, &caller));
        assert!(owns_or_admin(&other, &caller));
    }
}
