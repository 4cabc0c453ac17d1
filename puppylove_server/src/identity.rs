//! Request identities.
//!
//! Users authenticate against the upstream gateway, which forwards the caller's roll number in the `X-Roll-No` header
//! (and their account id in `X-User-Id`). Admin routes carry a shared token in `X-Admin-Token`, which is checked
//! against the configured [`AdminCredentials`].
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::*;
use plv_common::Secret;
use uuid::Uuid;

use crate::errors::ServerError;

pub const ROLL_NO_HEADER: &str = "X-Roll-No";
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

fn header_value<'r>(req: &'r HttpRequest, name: &'static str) -> Result<&'r str, ServerError> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ServerError::MissingIdentity(name))
}

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollNo(pub String);

impl RollNo {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromRequest for RollNo {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(header_value(req, ROLL_NO_HEADER).map(|s| RollNo(s.to_string())))
    }
}

/// The account id of the authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = header_value(req, USER_ID_HEADER).and_then(|s| {
            Uuid::parse_str(s).map(UserId).map_err(|e| {
                debug!("💻️ Could not parse user id '{s}'. {e}");
                ServerError::MissingIdentity(USER_ID_HEADER)
            })
        });
        ready(result)
    }
}

/// The admin token every admin route is checked against.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    token: Secret<String>,
}

impl AdminCredentials {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

/// Proof that the request carried the admin token.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl FromRequest for Admin {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(check_admin_token(req))
    }
}

fn check_admin_token(req: &HttpRequest) -> Result<Admin, ServerError> {
    let creds = req.app_data::<web::Data<AdminCredentials>>().ok_or_else(|| {
        error!("💻️ No admin credentials have been configured. Refusing admin request.");
        ServerError::InsufficientPermissions("Admin access is not configured".into())
    })?;
    let token = header_value(req, ADMIN_TOKEN_HEADER)?;
    if creds.token.matches(token) {
        Ok(Admin)
    } else {
        warn!("💻️ Invalid admin token presented for {}", req.path());
        Err(ServerError::InsufficientPermissions("Invalid admin token".into()))
    }
}
