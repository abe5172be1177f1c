// clinic_shop/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";

/// The caller's identity.
///
/// Authentication happens upstream: either a middleware has already placed an
/// `AuthenticatedUser` in the request extensions, or the trusted gateway
/// forwards the user id in `X-User-ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
      return ready(Ok(*user));
    }

    let from_header = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    match from_header {
      Some(user_id) => ready(Ok(AuthenticatedUser { user_id })),
      None => {
        warn!("AuthenticatedUser extractor: missing or invalid {} header.", USER_ID_HEADER);
        ready(Err(AppError::Auth("User authentication required.".to_string())))
      }
    }
  }
}
