use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{models::Role, token::TokenService};

/// Principal
///
/// The authenticated identity of a request, as carried in its token. Attached to the request
/// extensions by [`identify`] and read back by the [`Identity`] extractor. Never mutated once
/// attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Extracts the token from `Authorization: Bearer <token>`. Any other shape yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// identify
///
/// Request identity middleware, layered over the whole router.
///
/// It never rejects. A missing header, a malformed header or a token that fails validation all
/// leave the request anonymous; whether that is acceptable is decided per operation by the guard.
/// If a principal is already attached (the middleware ran earlier in the stack) it is left as is.
pub async fn identify(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<Principal>().is_none() {
        let validated = bearer_token(request.headers()).map(|token| tokens.validate(token));

        match validated {
            Some(Ok(claims)) => {
                let principal = Principal::from(claims);
                tracing::debug!(user_id = %principal.id, role = %principal.role, "request authenticated");
                request.extensions_mut().insert(principal);
            }
            Some(Err(e)) => {
                tracing::debug!("bearer token rejected, continuing anonymously: {}", e);
            }
            None => {}
        }
    }

    next.run(request).await
}

/// Identity
///
/// Handler-side view of the request's principal. `Identity(None)` means anonymous. Extraction
/// cannot fail; rejecting anonymous callers is the guard's job.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<Principal>);

impl Identity {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(parts.extensions.get::<Principal>().cloned()))
    }
}
