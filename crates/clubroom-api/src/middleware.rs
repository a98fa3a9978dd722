use axum::{extract::{Request, State}, middleware::Next, response::Response};

use clubroom_types::api::TokenKind;

use crate::auth::{AppState, bearer_token, decode_token};
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header. Refresh
/// tokens are only good for /refresh, never for normal routes.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;
    let claims = decode_token(&state.jwt_secret, token)?;

    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized("access token required"));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
