use std::sync::{Arc, LazyLock};

use anyhow::Result;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Form, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use regex::Regex;
use tracing::info;

use clubroom_db::Database;
use clubroom_db::models::MemberRow;
use clubroom_types::api::{
    Claims, LoginRequest, MemberResponse, RefreshResponse, RegisterRequest, TokenKind,
    TokenResponse,
};
use clubroom_types::domain::Role;

use crate::error::ApiError;
use crate::portal::PortalVerifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub portal: Arc<dyn PortalVerifier>,
}

impl AppStateInner {
    /// Runs a blocking store operation off the async runtime.
    pub async fn run_db<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", e)))?
            .map_err(ApiError::Internal)
    }
}

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{3,31}$").unwrap());
static STUDENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{9,10}$").unwrap());

/// At least 8 characters with a letter and a digit; a limited set of
/// punctuation is allowed. (The regex crate has no lookahead, so this is a
/// plain scan.)
pub fn password_is_acceptable(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!@#$%^&*()_+=-".contains(c))
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, digest: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored hash unparsable: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn access_ttl() -> chrono::Duration {
    chrono::Duration::minutes(30)
}

fn refresh_ttl() -> chrono::Duration {
    chrono::Duration::days(14)
}

/// Issues a token for `username`; returns the token and its unix expiry.
fn issue_token(
    secret: &str,
    username: &str,
    kind: TokenKind,
    ttl: chrono::Duration,
) -> Result<(String, i64)> {
    let expires_at = (chrono::Utc::now() + ttl).timestamp();
    let claims = Claims {
        sub: username.to_string(),
        kind,
        exp: expires_at as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, expires_at))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token"))
}

/// Resolves the token's subject to a live member row. A token for a deleted
/// account is treated as unauthorized, not as an internal error.
pub async fn current_member(state: &AppState, claims: &Claims) -> Result<MemberRow, ApiError> {
    let username = claims.sub.clone();
    state
        .run_db(move |db| db.get_member_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized("account no longer exists"))
}

pub fn require_board(member: &MemberRow) -> Result<(), ApiError> {
    if member.role.is_board() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn member_response(member: MemberRow) -> MemberResponse {
    MemberResponse {
        student_id: member.student_id,
        real_name: member.real_name,
        username: member.username,
        role: member.role,
    }
}

/// POST /register — portal-verified signup. The portal confirms standing and
/// supplies the display name; the submitted one is only a fallback.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !STUDENT_ID_PATTERN.is_match(&req.portal_id) {
        return Err(ApiError::Validation("malformed student id".into()));
    }
    // Graduate-school ids (5th digit '2') are not eligible.
    if req.portal_id.chars().nth(4) == Some('2') {
        return Err(ApiError::Forbidden);
    }
    if !USERNAME_PATTERN.is_match(&req.username) {
        return Err(ApiError::Validation("unusable login name".into()));
    }
    if !password_is_acceptable(&req.password) {
        return Err(ApiError::Validation("password does not meet the policy".into()));
    }

    let verified_name = state
        .portal
        .verify(&req.portal_id, &req.portal_pw)
        .await
        .map_err(|e| {
            tracing::error!("portal unreachable: {:#}", e);
            ApiError::Upstream
        })?
        .ok_or(ApiError::Forbidden)?;

    let student_id = req.portal_id.clone();
    if state
        .run_db(move |db| db.get_member(&student_id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("student id already registered".into()));
    }

    let username = req.username.clone();
    if state
        .run_db(move |db| db.get_member_by_username(&username))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("login name already taken".into()));
    }

    let real_name = if verified_name.is_empty() {
        req.real_name.clone()
    } else {
        verified_name
    };
    let row = MemberRow {
        student_id: req.portal_id.clone(),
        real_name,
        username: req.username.clone(),
        password: hash_password(&req.password)?,
        role: Role::Member,
    };

    let created = state
        .run_db(move |db| {
            db.create_member(&row)?;
            db.get_member(&row.student_id)
        })
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("member vanished after insert")))?;

    info!("registered member {}", created.student_id);
    Ok((StatusCode::CREATED, Json(member_response(created))))
}

/// POST /token — password login, answered with an access/refresh token pair.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = form.username.clone();
    let member = state
        .run_db(move |db| db.get_member_by_username(&username))
        .await?
        .ok_or(ApiError::Unauthorized("wrong login name or password"))?;

    if !verify_password(&form.password, &member.password)? {
        return Err(ApiError::Unauthorized("wrong login name or password"));
    }

    let (access_token, expires_at) = issue_token(
        &state.jwt_secret,
        &member.username,
        TokenKind::Access,
        access_ttl(),
    )?;
    let (refresh_token, _) = issue_token(
        &state.jwt_secret,
        &member.username,
        TokenKind::Refresh,
        refresh_ttl(),
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        refresh_token,
        expires_at,
    }))
}

/// POST /refresh — exchanges a refresh token (sent as the bearer token) for
/// a fresh access token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;
    let claims = decode_token(&state.jwt_secret, token)?;
    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::Unauthorized("refresh token required"));
    }

    let (access_token, expires_at) = issue_token(
        &state.jwt_secret,
        &claims.sub,
        TokenKind::Access,
        access_ttl(),
    )?;
    Ok(Json(RefreshResponse {
        access_token,
        expires_at,
    }))
}

pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("missing bearer token"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::StubPortal;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            portal: Arc::new(StubPortal {
                id: "202012345".into(),
                pw: "portal-pw".into(),
                name: "Kim".into(),
            }),
        })
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            portal_id: "202012345".into(),
            portal_pw: "portal-pw".into(),
            real_name: "Kim".into(),
            username: "kim01".into(),
            password: "Abcd1234!".into(),
        }
    }

    #[test]
    fn password_policy() {
        assert!(password_is_acceptable("Abcd1234!"));
        assert!(password_is_acceptable("longenough1"));
        assert!(!password_is_acceptable("short1"));
        assert!(!password_is_acceptable("lettersonly"));
        assert!(!password_is_acceptable("12345678"));
        assert!(!password_is_acceptable("has spaces 99"));
    }

    #[test]
    fn token_round_trip() {
        let (token, _) =
            issue_token("s3cret", "kim01", TokenKind::Access, access_ttl()).unwrap();
        let claims = decode_token("s3cret", &token).unwrap();
        assert_eq!(claims.sub, "kim01");
        assert_eq!(claims.kind, TokenKind::Access);

        assert!(decode_token("other-secret", &token).is_err());
    }

    #[tokio::test]
    async fn register_then_fetch_never_exposes_plaintext() {
        let state = test_state();
        register(State(state.clone()), Json(register_request()))
            .await
            .expect("registration should succeed");

        let member = state.db.get_member("202012345").unwrap().unwrap();
        assert_eq!(member.username, "kim01");
        assert_eq!(member.real_name, "Kim");
        assert_ne!(member.password, "Abcd1234!");
        assert!(verify_password("Abcd1234!", &member.password).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_duplicates_with_conflict() {
        let state = test_state();
        register(State(state.clone()), Json(register_request()))
            .await
            .unwrap();

        let result = register(State(state.clone()), Json(register_request())).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_rejects_bad_portal_credentials() {
        let state = test_state();
        let mut req = register_request();
        req.portal_pw = "wrong".into();
        let result = register(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn register_rejects_graduate_ids() {
        let state = test_state();
        let mut req = register_request();
        req.portal_id = "202225678".into();
        let result = register(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let state = test_state();
        let mut req = register_request();
        req.password = "short".into();
        let result = register(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn login_issues_usable_access_token() {
        let state = test_state();
        register(State(state.clone()), Json(register_request()))
            .await
            .unwrap();

        let form = LoginRequest {
            username: "kim01".into(),
            password: "Abcd1234!".into(),
        };
        // exercised end to end through the router in clubroom-server; here we
        // only check the issued claims
        let _ = login(State(state.clone()), Form(form)).await.unwrap();

        let (token, _) = issue_token(
            &state.jwt_secret,
            "kim01",
            TokenKind::Access,
            access_ttl(),
        )
        .unwrap();
        let claims = decode_token(&state.jwt_secret, &token).unwrap();
        let member = current_member(&state, &claims).await.unwrap();
        assert_eq!(member.student_id, "202012345");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let state = test_state();
        register(State(state.clone()), Json(register_request()))
            .await
            .unwrap();

        let form = LoginRequest {
            username: "kim01".into(),
            password: "Wrong999!".into(),
        };
        let result = login(State(state), Form(form)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
