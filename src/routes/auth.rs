use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
    routing::post,
};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{IssuedTokens, tokens::ID_TOKEN_TTL_SECS},
    response::ApiResult,
    routes::extract::{AuthUser, ClientIp, ID_TOKEN_COOKIE, RequiredFields, ValidatedJson},
    services::ServiceContext,
    state::AppState,
};

const LOGIN_MESSAGE: &str = "Logged in successfully";
const REFRESH_MESSAGE: &str = "Refresh token successfully";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub code: String,
    #[serde(rename = "redirectUri")]
    pub redirect_uri: String,
}

impl RequiredFields for LoginRequest {
    const REQUIRED: &'static [&'static str] = &["code", "redirectUri"];
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RequiredFields for RefreshRequest {
    const REQUIRED: &'static [&'static str] = &["refresh_token"];
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub id_token: String,
    /// Identity token expiry, unix milliseconds.
    pub expiry_date: i64,
    pub refresh_token: String,
}

impl SessionResponse {
    fn new(message: &'static str, issued: IssuedTokens) -> Self {
        Self {
            message,
            expiry_date: issued.id_token_expires_at.timestamp_millis(),
            id_token: issued.id_token,
            refresh_token: issued.refresh_token,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<Response> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services.session(state.identity.as_ref(), &state.tokens);
    let issued = session
        .login(&body.code, &body.redirect_uri, &client_ip)
        .await?;

    Ok(session_response(&state, LOGIN_MESSAGE, issued))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> ApiResult<Response> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services.session(state.identity.as_ref(), &state.tokens);
    let issued = session.refresh(&body.refresh_token, &client_ip).await?;

    Ok(session_response(&state, REFRESH_MESSAGE, issued))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ClientIp(client_ip): ClientIp,
) -> ApiResult<Response> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services.session(state.identity.as_ref(), &state.tokens);
    session.revoke_all(&client_ip, user.id).await?;

    let cleared = cleared_id_token_cookie(cookie_secure(&state));
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, cleared.to_string()),
        ],
    )
        .into_response())
}

fn session_response(state: &AppState, message: &'static str, issued: IssuedTokens) -> Response {
    let cookie = id_token_cookie(&issued.id_token, cookie_secure(state));
    (
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Json(SessionResponse::new(message, issued)),
    )
        .into_response()
}

fn cookie_secure(state: &AppState) -> bool {
    state
        .config
        .auth
        .as_ref()
        .map(|auth| auth.cookie_secure)
        .unwrap_or(true)
}

fn id_token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((ID_TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .secure(secure)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(ID_TOKEN_TTL_SECS))
        .build()
}

fn cleared_id_token_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = id_token_cookie("", secure);
    cookie.make_removal();
    cookie
}
