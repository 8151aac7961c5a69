use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    auth::{AuthError, UserClaims},
    error::AppError,
    state::AppState,
};

pub const ID_TOKEN_COOKIE: &str = "id_token";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Body keys that must be present before the body is deserialized.
pub trait RequiredFields {
    const REQUIRED: &'static [&'static str];
}

/// JSON body whose required keys were checked up front, so a missing key is
/// reported by name instead of as a serde error.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + RequiredFields,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        let missing = missing_keys(&body, T::REQUIRED);
        if !missing.is_empty() {
            return Err(AppError::bad_request(missing_keys_message(&missing)));
        }

        serde_json::from_value(body)
            .map(ValidatedJson)
            .map_err(|err| AppError::bad_request(format!("Invalid request body: {err}")))
    }
}

fn missing_keys<'a>(body: &Value, required: &[&'a str]) -> Vec<&'a str> {
    let mut missing: Vec<&'a str> = Vec::new();
    for key in required {
        let present = body.as_object().is_some_and(|map| map.contains_key(*key));
        if !present && !missing.contains(key) {
            missing.push(*key);
        }
    }
    missing
}

fn missing_keys_message(missing: &[&str]) -> String {
    let verb = if missing.len() > 1 { "are" } else { "is" };
    format!("Required parameter '{}' {verb} required", missing.join(", "))
}

/// Caller address used to scope credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(parts, state.config.general.trust_proxy)))
    }
}

fn client_ip(parts: &Parts, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Authenticated caller, from `Authorization: Bearer` or the `id_token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserClaims);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserClaims>().cloned() {
            return Ok(AuthUser(user));
        }

        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&parts.headers, ID_TOKEN_COOKIE))
            .ok_or_else(|| reject(AuthError::MissingToken))?;
        let user = state.tokens.verify(&token).map_err(reject)?;

        parts.extensions.insert(user.clone());
        Ok(AuthUser(user))
    }
}

fn reject(err: AuthError) -> AppError {
    AppError::from(err).at("authenticate")
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| cookie::Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::Body,
        extract::{ConnectInfo, FromRequest},
        http::{HeaderMap, HeaderValue, Request, header},
    };
    use serde::Deserialize;
    use serde_json::json;

    use super::{
        RequiredFields, ValidatedJson, bearer_token, client_ip, cookie_value, missing_keys,
        missing_keys_message,
    };

    #[derive(Debug, Deserialize)]
    struct LoginBody {
        code: String,
        #[serde(rename = "redirectUri")]
        redirect_uri: String,
    }

    impl RequiredFields for LoginBody {
        const REQUIRED: &'static [&'static str] = &["code", "redirectUri"];
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    #[test]
    fn message_pluralizes_by_count() {
        assert_eq!(
            missing_keys_message(&["code"]),
            "Required parameter 'code' is required"
        );
        assert_eq!(
            missing_keys_message(&["code", "redirectUri"]),
            "Required parameter 'code, redirectUri' are required"
        );
    }

    #[test]
    fn missing_keys_dedupes_and_ignores_non_objects() {
        assert_eq!(
            missing_keys(&json!({"code": "x"}), &["code", "redirectUri", "redirectUri"]),
            vec!["redirectUri"]
        );
        assert_eq!(
            missing_keys(&json!([1, 2]), &["code"]),
            vec!["code"]
        );
        assert!(missing_keys(&json!({"code": null}), &["code"]).is_empty());
    }

    #[tokio::test]
    async fn validated_json_rejects_missing_keys() {
        let err = ValidatedJson::<LoginBody>::from_request(json_request(r#"{"code":"abc"}"#), &())
            .await
            .err()
            .expect("extraction should fail");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Required parameter 'redirectUri' is required");
    }

    #[tokio::test]
    async fn validated_json_accepts_complete_body() {
        let ValidatedJson(body) = ValidatedJson::<LoginBody>::from_request(
            json_request(r#"{"code":"abc","redirectUri":"https://app/cb"}"#),
            &(),
        )
        .await
        .ok()
        .expect("extraction should succeed");
        assert_eq!(body.code, "abc");
        assert_eq!(body.redirect_uri, "https://app/cb");
    }

    #[tokio::test]
    async fn validated_json_rejects_malformed_json() {
        let err = ValidatedJson::<LoginBody>::from_request(json_request("{not json"), &())
            .await
            .err()
            .expect("extraction should fail");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn client_ip_prefers_first_forwarded_entry_when_trusted() {
        let (mut parts, _) = Request::get("/")
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
            .body(())
            .expect("request should build")
            .into_parts();
        let peer: SocketAddr = "10.0.0.9:5555".parse().expect("addr should parse");
        parts.extensions.insert(ConnectInfo(peer));

        assert_eq!(client_ip(&parts, true), "198.51.100.4");
        assert_eq!(client_ip(&parts, false), "10.0.0.9");
    }

    #[test]
    fn client_ip_without_any_source_is_unknown() {
        let (parts, _) = Request::get("/")
            .body(())
            .expect("request should build")
            .into_parts();
        assert_eq!(client_ip(&parts, true), "unknown");
    }

    #[test]
    fn tokens_come_from_bearer_header_or_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; id_token=cookie-token"),
        );
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(
            cookie_value(&headers, "id_token").as_deref(),
            Some("cookie-token")
        );

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("header-token"));
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("id_token="));
        assert_eq!(cookie_value(&headers, "id_token"), None);
    }
}
