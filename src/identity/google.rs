use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::{ExchangedTokens, IdentityError, IdentityProvider, Profile};
use crate::config::GoogleConfig;

const PERSON_FIELDS: &str = "names,photos,emailAddresses";

/// Google OAuth 2.0 token endpoint plus the People API `people/me` lookup.
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    http: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    profile_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            token_url: cfg.token_url.clone(),
            profile_url: cfg.profile_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExchangedTokens, IdentityError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "token exchange request failed");
                IdentityError::UpstreamExchange
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            warn!(error = %err, "token exchange body unreadable");
            IdentityError::UpstreamExchange
        })?;

        if !status.is_success() {
            let err = classify_exchange_error(&body);
            warn!(status = status.as_u16(), error = %err, "token exchange rejected");
            return Err(err);
        }

        parse_token_response(&body)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, IdentityError> {
        let response = self
            .http
            .get(&self.profile_url)
            .bearer_auth(access_token)
            .query(&[("personFields", PERSON_FIELDS)])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "profile request failed");
                internal_profile_error()
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| {
            warn!(error = %err, "profile body unreadable");
            internal_profile_error()
        })?;

        if !(200..300).contains(&status) {
            let err = classify_profile_error(status, &body);
            warn!(status, error = %err, "profile lookup rejected");
            return Err(err);
        }

        parse_profile(&body)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u16,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default)]
    names: Vec<PersonName>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonName {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    url: Option<String>,
}

fn classify_exchange_error(body: &str) -> IdentityError {
    let code = serde_json::from_str::<OAuthErrorBody>(body)
        .map(|body| body.error)
        .unwrap_or_default();
    match code.as_str() {
        "invalid_grant" => IdentityError::InvalidGrant,
        "invalid_request" | "redirect_uri_mismatch" => IdentityError::InvalidRedirect,
        _ => IdentityError::UpstreamExchange,
    }
}

fn parse_token_response(body: &str) -> Result<ExchangedTokens, IdentityError> {
    let parsed = serde_json::from_str::<TokenResponse>(body).map_err(|err| {
        warn!(error = %err, "token exchange payload malformed");
        IdentityError::UpstreamExchange
    })?;
    Ok(ExchangedTokens {
        access_token: parsed.access_token,
        id_token: parsed.id_token,
        expires_in: parsed.expires_in,
    })
}

fn internal_profile_error() -> IdentityError {
    IdentityError::UpstreamProfile {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: crate::error::GENERIC_INTERNAL_MESSAGE.to_string(),
    }
}

fn classify_profile_error(status: u16, body: &str) -> IdentityError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) => IdentityError::UpstreamProfile {
            status: StatusCode::from_u16(error.code)
                .or_else(|_| StatusCode::from_u16(status))
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: error.message,
        },
        Err(_) => IdentityError::UpstreamProfile {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: crate::error::GENERIC_INTERNAL_MESSAGE.to_string(),
        },
    }
}

fn parse_profile(body: &str) -> Result<Profile, IdentityError> {
    let person = serde_json::from_str::<Person>(body).map_err(|err| {
        warn!(error = %err, "profile payload malformed");
        internal_profile_error()
    })?;

    let email = person
        .email_addresses
        .into_iter()
        .next()
        .and_then(|entry| entry.value)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| IdentityError::UpstreamProfile {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Profile has no email address".to_string(),
        })?;
    let name = person
        .names
        .into_iter()
        .next()
        .and_then(|entry| entry.display_name)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| email.clone());
    let photo_url = person.photos.into_iter().next().and_then(|entry| entry.url);

    Ok(Profile {
        name,
        email,
        photo_url,
    })
}
