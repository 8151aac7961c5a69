use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use uuid::Uuid;

use super::{AuthError, IdentityClaims, IssuedTokens, UserClaims};
use crate::config::AuthConfig;

pub const ID_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 5_259_600;
pub const REFRESH_TOKEN_BYTES: usize = 48;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

/// Issues identity/refresh token pairs and verifies identity tokens.
///
/// Minting is pure: it reads no storage and takes its clock and randomness
/// from the caller in [`TokenMinter::mint_at`].
#[derive(Clone)]
pub struct TokenMinter {
    keys: JwtKeys,
    issuer: String,
    audience: String,
}

impl TokenMinter {
    pub fn new(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn from_config(cfg: &AuthConfig, host: &str) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            cfg.issuer_or(host),
            cfg.audience_or(host),
        )
    }

    pub fn mint(&self, user: &UserClaims) -> Result<IssuedTokens, AuthError> {
        self.mint_at(user, Utc::now(), &mut OsRng)
    }

    pub fn mint_at<R>(
        &self,
        user: &UserClaims,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<IssuedTokens, AuthError>
    where
        R: RngCore + CryptoRng,
    {
        let id_token_expires_at = now + Duration::seconds(ID_TOKEN_TTL_SECS);
        let claims = IdentityClaims {
            iss: self.issuer.clone(),
            sub: user.id.to_string(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: id_token_expires_at.timestamp(),
            name: user.name.clone(),
            email: user.email.clone(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());
        let id_token = encode(&header, &claims, &self.keys.enc).map_err(AuthError::Signing)?;

        Ok(IssuedTokens {
            id_token,
            id_token_expires_at,
            refresh_token: generate_refresh_token(rng),
            refresh_token_expires_at: now + Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        })
    }

    /// Checks signature, issuer, audience and expiry with no leeway.
    pub fn verify(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let data = decode::<IdentityClaims>(token, &self.keys.dec, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(UserClaims {
            id,
            name: data.claims.name,
            email: data.claims.email,
        })
    }
}

/// Opaque refresh token: 48 random bytes, standard base64 (64 characters).
pub fn generate_refresh_token<R>(rng: &mut R) -> String
where
    R: RngCore + CryptoRng,
{
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    use super::{
        ID_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenMinter, generate_refresh_token,
    };
    use crate::auth::{AuthError, IdentityClaims, UserClaims};

    const SECRET: &[u8] = b"unit-test-secret";

    fn minter() -> TokenMinter {
        TokenMinter::new(SECRET, "https://api.example", "https://api.example")
    }

    fn alice() -> UserClaims {
        UserClaims {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn minted_identity_token_verifies_to_same_user() {
        let user = alice();
        let issued = minter().mint(&user).expect("mint should succeed");

        let verified = minter()
            .verify(&issued.id_token)
            .expect("fresh token should verify");
        assert_eq!(verified, user);
    }

    #[test]
    fn lifetimes_are_fixed_offsets_from_now() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let issued = minter()
            .mint_at(&alice(), now, &mut rng)
            .expect("mint should succeed");

        assert_eq!(
            issued.id_token_expires_at - now,
            Duration::seconds(ID_TOKEN_TTL_SECS)
        );
        assert_eq!(
            issued.refresh_token_expires_at - now,
            Duration::seconds(REFRESH_TOKEN_TTL_SECS)
        );
    }

    #[test]
    fn refresh_tokens_are_64_char_base64_of_48_bytes() {
        let mut rng = StdRng::seed_from_u64(1);
        let token = generate_refresh_token(&mut rng);
        assert_eq!(token.len(), 64);
        let decoded = STANDARD.decode(&token).expect("token should be base64");
        assert_eq!(decoded.len(), 48);

        let other = generate_refresh_token(&mut rng);
        assert_ne!(token, other);
    }

    #[test]
    fn expired_token_reports_expiry() {
        let issued_at = Utc::now() - Duration::hours(2);
        let issued = minter()
            .mint_at(&alice(), issued_at, &mut StdRng::seed_from_u64(3))
            .expect("mint should succeed");

        let err = minter()
            .verify(&issued.id_token)
            .expect_err("expired token should fail");
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn wrong_secret_or_audience_is_invalid() {
        let issued = minter().mint(&alice()).expect("mint should succeed");

        let other_secret = TokenMinter::new(b"other-secret", "https://api.example", "https://api.example");
        assert!(matches!(
            other_secret.verify(&issued.id_token),
            Err(AuthError::InvalidToken)
        ));

        let other_audience = TokenMinter::new(SECRET, "https://api.example", "https://other.example");
        assert!(matches!(
            other_audience.verify(&issued.id_token),
            Err(AuthError::InvalidToken)
        ));

        assert!(matches!(
            minter().verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let now = Utc::now();
        let claims = IdentityClaims {
            iss: "https://api.example".to_string(),
            sub: "42".to_string(),
            aud: "https://api.example".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("token should encode");

        assert!(matches!(
            minter().verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
