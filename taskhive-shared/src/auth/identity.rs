/// Identity token validation
///
/// Taskhive does not issue identity: users authenticate against an external
/// provider, which hands them a signed bearer token. This module only
/// *verifies* those tokens (HS256 over a shared secret) and turns the claims
/// into an [`Identity`] that handlers thread into every ledger/store call.
///
/// Token issuance exists here solely for tests and local tooling; production
/// tokens always come from the provider.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, expiration, and not-before checks
/// - **Secret Management**: the shared secret should be at least 32 bytes
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::identity::{issue_identity_token, validate_identity_token, IdentityClaims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "shared-secret-at-least-32-bytes-long";
/// let claims = IdentityClaims::new("provider-subject-1", "user@example.com");
///
/// let token = issue_identity_token(&claims, secret)?;
/// let validated = validate_identity_token(&token, secret)?;
/// assert_eq!(validated.sub, "provider-subject-1");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Error type for identity token operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Failed to create token (test/tooling path)
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// Claims carried by a provider-issued identity token
///
/// Standard OIDC-shaped claims; everything beyond `sub` and `email` is
/// optional profile data used only to seed the local user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the provider's stable user id
    pub sub: String,

    /// Email address
    pub email: String,

    /// First name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Last name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Preferred handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl IdentityClaims {
    /// Creates claims with a 24 hour lifetime
    pub fn new(sub: &str, email: &str) -> Self {
        Self::with_expiration(sub, email, Duration::hours(24))
    }

    /// Creates claims with a custom lifetime
    pub fn with_expiration(sub: &str, email: &str, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: sub.to_string(),
            email: email.to_string(),
            given_name: None,
            family_name: None,
            preferred_username: None,
            picture: None,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// The authenticated actor, inserted as a request extension by the identity
/// middleware
#[derive(Debug, Clone)]
pub struct Identity {
    /// Provider subject id
    pub subject: String,

    /// Email address
    pub email: String,

    /// First name, if the provider supplied one
    pub first_name: Option<String>,

    /// Last name, if the provider supplied one
    pub last_name: Option<String>,

    /// Preferred handle, if the provider supplied one
    pub preferred_username: Option<String>,

    /// Avatar URL, if the provider supplied one
    pub image_url: Option<String>,
}

impl Identity {
    /// Handle for the local user row: the preferred username, or the email
    /// local part
    pub fn username(&self) -> String {
        self.preferred_username.clone().unwrap_or_else(|| {
            self.email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string()
        })
    }

    /// Display name assembled from the name claims, if any are present
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

impl From<IdentityClaims> for Identity {
    fn from(claims: IdentityClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            first_name: claims.given_name,
            last_name: claims.family_name,
            preferred_username: claims.preferred_username,
            image_url: claims.picture,
        }
    }
}

/// Validates a provider identity token and extracts its claims
///
/// Verifies the signature, expiration, and not-before time.
///
/// # Errors
///
/// Returns `IdentityError::Expired` for expired tokens, and
/// `IdentityError::ValidationError` for every other failure (bad signature,
/// malformed token, missing claims).
pub fn validate_identity_token(token: &str, secret: &str) -> Result<IdentityClaims, IdentityError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
            _ => IdentityError::ValidationError(format!("Token validation failed: {}", e)),
        }
    })?;

    Ok(token_data.claims)
}

/// Signs an identity token
///
/// Used by tests and local tooling to simulate the provider; the API never
/// calls this in a request path.
pub fn issue_identity_token(claims: &IdentityClaims, secret: &str) -> Result<String, IdentityError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| IdentityError::CreateError(format!("Token encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate_token() {
        let secret = "test-secret-key-at-least-32-bytes-long";
        let mut claims = IdentityClaims::new("subj-123", "user@example.com");
        claims.given_name = Some("Alex".to_string());

        let token = issue_identity_token(&claims, secret).expect("Should create token");
        let validated = validate_identity_token(&token, secret).expect("Should validate token");

        assert_eq!(validated.sub, "subj-123");
        assert_eq!(validated.email, "user@example.com");
        assert_eq!(validated.given_name.as_deref(), Some("Alex"));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = IdentityClaims::new("subj-123", "user@example.com");
        let token = issue_identity_token(&claims, "secret1").expect("Should create token");

        let result = validate_identity_token(&token, "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let secret = "test-secret";
        let claims =
            IdentityClaims::with_expiration("subj-123", "user@example.com", Duration::seconds(-3600));

        assert!(claims.is_expired());

        let token = issue_identity_token(&claims, secret).expect("Should create token");
        let result = validate_identity_token(&token, secret);

        assert!(matches!(result.unwrap_err(), IdentityError::Expired));
    }

    #[test]
    fn test_identity_username_prefers_claim() {
        let mut claims = IdentityClaims::new("s", "jordan@example.com");
        claims.preferred_username = Some("jrdn".to_string());

        let identity = Identity::from(claims);
        assert_eq!(identity.username(), "jrdn");
    }

    #[test]
    fn test_identity_username_falls_back_to_email_local_part() {
        let claims = IdentityClaims::new("s", "jordan@example.com");
        let identity = Identity::from(claims);
        assert_eq!(identity.username(), "jordan");
    }

    #[test]
    fn test_identity_display_name() {
        let mut claims = IdentityClaims::new("s", "a@b.c");
        claims.given_name = Some("Alex".to_string());
        claims.family_name = Some("Reyes".to_string());

        let identity = Identity::from(claims);
        assert_eq!(identity.display_name().as_deref(), Some("Alex Reyes"));

        let bare = Identity::from(IdentityClaims::new("s", "a@b.c"));
        assert!(bare.display_name().is_none());
    }
}
