//! # Authentication
//!
//! Staff sign in with a one-time code sent to their phone, then carry a
//! JWT on every request.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /auth/challenge { phone }                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Authenticator::issue_challenge                                        │
//! │       ├── 6-digit code ──► CodeSender (SMS gateway, or the log in dev) │
//! │       └── argon2(code), expiry, attempts ──► pending challenges        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { challengeId, expiresAt }                                            │
//! │                                                                         │
//! │  POST /auth/verify { challengeId, code }                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Authenticator::verify                                                 │
//! │       ├── expired / unknown ──► 401                                    │
//! │       ├── wrong code ─────────► 401, attempts - 1 (0 left ──► 429)    │
//! │       └── right code ─────────► challenge consumed                     │
//! │                                  staff by phone ──► JWT { role, … }    │
//! │                                                                         │
//! │  Authorization: Bearer <jwt> ──► AuthUser extractor ──► require(cap)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use billbook_core::validation::normalize_phone;
use billbook_core::{Capability, Role, StaffMember};
use billbook_db::StaffRepository;

use crate::error::{ApiError, ErrorCode};
use crate::AppState;

// =============================================================================
// JWT
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff member id)
    pub sub: String,

    /// Phone the code was verified against
    pub phone: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// A freshly signed session token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub staff: StaffMember,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        JwtManager {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    /// Signs a token for a staff member.
    pub fn issue(&self, staff: &StaffMember) -> Result<SessionToken, ApiError> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: staff.id.clone(),
            phone: staff.phone.clone(),
            role: staff.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))?;

        Ok(SessionToken {
            access_token,
            token_type: "Bearer",
            expires_at,
            staff: staff.clone(),
        })
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Code Delivery
// =============================================================================

/// Delivers one-time codes to a phone.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send(&self, phone: &str, code: &str) -> Result<(), ApiError>;
}

/// Writes the code to the log. For development and single-till setups
/// without an SMS gateway.
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send(&self, phone: &str, code: &str) -> Result<(), ApiError> {
        info!(phone = %phone, code = %code, "Login code issued");
        Ok(())
    }
}

// =============================================================================
// Challenges
// =============================================================================

/// Returned by [`Authenticator::issue_challenge`]. The code itself goes
/// only to the phone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTicket {
    pub challenge_id: String,
    pub expires_at: DateTime<Utc>,
}

struct PendingChallenge {
    phone: String,
    code_hash: String,
    expires_at: DateTime<Utc>,
    attempts_left: u32,
    /// False when no active staff member has this phone; verify always fails.
    deliverable: bool,
}

/// Issues and verifies one-time login codes.
pub struct Authenticator {
    staff: StaffRepository,
    jwt: Arc<JwtManager>,
    sender: Arc<dyn CodeSender>,
    challenges: Mutex<HashMap<String, PendingChallenge>>,
    challenge_lifetime: Duration,
    max_attempts: u32,
}

impl Authenticator {
    pub fn new(
        staff: StaffRepository,
        jwt: Arc<JwtManager>,
        sender: Arc<dyn CodeSender>,
        challenge_lifetime_secs: i64,
        max_attempts: u32,
    ) -> Self {
        Authenticator {
            staff,
            jwt,
            sender,
            challenges: Mutex::new(HashMap::new()),
            challenge_lifetime: Duration::seconds(challenge_lifetime_secs),
            max_attempts,
        }
    }

    /// Starts a login for `phone`.
    ///
    /// Unknown phones get a ticket too, so the response does not reveal
    /// who is on the staff list; their code is never sent.
    pub async fn issue_challenge(&self, phone: &str) -> Result<ChallengeTicket, ApiError> {
        let phone = normalize_phone(phone)?;
        let deliverable = self.staff.find_active_by_phone(&phone).await?.is_some();

        let code = generate_code();
        let code_hash = hash_code(code.clone()).await?;
        let challenge_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + self.challenge_lifetime;

        {
            let mut challenges = self.challenges.lock().await;
            challenges.retain(|_, c| c.expires_at > now);
            challenges.insert(
                challenge_id.clone(),
                PendingChallenge {
                    phone: phone.clone(),
                    code_hash,
                    expires_at,
                    attempts_left: self.max_attempts,
                    deliverable,
                },
            );
        }

        if deliverable {
            self.sender.send(&phone, &code).await?;
        } else {
            debug!(phone = %phone, "Challenge for unknown phone, code not sent");
        }

        Ok(ChallengeTicket {
            challenge_id,
            expires_at,
        })
    }

    /// Checks a code and, if it matches, signs a session token.
    ///
    /// A challenge is consumed by a correct code, by expiry, or by running
    /// out of attempts.
    pub async fn verify(&self, challenge_id: &str, code: &str) -> Result<SessionToken, ApiError> {
        let rejected = || ApiError::unauthorized("Invalid or expired challenge");

        // Taken out of the map so two concurrent verifies cannot both use it
        let mut challenge = self
            .challenges
            .lock()
            .await
            .remove(challenge_id)
            .ok_or_else(rejected)?;

        if challenge.expires_at <= Utc::now() {
            return Err(rejected());
        }

        let matches = challenge.deliverable
            && verify_code(code.trim().to_string(), challenge.code_hash.clone()).await?;
        if !matches {
            challenge.attempts_left = challenge.attempts_left.saturating_sub(1);
            if challenge.attempts_left == 0 {
                warn!(phone = %challenge.phone, "Login challenge locked after too many attempts");
                return Err(ApiError::new(
                    ErrorCode::TooManyAttempts,
                    "Too many incorrect codes, request a new one",
                ));
            }
            self.challenges
                .lock()
                .await
                .insert(challenge_id.to_string(), challenge);
            return Err(ApiError::unauthorized("Incorrect code"));
        }

        let staff = self
            .staff
            .find_active_by_phone(&challenge.phone)
            .await?
            .ok_or_else(|| ApiError::unauthorized("No active staff member for this phone"))?;

        info!(staff_id = %staff.id, role = %staff.role, "Staff signed in");
        self.jwt.issue(&staff)
    }

    /// Pending, unexpired challenges.
    pub async fn pending(&self) -> usize {
        let now = Utc::now();
        self.challenges
            .lock()
            .await
            .values()
            .filter(|c| c.expires_at > now)
            .count()
    }
}

fn generate_code() -> String {
    use rand::Rng;
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

// Argon2 is CPU-bound, so both calls run on the blocking pool.

async fn hash_code(code: String) -> Result<String, ApiError> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(code.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::internal(format!("Failed to hash code: {}", e)))
    })
    .await
    .map_err(join_error)?
}

async fn verify_code(code: String, hash: String) -> Result<bool, ApiError> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(join_error)
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    ApiError::internal(format!("spawn_blocking join error: {e}"))
}

// =============================================================================
// Request Extractor
// =============================================================================

/// The signed-in staff member, taken from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub staff_id: String,
    pub phone: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        self.role.require(capability).map_err(|e| {
            warn!(staff_id = %self.staff_id, role = %self.role, %capability, "Access denied");
            ApiError::from(e)
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;

        let token = extract_bearer_token(auth_header)
            .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?;

        let claims = state.jwt.validate(token)?;

        Ok(AuthUser {
            staff_id: claims.sub,
            phone: claims.phone,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbook_db::{Database, DbConfig};

    /// Remembers the last code so tests can sign in.
    #[derive(Default)]
    struct CapturingSender {
        last: std::sync::Mutex<Option<(String, String)>>,
    }

    #[async_trait]
    impl CodeSender for CapturingSender {
        async fn send(&self, phone: &str, code: &str) -> Result<(), ApiError> {
            *self.last.lock().unwrap() = Some((phone.to_string(), code.to_string()));
            Ok(())
        }
    }

    impl CapturingSender {
        fn code(&self) -> String {
            self.last.lock().unwrap().clone().unwrap().1
        }
    }

    fn staff(phone: &str, role: Role) -> StaffMember {
        StaffMember {
            id: Uuid::new_v4().to_string(),
            name: "Meera".to_string(),
            phone: phone.to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    async fn setup(lifetime_secs: i64, attempts: u32) -> (Authenticator, Arc<CapturingSender>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.staff().insert(&staff("9876500000", Role::Sales)).await.unwrap();

        let sender = Arc::new(CapturingSender::default());
        let auth = Authenticator::new(
            db.staff(),
            Arc::new(JwtManager::new("test-secret", 3600)),
            sender.clone(),
            lifetime_secs,
            attempts,
        );
        (auth, sender)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);
        let member = staff("9876500000", Role::Manager);

        let token = manager.issue(&member).unwrap();
        let claims = manager.validate(&token.access_token).unwrap();

        assert_eq!(claims.sub, member.id);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_jwt_rejects_expired_and_foreign_tokens() {
        let expired = JwtManager::new("test-secret", -600);
        let token = expired.issue(&staff("9876500000", Role::Admin)).unwrap();
        assert!(JwtManager::new("test-secret", 3600)
            .validate(&token.access_token)
            .is_err());

        let other = JwtManager::new("other-secret", 3600);
        let token = other.issue(&staff("9876500000", Role::Admin)).unwrap();
        let err = JwtManager::new("test-secret", 3600)
            .validate(&token.access_token)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_code_hash_roundtrip() {
        let code = generate_code();
        assert_eq!(code.len(), 6);
        let hash = hash_code(code.clone()).await.unwrap();
        assert!(!hash.contains(&code));
        assert!(verify_code(code, hash.clone()).await.unwrap());
        assert!(!verify_code("000000".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_code("123456".to_string(), "not-a-hash".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_challenge_verify_signs_in() {
        let (auth, sender) = setup(300, 5).await;

        let ticket = auth.issue_challenge("+91 98765 00000").await.unwrap();
        let session = auth.verify(&ticket.challenge_id, &sender.code()).await.unwrap();

        assert_eq!(session.staff.role, Role::Sales);
        assert_eq!(session.token_type, "Bearer");

        // Single use
        let err = auth
            .verify(&ticket.challenge_id, &sender.code())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_wrong_codes_burn_challenge() {
        let (auth, sender) = setup(300, 2).await;
        let ticket = auth.issue_challenge("9876500000").await.unwrap();
        let right = sender.code();
        let wrong = if right == "123456" { "654321" } else { "123456" };

        let err = auth.verify(&ticket.challenge_id, wrong).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = auth.verify(&ticket.challenge_id, wrong).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::TooManyAttempts);

        // The right code no longer helps
        assert!(auth.verify(&ticket.challenge_id, &right).await.is_err());
        assert_eq!(auth.pending().await, 0);
    }

    #[tokio::test]
    async fn test_expired_challenge_rejected() {
        let (auth, sender) = setup(-1, 5).await;
        let ticket = auth.issue_challenge("9876500000").await.unwrap();

        let err = auth.verify(&ticket.challenge_id, &sender.code()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_unknown_phone_gets_ticket_but_no_code() {
        let (auth, sender) = setup(300, 5).await;

        let ticket = auth.issue_challenge("9123456789").await.unwrap();
        assert!(sender.last.lock().unwrap().is_none());
        assert!(auth.verify(&ticket.challenge_id, "123456").await.is_err());

        assert!(auth.issue_challenge("12345").await.is_err());
    }
}
