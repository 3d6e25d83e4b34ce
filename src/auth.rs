use serde::{Deserialize, Serialize};

use crate::engine::{Action, Engine, Error};
use crate::limits::MIN_PASSWORD_LEN;
use crate::model::{Role, User, UserId};

/// Signing/expiry knobs for the token issuer. Passed explicitly — there is
/// no ambient process-wide key.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub session_ttl_hours: i64,
    pub setup_ttl_hours: i64,
    /// Tolerated clock drift when validating token expiry.
    pub clock_skew_secs: i64,
    /// Base URL the setup-password link in the welcome notification points at.
    pub setup_link_base: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: "labslot".into(),
            session_ttl_hours: 2,
            setup_ttl_hours: 24,
            clock_skew_secs: 30,
            setup_link_base: "http://localhost:4200/setup-password".into(),
        }
    }
}

/// Token issuance/validation seam. Implementations own the signing
/// mechanics; the engine only routes tokens through the workflows.
pub trait TokenIssuer: Send + Sync {
    fn issue_session_token(&self, user: &User) -> Result<String, Error>;
    fn issue_setup_token(&self, user: &User) -> Result<String, Error>;
    /// Returns the RA the setup token was issued for, or
    /// `Error::Validation` for a bad/expired/mistyped token.
    fn validate_setup_token(&self, token: &str) -> Result<String, Error>;
}

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub name: String,
    pub ra: String,
    pub role: Role,
    pub token: String,
}

impl Engine {
    /// Authenticate by RA + password. Unknown RA, missing credential,
    /// inactive account and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, ra: &str, password: &str) -> Result<LoginResponse, Error> {
        let user = match self.users.get_by_ra(ra).await? {
            Some(user) => user,
            None => return Err(self.login_failure(ra)),
        };
        let verified = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| self.hasher.verify(password, hash));
        if !user.is_active || !verified {
            return Err(self.login_failure(ra));
        }

        let token = self.tokens.issue_session_token(&user)?;
        Ok(LoginResponse {
            user_id: user.id,
            name: user.name,
            ra: user.ra,
            role: user.role,
            token,
        })
    }

    fn login_failure(&self, ra: &str) -> Error {
        metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
        tracing::warn!(ra, "login rejected");
        Error::Unauthorized(Action::Login)
    }

    /// Complete the account-activation flow: trade a setup token for a
    /// stored credential and flip the account active.
    pub async fn setup_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        let ra = self.tokens.validate_setup_token(token)?;
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation("password is too short"));
        }
        let mut user = self
            .users
            .get_by_ra(&ra)
            .await?
            .ok_or(Error::Validation("setup link is invalid or expired"))?;

        user.password_hash = Some(self.hasher.hash(new_password));
        user.is_active = true;
        self.users.update(user).await?;
        tracing::info!(ra, "password set, account activated");
        Ok(())
    }
}
