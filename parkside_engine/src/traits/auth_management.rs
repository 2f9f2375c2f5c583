use thiserror::Error;

use crate::traits::LoginIdentity;

/// The sliver of account storage the authentication flow needs: mapping an asserted email to an identity
/// with a role and a list status. The engine trusts whatever subject the credential module asserts.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_login_identity(&self, email: &str) -> Result<Option<LoginIdentity>, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("No account is registered for this email")]
    AccountNotFound,
    #[error("You have been added to the black list")]
    Blacklisted,
    #[error("This account does not hold the {0} role")]
    RoleNotAllowed(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
