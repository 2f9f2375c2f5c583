use log::debug;

use crate::{
    db_types::{Role, UserStatus},
    traits::{AuthApiError, AuthManagement, LoginIdentity},
};

/// Resolves an asserted identity (an email the credential module vouches for) into an account with a
/// role, refusing black-listed accounts and role escalation.
#[derive(Debug, Clone)]
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Looks up the account for `email` and confirms it may act as `desired_role`.
    ///
    /// The email itself is trusted: it arrives inside a token the credential module signed. What is
    /// checked here is purely account state: existence, list status, and role membership.
    pub async fn authenticate(&self, email: &str, desired_role: Role) -> Result<LoginIdentity, AuthApiError> {
        let identity = self.db.fetch_login_identity(email).await?.ok_or(AuthApiError::AccountNotFound)?;
        if identity.status == UserStatus::Black {
            return Err(AuthApiError::Blacklisted);
        }
        if desired_role.may_administer() && !identity.role.may_administer() {
            return Err(AuthApiError::RoleNotAllowed(desired_role.to_string()));
        }
        debug!("🔑️ {email} authenticated with role {}", identity.role);
        Ok(identity)
    }
}
