//! Commands for user accounts.

use uuid::Uuid;

/// Command to register a new user.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// Identity of the new user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Command to mark a user's email as verified.
#[derive(Debug, Clone)]
pub struct VerifyUser {
    /// The user identifier.
    pub user_id: Uuid,
}

/// Command to disable a user account.
#[derive(Debug, Clone)]
pub struct DisableUser {
    /// The user identifier.
    pub user_id: Uuid,
    /// Why the account is disabled.
    pub reason: String,
}
