mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Membership changes and the community member count move together: every
/// implementation must apply the membership write and the counter update as
/// one atomic unit.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;

    // Community operations

    /// Inserts the community and a leader membership for its leader.
    fn create_community(&self, community: &Community) -> Result<()>;
    fn get_community(&self, id: &str) -> Result<Option<Community>>;
    /// All communities, newest first.
    fn list_communities(&self) -> Result<Vec<Community>>;

    // Membership operations

    /// Adds a membership and increments the member count.
    /// Returns `Error::NotFound` for an unknown community and
    /// `Error::AlreadyExists` when the user already belongs to it.
    fn add_member(&self, community_id: &str, user_id: &str, role: MemberRole) -> Result<()>;
    /// Removes a membership and decrements the member count (never below zero).
    /// Returns false when there was nothing to remove.
    fn remove_member(&self, community_id: &str, user_id: &str) -> Result<bool>;
    fn get_membership(&self, community_id: &str, user_id: &str) -> Result<Option<Membership>>;
    fn list_members(&self, community_id: &str) -> Result<Vec<Membership>>;
    /// Communities the user belongs to, annotated with the user's role.
    fn list_user_communities(&self, user_id: &str) -> Result<Vec<UserCommunity>>;
    fn count_members(&self, community_id: &str) -> Result<i64>;
    /// Rewrites the stored member count from the membership rows and returns it.
    fn reconcile_member_count(&self, community_id: &str) -> Result<i64>;
}
