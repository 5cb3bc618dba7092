use std::sync::Arc;

use chrono::Utc;

use super::draft::CommunityDraft;
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier};
use crate::store::Store;
use crate::types::{Community, GeoPoint, MemberRole, NearbyCommunity, UserCommunity};

/// Client-side view of the community tables.
///
/// Keeps the last successfully loaded lists. A failed load leaves them as they
/// were; every outcome is reported once through the notifier.
pub struct CommunityDirectory {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    communities: Vec<Community>,
    user_communities: Vec<UserCommunity>,
    refresh_after_write: bool,
}

impl CommunityDirectory {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            communities: Vec::new(),
            user_communities: Vec::new(),
            refresh_after_write: true,
        }
    }

    /// A directory that never reloads its lists after a mutation. Used for
    /// one-shot work such as a single HTTP request.
    pub fn uncached(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            refresh_after_write: false,
            ..Self::new(store, notifier)
        }
    }

    /// All known communities, newest first.
    #[must_use]
    pub fn communities(&self) -> &[Community] {
        &self.communities
    }

    /// Communities of the user last passed to [`Self::load_user_communities`].
    #[must_use]
    pub fn user_communities(&self) -> &[UserCommunity] {
        &self.user_communities
    }

    pub fn load_communities(&mut self) -> Result<()> {
        match self.store.list_communities() {
            Ok(communities) => {
                tracing::debug!("Loaded {} communities", communities.len());
                self.communities = communities;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load communities: {e}");
                self.report_error("Error loading communities", &e);
                Err(e)
            }
        }
    }

    pub fn load_user_communities(&mut self, user_id: &str) -> Result<()> {
        match self.store.list_user_communities(user_id) {
            Ok(communities) => {
                self.user_communities = communities;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load communities for user {user_id}: {e}");
                self.report_error("Error loading your communities", &e);
                Err(e)
            }
        }
    }

    pub fn join_community(&mut self, community_id: &str, user_id: &str) -> Result<()> {
        if let Err(e) = self
            .store
            .add_member(community_id, user_id, MemberRole::Member)
        {
            tracing::error!("Failed to join community {community_id}: {e}");
            self.report_error("Error joining community", &e);
            return Err(e);
        }

        self.refresh(user_id);
        let name = self.display_name(community_id);
        self.notifier.notify(Notification::success(
            "Joined community",
            format!("You are now a member of {name}"),
        ));
        Ok(())
    }

    /// Leaves a community. Returns false when the user was not a member,
    /// which is not an error.
    pub fn leave_community(&mut self, community_id: &str, user_id: &str) -> Result<bool> {
        let removed = match self.store.remove_member(community_id, user_id) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!("Failed to leave community {community_id}: {e}");
                self.report_error("Error leaving community", &e);
                return Err(e);
            }
        };

        self.refresh(user_id);
        let name = self.display_name(community_id);
        let description = if removed {
            format!("You have left {name}")
        } else {
            format!("You were not a member of {name}")
        };
        self.notifier
            .notify(Notification::success("Left community", description));
        Ok(removed)
    }

    /// Creates a community led by `user_id` and returns the stored row.
    pub fn create_community(&mut self, draft: CommunityDraft, user_id: &str) -> Result<Community> {
        match self.try_create(draft, user_id) {
            Ok(community) => {
                self.refresh(user_id);
                self.notifier.notify(Notification::success(
                    "Community created",
                    format!("{} is now on the map", community.name),
                ));
                Ok(community)
            }
            Err(e) => {
                tracing::error!("Failed to create community: {e}");
                self.report_error("Error creating community", &e);
                Err(e)
            }
        }
    }

    /// Loaded communities within `radius_km` of `origin`, closest first.
    #[must_use]
    pub fn find_nearby(&self, origin: GeoPoint, radius_km: f64) -> Vec<NearbyCommunity> {
        super::nearby(&self.communities, origin, radius_km)
    }

    fn try_create(&self, draft: CommunityDraft, user_id: &str) -> Result<Community> {
        let community = draft.build(user_id, Utc::now())?;
        self.store.create_community(&community)?;
        self.store
            .get_community(&community.id)?
            .ok_or(Error::NotFound)
    }

    // Load failures are already reported by the loaders.
    fn refresh(&mut self, user_id: &str) {
        if !self.refresh_after_write {
            return;
        }
        let _ = self.load_communities();
        let _ = self.load_user_communities(user_id);
    }

    fn display_name(&self, community_id: &str) -> String {
        let cached = self
            .communities
            .iter()
            .find(|c| c.id == community_id)
            .map(|c| c.name.clone());

        cached
            .or_else(|| match self.store.get_community(community_id) {
                Ok(found) => found.map(|c| c.name),
                Err(e) => {
                    tracing::debug!("Could not look up community {community_id}: {e}");
                    None
                }
            })
            .unwrap_or_else(|| "this community".to_string())
    }

    fn report_error(&self, title: &str, err: &Error) {
        let description = match err {
            Error::NotFound => "Community not found".to_string(),
            Error::AlreadyExists => "You are already a member of this community".to_string(),
            Error::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };
        self.notifier.notify(Notification::error(title, description));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::notify::{Level, MemoryNotifier};
    use crate::store::SqliteStore;
    use crate::types::{Membership, Token, User};

    /// Counts the full-list reads that pass through to SQLite.
    struct CountingStore {
        inner: SqliteStore,
        list_calls: AtomicUsize,
        user_list_calls: AtomicUsize,
    }

    impl Store for CountingStore {
        fn initialize(&self) -> Result<()> {
            self.inner.initialize()
        }
        fn create_user(&self, user: &User) -> Result<()> {
            self.inner.create_user(user)
        }
        fn get_user(&self, id: &str) -> Result<Option<User>> {
            self.inner.get_user(id)
        }
        fn list_users(&self) -> Result<Vec<User>> {
            self.inner.list_users()
        }
        fn create_token(&self, token: &Token) -> Result<()> {
            self.inner.create_token(token)
        }
        fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
            self.inner.get_token_by_lookup(lookup)
        }
        fn update_token_last_used(&self, id: &str) -> Result<()> {
            self.inner.update_token_last_used(id)
        }
        fn has_admin_token(&self) -> Result<bool> {
            self.inner.has_admin_token()
        }
        fn create_community(&self, community: &Community) -> Result<()> {
            self.inner.create_community(community)
        }
        fn get_community(&self, id: &str) -> Result<Option<Community>> {
            self.inner.get_community(id)
        }
        fn list_communities(&self) -> Result<Vec<Community>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_communities()
        }
        fn add_member(&self, community_id: &str, user_id: &str, role: MemberRole) -> Result<()> {
            self.inner.add_member(community_id, user_id, role)
        }
        fn remove_member(&self, community_id: &str, user_id: &str) -> Result<bool> {
            self.inner.remove_member(community_id, user_id)
        }
        fn get_membership(&self, community_id: &str, user_id: &str) -> Result<Option<Membership>> {
            self.inner.get_membership(community_id, user_id)
        }
        fn list_members(&self, community_id: &str) -> Result<Vec<Membership>> {
            self.inner.list_members(community_id)
        }
        fn list_user_communities(&self, user_id: &str) -> Result<Vec<UserCommunity>> {
            self.user_list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_user_communities(user_id)
        }
        fn count_members(&self, community_id: &str) -> Result<i64> {
            self.inner.count_members(community_id)
        }
        fn reconcile_member_count(&self, community_id: &str) -> Result<i64> {
            self.inner.reconcile_member_count(community_id)
        }
    }

    struct Fixture {
        sqlite: Arc<SqliteStore>,
        notifier: Arc<MemoryNotifier>,
        directory: CommunityDirectory,
    }

    fn fixture() -> Fixture {
        let sqlite = Arc::new(SqliteStore::in_memory().unwrap());
        sqlite.initialize().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());
        let directory = CommunityDirectory::new(sqlite.clone(), notifier.clone());
        Fixture {
            sqlite,
            notifier,
            directory,
        }
    }

    #[test]
    fn test_create_with_empty_draft_uses_defaults_and_leader_role() {
        let mut fx = fixture();

        let created = fx
            .directory
            .create_community(CommunityDraft::default(), "creator")
            .unwrap();

        assert_eq!(created.meeting_day, "Sunday");
        assert_eq!(created.meeting_time, "10:00 AM");
        assert_eq!(created.trust_level.as_str(), "new");
        assert_eq!(created.member_count, 1);

        let membership = fx
            .sqlite
            .get_membership(&created.id, "creator")
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, MemberRole::Leader);

        assert_eq!(fx.directory.communities().len(), 1);
        assert_eq!(fx.directory.user_communities()[0].role, MemberRole::Leader);
        assert_eq!(fx.notifier.last().unwrap().title, "Community created");
    }

    #[test]
    fn test_join_then_load_user_communities_includes_member_role() {
        let mut fx = fixture();
        let created = fx
            .directory
            .create_community(CommunityDraft::new().with_name("Riverside"), "leader")
            .unwrap();

        fx.directory.join_community(&created.id, "alice").unwrap();
        fx.directory.load_user_communities("alice").unwrap();

        let mine = fx.directory.user_communities();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].community.id, created.id);
        assert_eq!(mine[0].role, MemberRole::Member);
        assert_eq!(mine[0].community.member_count, 2);

        let note = fx.notifier.last().unwrap();
        assert_eq!(note.level, Level::Success);
        assert_eq!(note.description, "You are now a member of Riverside");
    }

    #[test]
    fn test_leave_removes_membership_and_tolerates_repeat() {
        let mut fx = fixture();
        let created = fx
            .directory
            .create_community(CommunityDraft::default(), "leader")
            .unwrap();
        fx.directory.join_community(&created.id, "alice").unwrap();

        assert!(fx.directory.leave_community(&created.id, "alice").unwrap());
        assert!(
            fx.sqlite
                .get_membership(&created.id, "alice")
                .unwrap()
                .is_none()
        );

        assert!(!fx.directory.leave_community(&created.id, "alice").unwrap());
        let stored = fx.sqlite.get_community(&created.id).unwrap().unwrap();
        assert_eq!(stored.member_count, 1);
        assert!(fx.directory.user_communities().is_empty());
    }

    #[test]
    fn test_leave_never_drops_count_below_zero() {
        let mut fx = fixture();
        let created = fx
            .directory
            .create_community(CommunityDraft::default(), "leader")
            .unwrap();

        fx.directory.leave_community(&created.id, "leader").unwrap();
        fx.directory.leave_community(&created.id, "leader").unwrap();
        fx.directory.leave_community(&created.id, "nobody").unwrap();

        let stored = fx.sqlite.get_community(&created.id).unwrap().unwrap();
        assert_eq!(stored.member_count, 0);
    }

    #[test]
    fn test_duplicate_join_is_reported_and_state_kept() {
        let mut fx = fixture();
        let created = fx
            .directory
            .create_community(CommunityDraft::default(), "leader")
            .unwrap();
        fx.directory.join_community(&created.id, "alice").unwrap();
        fx.notifier.take();

        let result = fx.directory.join_community(&created.id, "alice");
        assert!(matches!(result, Err(Error::AlreadyExists)));

        let notes = fx.notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].title, "Error joining community");
        assert_eq!(fx.directory.communities()[0].member_count, 2);
    }

    #[test]
    fn test_failed_load_keeps_previous_list() {
        let mut fx = fixture();
        fx.directory
            .create_community(CommunityDraft::default(), "leader")
            .unwrap();
        fx.notifier.take();

        fx.sqlite
            .connection()
            .execute_batch("DROP TABLE community_members; DROP TABLE communities;")
            .unwrap();

        assert!(fx.directory.load_communities().is_err());
        assert_eq!(fx.directory.communities().len(), 1);

        let note = fx.notifier.last().unwrap();
        assert_eq!(note.level, Level::Error);
        assert_eq!(note.title, "Error loading communities");
    }

    #[test]
    fn test_invalid_draft_is_reported_and_returned() {
        let mut fx = fixture();

        let result = fx
            .directory
            .create_community(CommunityDraft::new().with_name(""), "leader");

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(fx.notifier.last().unwrap().title, "Error creating community");
        assert!(fx.sqlite.list_communities().unwrap().is_empty());
    }

    #[test]
    fn test_find_nearby_orders_by_distance() {
        let mut fx = fixture();
        let portland = GeoPoint::new(45.5152, -122.6784);
        fx.directory
            .create_community(
                CommunityDraft::new()
                    .with_name("Far")
                    .with_location("Seattle", "WA", GeoPoint::new(47.6062, -122.3321)),
                "a",
            )
            .unwrap();
        fx.directory
            .create_community(
                CommunityDraft::new()
                    .with_name("Near")
                    .with_location("Beaverton", "OR", GeoPoint::new(45.4871, -122.8037)),
                "b",
            )
            .unwrap();
        fx.directory
            .create_community(CommunityDraft::new().with_name("Nowhere"), "c")
            .unwrap();

        let found = fx.directory.find_nearby(portland, 300.0);
        let names: Vec<&str> = found.iter().map(|n| n.community.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[test]
    fn test_uncached_directory_skips_list_reloads() {
        let store = Arc::new(CountingStore {
            inner: SqliteStore::in_memory().unwrap(),
            list_calls: AtomicUsize::new(0),
            user_list_calls: AtomicUsize::new(0),
        });
        store.initialize().unwrap();
        let notifier = Arc::new(MemoryNotifier::new());

        let mut directory = CommunityDirectory::uncached(store.clone(), notifier.clone());
        let mut ids = Vec::new();
        for n in 0..50 {
            let created = directory
                .create_community(CommunityDraft::new().with_name(format!("Group {n}")), "leader")
                .unwrap();
            ids.push(created.id);
        }

        directory.join_community(&ids[7], "alice").unwrap();
        assert!(directory.leave_community(&ids[7], "alice").unwrap());

        assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.user_list_calls.load(Ordering::SeqCst), 0);
        assert!(directory.communities().is_empty());

        let notes = notifier.take();
        assert!(notes.iter().all(|n| n.level == Level::Success));
        assert_eq!(notes[50].description, "You are now a member of Group 7");
        assert_eq!(notes[51].description, "You have left Group 7");
    }

    #[test]
    fn test_cached_directory_reloads_after_join() {
        let store = Arc::new(CountingStore {
            inner: SqliteStore::in_memory().unwrap(),
            list_calls: AtomicUsize::new(0),
            user_list_calls: AtomicUsize::new(0),
        });
        store.initialize().unwrap();

        let mut directory = CommunityDirectory::new(store.clone(), Arc::new(MemoryNotifier::new()));
        let created = directory
            .create_community(CommunityDraft::default(), "leader")
            .unwrap();
        directory.join_community(&created.id, "alice").unwrap();

        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.user_list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(directory.communities()[0].member_count, 2);
    }
}
