//! Observable user store: cache state, reducer, and change notifications.

use std::collections::HashMap;

use entity_cache::CacheState;
use shared::{
    domain::{User, UserChanges, UserId},
    error::TransportError,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 256;

/// How a successful list fetch is folded into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchReconcile {
    /// Insert or overwrite returned records; keep everything else.
    #[default]
    Merge,
    /// Make the cache exactly the returned records.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchUsers,
    AddUser,
    RemoveUser,
    UpdateUser,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchUsers => "fetch_users",
            Self::AddUser => "add_user",
            Self::RemoveUser => "remove_user",
            Self::UpdateUser => "update_user",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UsersAction {
    // Local-only edits, never sent to the remote resource.
    AddUser(User),
    AddUsers(Vec<User>),
    RemoveUser(UserId),
    UpdateUser { id: UserId, changes: UserChanges },

    FetchUsersPending,
    FetchUsersFulfilled(Vec<User>),
    FetchUsersRejected(String),
    AddUserPending(User),
    AddUserFulfilled { draft_id: UserId, user: User },
    AddUserRejected { draft_id: UserId },
    RemoveUserFulfilled(UserId),
    UpdateUserFulfilled(User),
}

impl UsersAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddUser(_) => "users/add_user",
            Self::AddUsers(_) => "users/add_users",
            Self::RemoveUser(_) => "users/remove_user",
            Self::UpdateUser { .. } => "users/update_user",
            Self::FetchUsersPending => "users/fetch_users/pending",
            Self::FetchUsersFulfilled(_) => "users/fetch_users/fulfilled",
            Self::FetchUsersRejected(_) => "users/fetch_users/rejected",
            Self::AddUserPending(_) => "users/add_user_async/pending",
            Self::AddUserFulfilled { .. } => "users/add_user_async/fulfilled",
            Self::AddUserRejected { .. } => "users/add_user_async/rejected",
            Self::RemoveUserFulfilled(_) => "users/remove_user_async/fulfilled",
            Self::UpdateUserFulfilled(_) => "users/update_user_async/fulfilled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An action was applied; re-read the store.
    Changed { action: &'static str },
    /// A remote operation finished, successfully or not.
    OperationSettled {
        operation: Operation,
        outcome: Result<(), TransportError>,
    },
}

/// Point-in-time copy of everything a front-end renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersSnapshot {
    pub users: Vec<User>,
    pub loading: bool,
    pub error: Option<String>,
    /// Creations sent to the server and not confirmed yet, oldest first.
    pub pending_drafts: Vec<User>,
}

#[derive(Default)]
struct UsersState {
    cache: CacheState<User>,
    inflight_fetches: usize,
    pending_drafts: Vec<User>,
    /// Draft id to server id. Kept for the life of the store and never pruned.
    confirmed_drafts: HashMap<UserId, UserId>,
}

impl UsersState {
    fn apply(&mut self, action: UsersAction, reconcile: FetchReconcile) {
        match action {
            UsersAction::AddUser(user) => {
                self.cache.entities_mut().add_one(user);
            }
            UsersAction::AddUsers(users) => self.cache.entities_mut().add_many(users),
            UsersAction::RemoveUser(id) => {
                self.cache.entities_mut().remove_one(&id);
            }
            UsersAction::UpdateUser { id, changes } => {
                if let Err(err) = self.cache.entities_mut().patch_one(&id, changes) {
                    debug!(%err, "local update skipped");
                }
            }
            UsersAction::FetchUsersPending => {
                self.inflight_fetches += 1;
                self.cache.set_loading(true);
                self.cache.set_error(None);
            }
            UsersAction::FetchUsersFulfilled(users) => {
                self.finish_fetch();
                self.cache.set_error(None);
                match reconcile {
                    FetchReconcile::Merge => self.cache.entities_mut().upsert_many(users),
                    FetchReconcile::Replace => self.cache.entities_mut().set_all(users),
                }
            }
            UsersAction::FetchUsersRejected(message) => {
                self.finish_fetch();
                self.cache.set_error(Some(message));
            }
            UsersAction::AddUserPending(draft) => self.pending_drafts.push(draft),
            UsersAction::AddUserFulfilled { draft_id, user } => {
                self.drop_draft(&draft_id);
                self.confirmed_drafts.insert(draft_id, user.id.clone());
                self.cache.entities_mut().upsert_one(user);
            }
            UsersAction::AddUserRejected { draft_id } => self.drop_draft(&draft_id),
            UsersAction::RemoveUserFulfilled(id) => {
                self.cache.entities_mut().remove_one(&id);
            }
            UsersAction::UpdateUserFulfilled(user) => {
                let id = user.id.clone();
                if let Err(err) = self.cache.entities_mut().patch_one(&id, user.into()) {
                    warn!(%err, "confirmed update for a user no longer cached");
                }
            }
        }
    }

    fn finish_fetch(&mut self) {
        self.inflight_fetches = self.inflight_fetches.saturating_sub(1);
        self.cache.set_loading(self.inflight_fetches > 0);
    }

    fn drop_draft(&mut self, draft_id: &UserId) {
        self.pending_drafts.retain(|draft| &draft.id != draft_id);
    }
}

/// Session-scoped user store. Share it by `Arc`; every mutation goes
/// through [`UsersStore::dispatch`] and is announced to subscribers.
pub struct UsersStore {
    state: RwLock<UsersState>,
    reconcile: FetchReconcile,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for UsersStore {
    fn default() -> Self {
        Self::new(FetchReconcile::default())
    }
}

impl UsersStore {
    pub fn new(reconcile: FetchReconcile) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(UsersState::default()),
            reconcile,
            events,
        }
    }

    pub fn reconcile(&self) -> FetchReconcile {
        self.reconcile
    }

    pub async fn dispatch(&self, action: UsersAction) {
        let name = action.name();
        self.state.write().await.apply(action, self.reconcile);
        debug!(action = name, "applied users action");
        // No receivers is fine: nobody is watching yet.
        let _ = self.events.send(StoreEvent::Changed { action: name });
    }

    pub(crate) fn publish_settled(&self, operation: Operation, outcome: Result<(), TransportError>) {
        let _ = self
            .events
            .send(StoreEvent::OperationSettled { operation, outcome });
    }

    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> UsersSnapshot {
        let state = self.state.read().await;
        UsersSnapshot {
            users: state.cache.entities().all_sorted().cloned().collect(),
            loading: state.cache.loading(),
            error: state.cache.error().map(str::to_string),
            pending_drafts: state.pending_drafts.clone(),
        }
    }

    pub async fn select_all_users(&self) -> Vec<User> {
        let state = self.state.read().await;
        state.cache.entities().all_sorted().cloned().collect()
    }

    pub async fn select_user_by_id(&self, id: &UserId) -> Option<User> {
        let state = self.state.read().await;
        state.cache.entities().by_id(id).cloned()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.cache.loading()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.cache.error().map(str::to_string)
    }

    /// Server id a confirmed draft was stored under.
    pub async fn confirmed_id(&self, draft_id: &UserId) -> Option<UserId> {
        self.state.read().await.confirmed_drafts.get(draft_id).cloned()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
