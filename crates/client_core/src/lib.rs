use std::sync::Arc;

use shared::{
    domain::{User, UserId},
    error::TransportError,
    protocol::{UserPayload, UserUpdate},
};
use tracing::{info, warn};

pub mod store;
pub mod transport;

pub use store::{FetchReconcile, Operation, StoreEvent, UsersAction, UsersSnapshot, UsersStore};
pub use transport::{HttpUsersTransport, UsersTransport};

/// Drives remote user operations and folds their outcomes into a [`UsersStore`].
///
/// Every operation returns its outcome to the caller and publishes
/// [`StoreEvent::OperationSettled`]; only list failures are recorded in the
/// store's `error` flag. Operations may run concurrently; their results are
/// applied in completion order.
#[derive(Clone)]
pub struct UsersClient {
    store: Arc<UsersStore>,
    transport: Arc<dyn UsersTransport>,
}

impl UsersClient {
    pub fn new(store: Arc<UsersStore>, transport: Arc<dyn UsersTransport>) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &Arc<UsersStore> {
        &self.store
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, TransportError> {
        self.store.dispatch(UsersAction::FetchUsersPending).await;
        let outcome = self.transport.list_users().await;
        match &outcome {
            Ok(users) => {
                info!(
                    operation = Operation::FetchUsers.as_str(),
                    count = users.len(),
                    "fetched users"
                );
                self.store
                    .dispatch(UsersAction::FetchUsersFulfilled(users.clone()))
                    .await;
            }
            Err(err) => {
                warn!(operation = Operation::FetchUsers.as_str(), %err, "fetching users failed");
                self.store
                    .dispatch(UsersAction::FetchUsersRejected(err.to_string()))
                    .await;
            }
        }
        self.settle(Operation::FetchUsers, &outcome);
        outcome
    }

    /// Creates `draft` remotely. The draft is only tracked as pending; the
    /// record the server returns is what gets stored.
    pub async fn add_user_async(&self, draft: User) -> Result<User, TransportError> {
        let draft_id = draft.id.clone();
        let payload = UserPayload::from(&draft);
        self.store.dispatch(UsersAction::AddUserPending(draft)).await;

        let outcome = self.transport.create_user(&payload).await;
        match &outcome {
            Ok(user) => {
                info!(
                    operation = Operation::AddUser.as_str(),
                    draft_id = %draft_id,
                    user_id = %user.id,
                    "user created"
                );
                self.store
                    .dispatch(UsersAction::AddUserFulfilled {
                        draft_id,
                        user: user.clone(),
                    })
                    .await;
            }
            Err(err) => {
                warn!(
                    operation = Operation::AddUser.as_str(),
                    draft_id = %draft_id,
                    %err,
                    "creating user failed"
                );
                self.store
                    .dispatch(UsersAction::AddUserRejected { draft_id })
                    .await;
            }
        }
        self.settle(Operation::AddUser, &outcome);
        outcome
    }

    /// Shorthand for [`Self::add_user_async`] with a fresh draft id.
    pub async fn add_user_named(&self, name: &str) -> Result<User, TransportError> {
        self.add_user_async(User::draft(name)).await
    }

    pub async fn remove_user_async(&self, id: UserId) -> Result<UserId, TransportError> {
        let outcome = self.transport.delete_user(&id).await.map(|()| id.clone());
        match &outcome {
            Ok(id) => {
                info!(operation = Operation::RemoveUser.as_str(), user_id = %id, "user removed");
                self.store
                    .dispatch(UsersAction::RemoveUserFulfilled(id.clone()))
                    .await;
            }
            Err(err) => {
                warn!(operation = Operation::RemoveUser.as_str(), %err, "removing user failed");
            }
        }
        self.settle(Operation::RemoveUser, &outcome);
        outcome
    }

    pub async fn update_user_async(&self, update: UserUpdate) -> Result<User, TransportError> {
        let outcome = self
            .transport
            .update_user(&UserPayload::from(&update))
            .await;
        match &outcome {
            Ok(user) => {
                info!(operation = Operation::UpdateUser.as_str(), user_id = %user.id, "user updated");
                self.store
                    .dispatch(UsersAction::UpdateUserFulfilled(user.clone()))
                    .await;
            }
            Err(err) => {
                warn!(
                    operation = Operation::UpdateUser.as_str(),
                    user_id = %update.id,
                    %err,
                    "updating user failed"
                );
            }
        }
        self.settle(Operation::UpdateUser, &outcome);
        outcome
    }

    fn settle<T>(&self, operation: Operation, outcome: &Result<T, TransportError>) {
        let outcome = match outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        self.store.publish_settled(operation, outcome);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
