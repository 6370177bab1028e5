//! Resource deletion workflow
//!
//! `ResourceDeletionCoordinator` holds the current listing, the selected
//! resource and the operation phase for one session. At most one storage
//! operation is in flight; calls that arrive while one is pending are
//! rejected, never queued.
//!
//! Storage requests run on spawned tasks, so an operation always runs to
//! completion and its result is applied exactly once, even if the caller
//! stops awaiting it. Completions are also published on a broadcast channel
//! for front ends that observe rather than await.

mod state;

pub use state::Phase;

use crate::client::StorageClient;
use crate::error::{DeleteError, RefreshError, SelectionError, StorageError};
use crate::resource::{ListingOrder, ResourceKind, ResourceListing, StorageResource};
use state::CoordinatorState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::debug;

const EVENT_CAPACITY: usize = 32;

/// Completion notice for a storage operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    ListingRefreshed { count: usize },
    RefreshFailed(StorageError),
    Deleted(StorageResource),
    DeleteFailed {
        resource: StorageResource,
        error: StorageError,
    },
}

struct Shared {
    client: Arc<dyn StorageClient>,
    order: ListingOrder,
    state: Mutex<CoordinatorState>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        // State transitions never panic halfway, so a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CoordinatorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Returns the coordinator to `Idle` if an operation task dies before completing
struct PhaseGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl PhaseGuard {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    /// Apply the operation's result, go back to `Idle` and publish its
    /// event under one lock, so events go out in completion order
    fn complete(mut self, apply: impl FnOnce(&mut CoordinatorState) -> CoordinatorEvent) {
        self.armed = false;
        let mut state = self.shared.lock();
        let event = apply(&mut state);
        state.finish();
        self.shared.publish(event);
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!("Storage operation ended without completing; resetting to idle");
            self.shared.lock().finish();
        }
    }
}

fn interrupted(error: JoinError) -> StorageError {
    StorageError::Interrupted(error.to_string())
}

/// Coordinates listing, selection and deletion of storage resources
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct ResourceDeletionCoordinator {
    shared: Arc<Shared>,
}

impl ResourceDeletionCoordinator {
    /// Create a coordinator with an empty listing
    pub fn new(client: Arc<dyn StorageClient>, order: ListingOrder) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                client,
                order,
                state: Mutex::new(CoordinatorState::default()),
                events,
            }),
        }
    }

    /// Current listing snapshot
    pub fn listing(&self) -> ResourceListing {
        self.shared.lock().listing.clone()
    }

    /// Currently selected resource, if any
    pub fn selection(&self) -> Option<StorageResource> {
        self.shared.lock().selection.clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Receive a `CoordinatorEvent` for every completed operation
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.shared.events.subscribe()
    }

    /// Fetch containers and queues and replace the listing
    ///
    /// On success the selection is cleared. On failure the previous
    /// listing and selection are kept.
    pub async fn refresh_listing(&self) -> Result<ResourceListing, RefreshError> {
        self.shared
            .lock()
            .begin(Phase::Loading)
            .map_err(RefreshError::OperationInProgress)?;
        debug!("Refreshing storage listing");

        let guard = PhaseGuard::new(Arc::clone(&self.shared));
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let fetched = futures::try_join!(
                shared.client.list_containers(),
                shared.client.list_queues()
            );

            match fetched {
                Ok((containers, queues)) => {
                    let listing = ResourceListing::merge(containers, queues, shared.order);
                    let count = listing.len();
                    guard.complete(|state| {
                        state.install_listing(listing.clone());
                        CoordinatorEvent::ListingRefreshed { count }
                    });
                    debug!("Listing refreshed with {} resources", count);
                    Ok(listing)
                }
                Err(error) => {
                    guard.complete(|_| CoordinatorEvent::RefreshFailed(error.clone()));
                    debug!("Listing refresh failed: {}", error);
                    Err(RefreshError::Storage(error))
                }
            }
        });

        task.await
            .unwrap_or_else(|e| Err(RefreshError::Storage(interrupted(e))))
    }

    /// Select a resource from the current listing
    pub fn select(&self, resource: &StorageResource) -> Result<(), SelectionError> {
        self.shared.lock().select(resource)
    }

    /// Select the listed resource with the given kind and name
    pub fn select_by_name(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<StorageResource, SelectionError> {
        let mut state = self.shared.lock();
        let resource = state
            .listing
            .find(kind, name)
            .cloned()
            .ok_or_else(|| SelectionError::NotInListing {
                kind,
                name: name.to_string(),
            })?;
        state.select(&resource)?;
        Ok(resource)
    }

    pub fn clear_selection(&self) {
        self.shared.lock().clear_selection();
    }

    /// Delete the selected resource
    ///
    /// On success the resource is removed from the listing, the selection
    /// is cleared and the deleted resource is returned. On failure the
    /// listing and selection are left as they were.
    pub async fn delete_selected(&self) -> Result<StorageResource, DeleteError> {
        let target = {
            let mut state = self.shared.lock();
            match state.phase {
                Phase::Idle => {}
                Phase::DeletePending => return Err(DeleteError::DeleteInProgress),
                busy => return Err(DeleteError::OperationInProgress(busy)),
            }
            let target = state.selection.clone().ok_or(DeleteError::NoSelection)?;
            state
                .begin(Phase::DeletePending)
                .map_err(DeleteError::OperationInProgress)?;
            target
        };
        debug!("Deleting {}", target);

        let guard = PhaseGuard::new(Arc::clone(&self.shared));
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let outcome = match &target {
                StorageResource::BlobContainer(container) => {
                    shared.client.delete_container(&container.name).await
                }
                StorageResource::Queue(queue) => shared.client.delete_queue(&queue.name).await,
            };

            match outcome {
                Ok(()) => {
                    guard.complete(|state| {
                        state.remove(&target);
                        CoordinatorEvent::Deleted(target.clone())
                    });
                    debug!("Deleted {}", target);
                    Ok(target)
                }
                Err(error) => {
                    guard.complete(|_| CoordinatorEvent::DeleteFailed {
                        resource: target.clone(),
                        error: error.clone(),
                    });
                    debug!("Delete of {} failed: {}", target, error);
                    Err(DeleteError::Storage(error))
                }
            }
        });

        task.await
            .unwrap_or_else(|e| Err(DeleteError::Storage(interrupted(e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{BlobContainer, Queue};
    use async_trait::async_trait;
    use mockall::mock;
    use std::time::Duration;
    use tokio::sync::Notify;

    mock! {
        pub Client {}

        #[async_trait]
        impl StorageClient for Client {
            async fn list_containers(&self) -> Result<Vec<BlobContainer>, StorageError>;
            async fn list_queues(&self) -> Result<Vec<Queue>, StorageError>;
            async fn delete_container(&self, name: &str) -> Result<(), StorageError>;
            async fn delete_queue(&self, name: &str) -> Result<(), StorageError>;
        }
    }

    fn container(name: &str) -> StorageResource {
        StorageResource::from(BlobContainer::new(name))
    }

    fn queue(name: &str) -> StorageResource {
        StorageResource::from(Queue::new(name))
    }

    /// Mock listing [Container "a", Queue "b"]
    fn listing_mock() -> MockClient {
        let mut client = MockClient::new();
        client
            .expect_list_containers()
            .returning(|| Ok(vec![BlobContainer::new("a")]));
        client
            .expect_list_queues()
            .returning(|| Ok(vec![Queue::new("b")]));
        client
    }

    async fn loaded(client: MockClient) -> ResourceDeletionCoordinator {
        let coordinator =
            ResourceDeletionCoordinator::new(Arc::new(client), ListingOrder::ContainersFirst);
        coordinator.refresh_listing().await.unwrap();
        coordinator
    }

    #[tokio::test]
    async fn test_refresh_merges_and_clears_selection() {
        let coordinator = loaded(listing_mock()).await;
        coordinator.select(&container("a")).unwrap();

        let listing = coordinator.refresh_listing().await.unwrap();

        assert_eq!(listing.as_slice(), &[container("a"), queue("b")]);
        assert_eq!(coordinator.listing(), listing);
        assert_eq!(coordinator.selection(), None);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_refresh_honours_queues_first() {
        let coordinator =
            ResourceDeletionCoordinator::new(Arc::new(listing_mock()), ListingOrder::QueuesFirst);

        let listing = coordinator.refresh_listing().await.unwrap();

        assert_eq!(listing.as_slice(), &[queue("b"), container("a")]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let mut client = MockClient::new();
        let mut calls = 0;
        client.expect_list_containers().returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(vec![BlobContainer::new("a")])
            } else {
                Err(StorageError::network("connection reset"))
            }
        });
        client.expect_list_queues().returning(|| Ok(Vec::new()));

        let coordinator = loaded(client).await;
        coordinator.select(&container("a")).unwrap();

        let err = coordinator.refresh_listing().await.unwrap_err();

        assert_eq!(
            err,
            RefreshError::Storage(StorageError::network("connection reset"))
        );
        assert_eq!(coordinator.listing().as_slice(), &[container("a")]);
        assert_eq!(coordinator.selection(), Some(container("a")));
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_select_round_trips_and_is_idempotent() {
        let coordinator = loaded(listing_mock()).await;

        coordinator.select(&queue("b")).unwrap();
        coordinator.select(&queue("b")).unwrap();

        assert_eq!(coordinator.selection(), Some(queue("b")));
    }

    #[tokio::test]
    async fn test_select_unknown_resource_changes_nothing() {
        let coordinator = loaded(listing_mock()).await;
        coordinator.select(&container("a")).unwrap();
        let before = coordinator.listing();

        let err = coordinator.select(&container("x")).unwrap_err();

        assert_eq!(
            err,
            SelectionError::NotInListing {
                kind: ResourceKind::BlobContainer,
                name: "x".to_string()
            }
        );
        assert_eq!(coordinator.listing(), before);
        assert_eq!(coordinator.selection(), Some(container("a")));
    }

    #[tokio::test]
    async fn test_select_requires_matching_kind() {
        let coordinator = loaded(listing_mock()).await;

        assert!(coordinator.select(&queue("a")).is_err());
        assert!(coordinator
            .select_by_name(ResourceKind::Queue, "a")
            .is_err());
        assert_eq!(
            coordinator.select_by_name(ResourceKind::Queue, "b"),
            Ok(queue("b"))
        );
    }

    #[tokio::test]
    async fn test_clear_selection() {
        let coordinator = loaded(listing_mock()).await;
        coordinator.clear_selection();
        coordinator.select(&container("a")).unwrap();

        coordinator.clear_selection();

        assert_eq!(coordinator.selection(), None);
    }

    #[tokio::test]
    async fn test_delete_without_selection() {
        let mut client = listing_mock();
        client.expect_delete_container().never();
        client.expect_delete_queue().never();
        let coordinator = loaded(client).await;

        assert_eq!(
            coordinator.delete_selected().await,
            Err(DeleteError::NoSelection)
        );
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_delete_container_success() {
        let mut client = listing_mock();
        client
            .expect_delete_container()
            .withf(|name| name == "a")
            .times(1)
            .returning(|_| Ok(()));
        client.expect_delete_queue().never();
        let coordinator = loaded(client).await;
        coordinator.select(&container("a")).unwrap();

        let deleted = coordinator.delete_selected().await.unwrap();

        assert_eq!(deleted, container("a"));
        assert_eq!(coordinator.listing().as_slice(), &[queue("b")]);
        assert_eq!(coordinator.selection(), None);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_delete_dispatches_queue_variant() {
        let mut client = listing_mock();
        client.expect_delete_container().never();
        client
            .expect_delete_queue()
            .withf(|name| name == "b")
            .times(1)
            .returning(|_| Ok(()));
        let coordinator = loaded(client).await;
        coordinator.select(&queue("b")).unwrap();

        coordinator.delete_selected().await.unwrap();

        assert_eq!(coordinator.listing().as_slice(), &[container("a")]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_listing_and_selection() {
        let mut client = MockClient::new();
        client
            .expect_list_containers()
            .returning(|| Ok(vec![BlobContainer::new("a")]));
        client.expect_list_queues().returning(|| Ok(Vec::new()));
        client
            .expect_delete_container()
            .times(1)
            .returning(|_| Err(StorageError::access_denied("AccessDenied")));
        let coordinator = loaded(client).await;
        coordinator.select(&container("a")).unwrap();
        let before = coordinator.listing();

        let err = coordinator.delete_selected().await.unwrap_err();

        assert_eq!(
            err,
            DeleteError::Storage(StorageError::access_denied("AccessDenied"))
        );
        assert_eq!(coordinator.listing(), before);
        assert_eq!(coordinator.selection(), Some(container("a")));
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_events_are_published_once_per_completion() {
        let mut client = listing_mock();
        client
            .expect_delete_queue()
            .returning(|_| Err(StorageError::not_found(ResourceKind::Queue, "b")));
        let coordinator =
            ResourceDeletionCoordinator::new(Arc::new(client), ListingOrder::ContainersFirst);
        let mut events = coordinator.subscribe();

        coordinator.refresh_listing().await.unwrap();
        coordinator.select(&queue("b")).unwrap();
        let _ = coordinator.delete_selected().await;

        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::ListingRefreshed { count: 2 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::DeleteFailed {
                resource: queue("b"),
                error: StorageError::not_found(ResourceKind::Queue, "b"),
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_follow_completion_order_across_handles() {
        let mut client = listing_mock();
        client.expect_delete_container().returning(|_| Ok(()));
        let coordinator =
            ResourceDeletionCoordinator::new(Arc::new(client), ListingOrder::ContainersFirst);
        let other = coordinator.clone();
        let mut events = coordinator.subscribe();

        coordinator.refresh_listing().await.unwrap();
        other.select(&container("a")).unwrap();
        other.delete_selected().await.unwrap();
        coordinator.refresh_listing().await.unwrap();

        // Each event is visible only once its state change is applied
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::ListingRefreshed { count: 2 }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::Deleted(container("a"))
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoordinatorEvent::ListingRefreshed { count: 2 }
        );
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_event_observers_see_applied_state() {
        let coordinator = ResourceDeletionCoordinator::new(
            Arc::new(listing_mock()),
            ListingOrder::ContainersFirst,
        );
        let mut events = coordinator.subscribe();

        let observer = tokio::spawn({
            let coordinator = coordinator.clone();
            async move {
                let event = events.recv().await.unwrap();
                (event, coordinator.phase(), coordinator.listing().len())
            }
        });
        coordinator.refresh_listing().await.unwrap();

        let (event, phase, len) = observer.await.unwrap();
        assert_eq!(event, CoordinatorEvent::ListingRefreshed { count: 2 });
        assert_eq!(phase, Phase::Idle);
        assert_eq!(len, 2);
    }

    /// Client whose deletes and listings wait until released
    struct GatedClient {
        hold_listing: bool,
        entered: Notify,
        release: Notify,
        delete_result: Result<(), StorageError>,
    }

    impl GatedClient {
        fn new(hold_listing: bool, delete_result: Result<(), StorageError>) -> Arc<Self> {
            Arc::new(Self {
                hold_listing,
                entered: Notify::new(),
                release: Notify::new(),
                delete_result,
            })
        }

        async fn wait_for_release(&self) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }

    #[async_trait]
    impl StorageClient for GatedClient {
        async fn list_containers(&self) -> Result<Vec<BlobContainer>, StorageError> {
            if self.hold_listing {
                self.wait_for_release().await;
            }
            Ok(vec![BlobContainer::new("a")])
        }

        async fn list_queues(&self) -> Result<Vec<Queue>, StorageError> {
            Ok(vec![Queue::new("b")])
        }

        async fn delete_container(&self, _name: &str) -> Result<(), StorageError> {
            self.wait_for_release().await;
            self.delete_result.clone()
        }

        async fn delete_queue(&self, _name: &str) -> Result<(), StorageError> {
            self.wait_for_release().await;
            self.delete_result.clone()
        }
    }

    #[tokio::test]
    async fn test_second_operation_rejected_while_delete_pending() {
        let client = GatedClient::new(false, Ok(()));
        let coordinator =
            ResourceDeletionCoordinator::new(client.clone(), ListingOrder::ContainersFirst);
        coordinator.refresh_listing().await.unwrap();
        coordinator.select(&container("a")).unwrap();

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.delete_selected().await }
        });
        client.entered.notified().await;

        assert_eq!(coordinator.phase(), Phase::DeletePending);
        assert_eq!(
            coordinator.delete_selected().await,
            Err(DeleteError::DeleteInProgress)
        );
        assert_eq!(
            coordinator.refresh_listing().await,
            Err(RefreshError::OperationInProgress(Phase::DeletePending))
        );

        client.release.notify_one();
        assert_eq!(pending.await.unwrap(), Ok(container("a")));
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(coordinator.listing().as_slice(), &[queue("b")]);
    }

    #[tokio::test]
    async fn test_second_operation_rejected_while_loading() {
        let client = GatedClient::new(true, Ok(()));
        let coordinator =
            ResourceDeletionCoordinator::new(client.clone(), ListingOrder::ContainersFirst);

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.refresh_listing().await }
        });
        client.entered.notified().await;

        assert_eq!(coordinator.phase(), Phase::Loading);
        assert_eq!(
            coordinator.refresh_listing().await,
            Err(RefreshError::OperationInProgress(Phase::Loading))
        );
        assert_eq!(
            coordinator.delete_selected().await,
            Err(DeleteError::OperationInProgress(Phase::Loading))
        );

        client.release.notify_one();
        let listing = pending.await.unwrap().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_delete_completes_after_caller_gives_up() {
        let client = GatedClient::new(false, Ok(()));
        let coordinator =
            ResourceDeletionCoordinator::new(client.clone(), ListingOrder::ContainersFirst);
        coordinator.refresh_listing().await.unwrap();
        coordinator.select(&container("a")).unwrap();
        let mut events = coordinator.subscribe();

        let caller = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.delete_selected().await }
        });
        client.entered.notified().await;
        caller.abort();
        client.release.notify_one();

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, CoordinatorEvent::Deleted(container("a")));
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(coordinator.listing().as_slice(), &[queue("b")]);
    }

    struct PanickingClient;

    #[async_trait]
    impl StorageClient for PanickingClient {
        async fn list_containers(&self) -> Result<Vec<BlobContainer>, StorageError> {
            Ok(vec![BlobContainer::new("a")])
        }

        async fn list_queues(&self) -> Result<Vec<Queue>, StorageError> {
            Ok(Vec::new())
        }

        async fn delete_container(&self, name: &str) -> Result<(), StorageError> {
            panic!("transport blew up deleting {name}");
        }

        async fn delete_queue(&self, _name: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_client_returns_to_idle() {
        let coordinator =
            ResourceDeletionCoordinator::new(Arc::new(PanickingClient), ListingOrder::ContainersFirst);
        coordinator.refresh_listing().await.unwrap();
        coordinator.select(&container("a")).unwrap();

        let err = coordinator.delete_selected().await.unwrap_err();

        assert!(matches!(
            err,
            DeleteError::Storage(StorageError::Interrupted(_))
        ));
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert_eq!(coordinator.listing().as_slice(), &[container("a")]);
        assert_eq!(coordinator.selection(), Some(container("a")));
    }
}
