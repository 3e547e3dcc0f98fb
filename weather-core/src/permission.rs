//! Re-runs the refresh flow when a denied geolocation permission is granted.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::LocationWeatherService;

/// Geolocation permission status as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Prompt,
}

/// True only for a "not granted → granted" transition while a location error
/// is on record.
pub fn should_auto_refresh(
    previous: PermissionState,
    next: PermissionState,
    has_location_error: bool,
) -> bool {
    next == PermissionState::Granted && previous != PermissionState::Granted && has_location_error
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Single-slot completion hook. Registering replaces the previous callback.
#[derive(Default)]
pub struct RefreshNotifier {
    slot: Mutex<Option<Callback>>,
}

impl RefreshNotifier {
    pub fn register<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.slot.lock() = Some(Arc::new(callback));
    }

    /// Invokes the registered callback, if any. Returns whether one ran.
    pub fn notify(&self) -> bool {
        // Clone out so the callback may re-register without deadlocking.
        let callback = self.slot.lock().clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for RefreshNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshNotifier")
            .field("registered", &self.slot.lock().is_some())
            .finish()
    }
}

/// Watches `permission` for the lifetime of the returned task.
///
/// On a qualifying transition the stale error is cleared, the service
/// refreshes, and after one more scheduler turn the registered
/// `on_data_refreshed` callback fires. A failed refresh does not fire it.
///
/// Changes that arrive while a refresh is running are collapsed by the
/// `watch` channel: only the latest status is seen afterwards, so a
/// granted → denied → granted flicker in that window counts as no transition.
pub fn observe_permission(
    service: Arc<LocationWeatherService>,
    mut permission: watch::Receiver<PermissionState>,
) -> JoinHandle<()> {
    let mut previous = *permission.borrow_and_update();

    tokio::spawn(async move {
        while permission.changed().await.is_ok() {
            let next = *permission.borrow_and_update();
            debug!(?previous, ?next, "geolocation permission changed");

            if should_auto_refresh(previous, next, service.has_location_error()) {
                info!("geolocation permission granted, refreshing");
                service.clear_location_error();

                match service.refresh().await {
                    Ok(()) => {
                        tokio::task::yield_now().await;
                        service.notifier().notify();
                    }
                    Err(e) => warn!(error = %e, "refresh after permission grant failed"),
                }
            }

            previous = next;
        }

        debug!("permission source closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::PositionAcquirer;
    use crate::testing::{FakeGeolocator, FakeProvider, taipei};
    use crate::PositionError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    use PermissionState::{Denied, Granted, Prompt};

    #[test]
    fn transition_rule_truth_table() {
        for previous in [Granted, Denied, Prompt] {
            for next in [Granted, Denied, Prompt] {
                for has_error in [false, true] {
                    let expected = next == Granted && previous != Granted && has_error;
                    assert_eq!(
                        should_auto_refresh(previous, next, has_error),
                        expected,
                        "{previous:?} -> {next:?}, error: {has_error}"
                    );
                }
            }
        }
    }

    #[test]
    fn notifier_is_single_slot() {
        let notifier = RefreshNotifier::default();
        assert!(!notifier.notify());

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        notifier.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = second.clone();
        notifier.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(notifier.notify());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    fn denied_service() -> (Arc<FakeGeolocator>, Arc<LocationWeatherService>) {
        let geo = Arc::new(FakeGeolocator::failing(PositionError::PermissionDenied));
        let service = Arc::new(LocationWeatherService::new(
            PositionAcquirer::new(geo.clone()),
            Arc::new(FakeProvider::default()),
        ));
        (geo, service)
    }

    #[tokio::test(start_paused = true)]
    async fn regrant_after_denial_refreshes_and_notifies() {
        let (geo, service) = denied_service();
        assert!(service.refresh().await.is_err());

        let (tx, rx) = watch::channel(Denied);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        service.on_data_refreshed(move || {
            let _ = done_tx.send(());
        });
        let observer = observe_permission(service.clone(), rx);

        geo.set(Ok(taipei()));
        tx.send(Granted).unwrap();

        tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .expect("callback must fire")
            .unwrap();

        let state = service.state();
        assert_eq!(state.location_error, None);
        assert_eq!(state.coordinates, Some(taipei()));
        assert!(state.last_updated.is_some());
        assert_eq!(geo.calls(), 2);

        observer.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn grant_without_prior_error_does_nothing() {
        let geo = Arc::new(FakeGeolocator::succeeding(taipei()));
        let service = Arc::new(LocationWeatherService::new(
            PositionAcquirer::new(geo.clone()),
            Arc::new(FakeProvider::default()),
        ));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        service.on_data_refreshed(move || {
            let _ = done_tx.send(());
        });

        let (tx, rx) = watch::channel(Prompt);
        let observer = observe_permission(service.clone(), rx);
        tx.send(Granted).unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(100), done_rx.recv()).await.is_err());
        assert_eq!(geo.calls(), 0);

        observer.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_does_not_notify() {
        let (geo, service) = denied_service();
        assert!(service.refresh().await.is_err());

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        service.on_data_refreshed(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, rx) = watch::channel(Denied);
        let observer = observe_permission(service.clone(), rx);
        tx.send(Granted).unwrap();

        let mut state_rx = service.subscribe();
        tokio::time::timeout(Duration::from_secs(1), state_rx.wait_for(|_| geo.calls() == 2))
            .await
            .expect("refresh must run")
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert!(service.state().location_error.is_some());

        observer.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn changes_during_refresh_collapse_to_latest() {
        let geo = Arc::new(FakeGeolocator::failing(PositionError::PermissionDenied).gated());
        let service = Arc::new(LocationWeatherService::new(
            PositionAcquirer::new(geo.clone()),
            Arc::new(FakeProvider::default()),
        ));
        geo.release();
        assert!(service.refresh().await.is_err());

        let (tx, rx) = watch::channel(Denied);
        let observer = observe_permission(service.clone(), rx);
        let mut state_rx = service.subscribe();

        tx.send(Granted).unwrap();
        state_rx.wait_for(|s| s.acquiring_position).await.unwrap();

        // Flicker while the refresh is still waiting for a position.
        tx.send(Denied).unwrap();
        tx.send(Granted).unwrap();
        geo.release();

        state_rx
            .wait_for(|s| !s.acquiring_position && s.location_error.is_some())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(geo.calls(), 2);

        observer.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn observer_stops_when_source_closes() {
        let (_geo, service) = denied_service();
        let (tx, rx) = watch::channel(Prompt);
        let observer = observe_permission(service, rx);

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), observer)
            .await
            .expect("observer must finish")
            .unwrap();
    }
}
