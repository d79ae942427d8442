//! Single-flight scheduling, periodic polling, connectivity handling,
//! and persisted preferences.
//!
//! The coordinator is the sole mutual-exclusion point for sync and check
//! operations: at most one mutating sync and one check run concurrently
//! system-wide. Overlapping checks join the in-flight result; overlapping
//! mutating syncs are rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use quill_core::config::SyncPreferences;
use quill_core::constants::keys;
use quill_core::errors::{QuillError, QuillResult};
use quill_core::model::ComparisonResult;
use quill_core::traits::LocalStore;

use crate::service::{BidirectionalReport, PushReport, SyncService};

#[derive(Default)]
struct CheckFlight {
    /// Bumped each time a check completes; joiners compare against it.
    generation: u64,
    /// How the most recent generation ended. Joiners only adopt an `Ok`;
    /// after an `Err` they run their own check instead of handing back a
    /// stale success.
    outcome: Option<Result<ComparisonResult, String>>,
    /// Most recent successful comparison, kept for [`SyncCoordinator::last_check_result`].
    last: Option<ComparisonResult>,
}

/// Schedules checks and syncs over a [`SyncService`].
pub struct SyncCoordinator {
    service: Arc<SyncService>,
    store: Arc<dyn LocalStore>,
    preferences: Mutex<SyncPreferences>,
    flight: Mutex<CheckFlight>,
    /// Serializes check execution; joiners queue behind it.
    check_lock: Mutex<()>,
    /// try-locked by mutating syncs; contention means "sync in progress".
    sync_lock: Mutex<()>,
    checking: AtomicBool,
    online: AtomicBool,
}

impl SyncCoordinator {
    /// Build the coordinator, loading persisted preferences.
    pub async fn new(service: Arc<SyncService>, store: Arc<dyn LocalStore>) -> QuillResult<Self> {
        let preferences = match store.get(keys::PREFERENCES).await? {
            Some(value) => serde_json::from_value(value)?,
            None => SyncPreferences::default(),
        };
        Ok(Self {
            service,
            store,
            preferences: Mutex::new(preferences),
            flight: Mutex::new(CheckFlight::default()),
            check_lock: Mutex::new(()),
            sync_lock: Mutex::new(()),
            checking: AtomicBool::new(false),
            online: AtomicBool::new(true),
        })
    }

    /// The underlying service.
    pub fn service(&self) -> &Arc<SyncService> {
        &self.service
    }

    // --- Checks (single-flight, joining) ---

    /// Run a read-only update check. A call arriving while another check
    /// is in flight waits for it and returns its result instead of
    /// duplicating the work.
    pub async fn check_for_updates(&self) -> QuillResult<ComparisonResult> {
        let start_generation = self.flight.lock().await.generation;

        let _guard = self.check_lock.lock().await;

        // If a check completed successfully while we waited for the lock,
        // join it. A failed flight falls through to a fresh check.
        {
            let flight = self.flight.lock().await;
            if flight.generation > start_generation {
                if let Some(Ok(result)) = flight.outcome.clone() {
                    return Ok(result);
                }
            }
        }

        self.checking.store(true, Ordering::SeqCst);
        let result = self.service.check_for_updates().await;
        self.checking.store(false, Ordering::SeqCst);

        let mut flight = self.flight.lock().await;
        flight.generation += 1;
        match &result {
            Ok(comparison) => {
                flight.last = Some(comparison.clone());
                flight.outcome = Some(Ok(comparison.clone()));
            }
            Err(err) => flight.outcome = Some(Err(err.to_string())),
        }
        result
    }

    /// Whether a check is currently in flight.
    pub fn is_currently_checking(&self) -> bool {
        self.checking.load(Ordering::SeqCst)
    }

    /// The most recent completed check result, if any.
    pub async fn last_check_result(&self) -> Option<ComparisonResult> {
        self.flight.lock().await.last.clone()
    }

    // --- Mutating syncs (single-flight, rejecting) ---

    /// Run a bidirectional sync. Rejected with [`QuillError::SyncInProgress`]
    /// if another mutating sync is already running.
    pub async fn sync(&self) -> QuillResult<BidirectionalReport> {
        let Ok(_guard) = self.sync_lock.try_lock() else {
            return Err(QuillError::SyncInProgress);
        };
        self.service.bidirectional_sync().await
    }

    /// Run a push only. Same overlap rule as [`Self::sync`].
    pub async fn push(&self) -> QuillResult<PushReport> {
        let Ok(_guard) = self.sync_lock.try_lock() else {
            return Err(QuillError::SyncInProgress);
        };
        self.service.push().await
    }

    /// Whether a mutating sync is currently running.
    pub fn is_syncing(&self) -> bool {
        // A held lock means an operation is in flight.
        self.sync_lock.try_lock().is_err()
    }

    // --- Connectivity ---

    /// Consume a binary online/offline signal. The offline-to-online edge
    /// triggers at most one automatic queue flush; flapping cannot start
    /// duplicate flushes because the flush goes through the rejecting
    /// sync lock.
    pub async fn set_online(&self, online: bool) -> QuillResult<()> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if online && !was_online {
            let auto = self.preferences.lock().await.auto_sync_enabled;
            if auto && self.service.queue().has_pending().await {
                tracing::info!("connectivity restored, flushing pending changes");
                match self.push().await {
                    Ok(_) => {}
                    Err(QuillError::SyncInProgress) => {
                        // A manual sync is already flushing the queue.
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }

    /// Whether the network is currently reported online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    // --- Preferences ---

    pub async fn preferences(&self) -> SyncPreferences {
        self.preferences.lock().await.clone()
    }

    /// Replace and persist the preferences.
    pub async fn set_preferences(&self, preferences: SyncPreferences) -> QuillResult<()> {
        self.store
            .set(keys::PREFERENCES, serde_json::to_value(&preferences)?)
            .await?;
        *self.preferences.lock().await = preferences;
        Ok(())
    }

    // --- Periodic polling ---

    /// One periodic tick: check for updates when idle and online. The
    /// result is stored for `last_check_result`; a manual sync starting
    /// concurrently simply supersedes it.
    pub async fn tick(&self) {
        if !self.is_online() || self.is_currently_checking() || self.is_syncing() {
            return;
        }
        if let Err(err) = self.check_for_updates().await {
            tracing::debug!(error = %err, "periodic check failed");
        }
    }

    /// Spawn the periodic polling loop. The task runs until aborted; the
    /// interval follows the persisted preferences and pauses while
    /// auto-sync is disabled.
    pub fn spawn_periodic(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let (enabled, interval_ms) = {
                    let prefs = coordinator.preferences.lock().await;
                    (prefs.auto_sync_enabled, prefs.periodic_check_interval_ms)
                };
                tokio::time::sleep(Duration::from_millis(interval_ms.max(1))).await;
                if enabled {
                    coordinator.tick().await;
                }
            }
        })
    }
}
