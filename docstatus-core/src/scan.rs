//! Scan coordination: debouncing decoded codes, driving verifications and
//! holding the snapshot the scanner screen renders.
//!
//! ```text
//! Idle --scan--> Verifying --outcome--> Result --dwell/dismiss--> Idle
//!                                          |
//!                                          +--scan(other code)--> Verifying
//! ```
//!
//! Every accepted scan gets a generation number. Completions and dwell
//! timers that belong to an older generation are dropped, so a late
//! response never overwrites a fresher snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    repository::VerificationRepository,
    types::{DocStatus, VerificationOutcome},
};

/// Where the scanner is in its cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Enum)]
pub enum ScanPhase {
    /// Waiting for a code.
    #[default]
    Idle,
    /// A verification request is in flight.
    Verifying,
    /// A verdict is on screen.
    Result,
}

/// What the scanner screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ScanSnapshot {
    /// Current phase.
    pub phase: ScanPhase,
    /// The code being verified or whose verdict is shown.
    pub last_scanned_code: Option<String>,
    /// The verdict, once known.
    pub status: Option<DocStatus>,
    /// Whether a request is in flight.
    pub is_loading: bool,
    /// Server message or failure description.
    pub details: String,
}

/// Receives every snapshot the coordinator publishes.
#[uniffi::export(with_foreign)]
pub trait ScanObserver: Send + Sync {
    /// Called after each state change.
    fn on_scan_state_changed(&self, snapshot: ScanSnapshot);
}

struct ScanState {
    snapshot: ScanSnapshot,
    generation: u64,
    dwell_timer: Option<JoinHandle<()>>,
}

struct Shared {
    repository: Arc<VerificationRepository>,
    dwell: Duration,
    state: Mutex<ScanState>,
    sender: watch::Sender<ScanSnapshot>,
    observer: RwLock<Option<Arc<dyn ScanObserver>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes while the state lock is still held, so channel order always
    /// matches transition order.
    fn publish(&self, state: &ScanState) -> ScanSnapshot {
        let snapshot = state.snapshot.clone();
        self.sender.send_replace(snapshot.clone());
        snapshot
    }

    fn notify(&self, snapshot: ScanSnapshot) {
        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer.on_scan_state_changed(snapshot);
        }
    }

    fn complete(self: &Arc<Self>, generation: u64, outcome: VerificationOutcome) {
        let snapshot = {
            let mut state = self.lock();
            if state.generation != generation || state.snapshot.phase != ScanPhase::Verifying {
                log::debug!("discarding stale verification result (generation {generation})");
                return;
            }

            state.snapshot.phase = ScanPhase::Result;
            state.snapshot.status = Some(outcome.status);
            state.snapshot.is_loading = false;
            state.snapshot.details = outcome.description;

            let shared = Arc::clone(self);
            let dwell = self.dwell;
            state.dwell_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(dwell).await;
                shared.expire(generation);
            }));

            self.publish(&state)
        };
        self.notify(snapshot);
    }

    fn expire(&self, generation: u64) {
        let snapshot = {
            let mut state = self.lock();
            if state.generation != generation || state.snapshot.phase != ScanPhase::Result {
                return;
            }
            state.dwell_timer = None;
            state.snapshot = ScanSnapshot::default();
            self.publish(&state)
        };
        log::debug!("result dwell elapsed, scanner re-armed");
        self.notify(snapshot);
    }
}

/// Debounces scanned codes and drives one verification at a time.
#[derive(uniffi::Object)]
pub struct ScanCoordinator {
    shared: Arc<Shared>,
}

impl ScanCoordinator {
    /// Creates an idle coordinator. Results stay on screen for `dwell`.
    #[must_use]
    pub fn new(repository: Arc<VerificationRepository>, dwell: Duration) -> Self {
        let (sender, _) = watch::channel(ScanSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                repository,
                dwell,
                state: Mutex::new(ScanState {
                    snapshot: ScanSnapshot::default(),
                    generation: 0,
                    dwell_timer: None,
                }),
                sender,
                observer: RwLock::new(None),
            }),
        }
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.shared.sender.subscribe()
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl ScanCoordinator {
    /// Feeds a decoded code from the camera.
    ///
    /// Returns `false` without doing anything if a verification is already in
    /// flight or `code` is the code currently shown. Otherwise starts a
    /// verification in the background and returns `true` right away. Must be
    /// called from within a tokio runtime.
    pub async fn on_code_scanned(&self, code: String) -> bool {
        let (generation, snapshot) = {
            let mut state = self.shared.lock();
            if state.snapshot.phase == ScanPhase::Verifying {
                log::debug!("scan ignored: verification in progress");
                return false;
            }
            if state.snapshot.last_scanned_code.as_deref() == Some(code.as_str()) {
                log::debug!("scan ignored: same code as last scan");
                return false;
            }

            if let Some(timer) = state.dwell_timer.take() {
                timer.abort();
            }
            state.generation += 1;
            state.snapshot = ScanSnapshot {
                phase: ScanPhase::Verifying,
                last_scanned_code: Some(code.clone()),
                status: None,
                is_loading: true,
                details: String::new(),
            };
            (state.generation, self.shared.publish(&state))
        };
        self.shared.notify(snapshot);

        log::info!("verifying scanned code (generation {generation})");
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = shared.repository.check_and_save(&code, None).await;
            shared.complete(generation, outcome);
        });
        true
    }

    /// Clears a displayed result before the dwell time is up. Returns `false`
    /// when no result is on screen.
    pub fn dismiss(&self) -> bool {
        let snapshot = {
            let mut state = self.shared.lock();
            if state.snapshot.phase != ScanPhase::Result {
                return false;
            }
            if let Some(timer) = state.dwell_timer.take() {
                timer.abort();
            }
            state.snapshot = ScanSnapshot::default();
            self.shared.publish(&state)
        };
        self.shared.notify(snapshot);
        true
    }

    /// Returns to idle from any phase. A verification still in flight keeps
    /// running and is recorded in history, but its result is not shown.
    pub fn reset(&self) {
        let snapshot = {
            let mut state = self.shared.lock();
            if let Some(timer) = state.dwell_timer.take() {
                timer.abort();
            }
            state.generation += 1;
            state.snapshot = ScanSnapshot::default();
            self.shared.publish(&state)
        };
        self.shared.notify(snapshot);
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ScanSnapshot {
        self.shared.sender.borrow().clone()
    }

    /// Registers the observer notified on every change, replacing any
    /// previous one.
    pub fn set_observer(&self, observer: Arc<dyn ScanObserver>) {
        *self
            .shared
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    /// Removes the registered observer.
    pub fn clear_observer(&self) {
        *self
            .shared
            .observer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
