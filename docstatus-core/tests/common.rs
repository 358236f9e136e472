//! Common test utilities shared across integration tests.

#![allow(dead_code, missing_docs)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docstatus_core::{
    storage::{InMemoryBlobStore, InMemoryHistoryStore},
    BiometricAuthenticator, BiometricOutcome, BiometricPrompt, ClientConfig, DocStatusApp,
    ScanObserver, ScanPhase, ScanSnapshot,
};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Biometric prompt with a canned answer that counts how often it was shown.
pub struct FakeBiometrics {
    available: bool,
    outcome: BiometricOutcome,
    prompts: AtomicUsize,
}

impl FakeBiometrics {
    pub fn new(available: bool, outcome: BiometricOutcome) -> Self {
        Self {
            available,
            outcome,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl BiometricAuthenticator for FakeBiometrics {
    fn can_authenticate(&self) -> bool {
        self.available
    }

    fn authenticate(&self, _prompt: BiometricPrompt) -> BiometricOutcome {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Records every snapshot the scanner publishes.
#[derive(Default)]
pub struct RecordingObserver {
    pub snapshots: Mutex<Vec<ScanSnapshot>>,
}

impl ScanObserver for RecordingObserver {
    fn on_scan_state_changed(&self, snapshot: ScanSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

pub struct TestApp {
    pub app: DocStatusApp,
    pub blobs: Arc<InMemoryBlobStore>,
    pub history: Arc<InMemoryHistoryStore>,
    pub biometrics: Arc<FakeBiometrics>,
}

/// Fast retries and a long result dwell, pointed at `base_url`.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        backoff_base: Duration::from_millis(10),
        result_dwell: Duration::from_secs(30),
        ..ClientConfig::with_base_url(base_url)
    }
}

pub fn test_app(config: ClientConfig) -> TestApp {
    test_app_with_biometrics(
        config,
        FakeBiometrics::new(true, BiometricOutcome::Success),
    )
}

pub fn test_app_with_biometrics(config: ClientConfig, biometrics: FakeBiometrics) -> TestApp {
    let blobs = Arc::new(InMemoryBlobStore::new());
    let history = Arc::new(InMemoryHistoryStore::new());
    let biometrics = Arc::new(biometrics);
    let app = DocStatusApp::new(config, blobs.clone(), history.clone(), biometrics.clone())
        .expect("app");
    TestApp {
        app,
        blobs,
        history,
        biometrics,
    }
}

/// Accepts connections and drops them without answering, so every request
/// fails at the transport level. Returns the address and an accept counter.
pub async fn spawn_dropping_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });
    (addr, accepted)
}

/// Accepts connections and holds them open without ever answering.
pub async fn spawn_silent_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });
    (addr, accepted)
}

/// Waits until the scanner reaches `phase` and returns that snapshot.
pub async fn wait_for_phase(
    rx: &mut watch::Receiver<ScanSnapshot>,
    phase: ScanPhase,
) -> ScanSnapshot {
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|s| s.phase == phase))
        .await
        .expect("timed out waiting for scanner phase")
        .expect("scanner dropped")
        .clone()
}

/// Waits until `counter` reaches `expected`.
pub async fn wait_for_count(counter: &AtomicUsize, expected: usize) {
    for _ in 0..100 {
        if counter.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
