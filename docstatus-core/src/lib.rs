//! `docstatus-core` is the engine behind the `DocStatus` document verification
//! client: a session with a time-limited bearer token, a retrying request
//! pipeline, the verification client, history, and the scan state machine.
//! Everything the host app needs is exported through `UniFFI`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use docstatus_core::{
//!     BiometricAuthenticator, BiometricOutcome, BiometricPrompt, ClientConfig,
//!     DocStatusApp, StartDestination,
//!     storage::{InMemoryBlobStore, InMemoryHistoryStore},
//! };
//!
//! struct NoBiometrics;
//!
//! impl BiometricAuthenticator for NoBiometrics {
//!     fn can_authenticate(&self) -> bool {
//!         false
//!     }
//!
//!     fn authenticate(&self, _prompt: BiometricPrompt) -> BiometricOutcome {
//!         BiometricOutcome::Cancelled
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let app = DocStatusApp::new(
//!     ClientConfig::default(),
//!     Arc::new(InMemoryBlobStore::new()),
//!     Arc::new(InMemoryHistoryStore::new()),
//!     Arc::new(NoBiometrics),
//! )?;
//!
//! if app.start() == StartDestination::Login {
//!     app.login("alice".to_string(), "pw".to_string()).await?;
//! }
//! app.scanner().on_code_scanned("QR123".to_string()).await;
//! # Ok::<(), docstatus_core::DocStatusError>(())
//! # });
//! ```

mod app;
pub use app::*;

mod biometric;
pub use biometric::*;

mod client;
pub use client::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod history;
pub use history::*;

mod repository;
pub use repository::*;

mod scan;
pub use scan::*;

pub mod session;

pub mod storage;

mod types;
pub use types::*;

pub mod logger;

// private modules
mod http_request;
pub use http_request::RetryPolicy;
mod utils;

uniffi::setup_scaffolding!("docstatus_core");
