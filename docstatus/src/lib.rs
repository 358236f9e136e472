//! `docstatus` is the library the Android and iOS apps link against. It
//! re-exports [`docstatus_core`] together with its `UniFFI` scaffolding so a
//! single native library carries the whole SDK.

pub use docstatus_core::*;

docstatus_core::uniffi_reexport_scaffolding!();
