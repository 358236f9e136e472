//! Generates the Kotlin and Swift bindings for the `docstatus` library.

fn main() {
    uniffi::uniffi_bindgen_main();
}
