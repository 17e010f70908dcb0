/// Tabular Store - an in-memory, schema-validated table
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `tabular-store-core`: schema generation, row validation, tables and queries

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
