//! Shared types for the tilescape viewer.
//!
//! # Invariants
//! - A placement is a plain value; it has no identity beyond where it is stored.
//! - Rotation is stored in degrees about the vertical (+Y) axis.

mod types;

pub use types::{Category, Placement};

pub fn crate_info() -> &'static str {
    concat!("tilescape-common v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
