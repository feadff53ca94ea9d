//! Input mapping: platform keys and mouse motion turned into viewer actions.
//!
//! # Invariants
//! - The windowing layer translates its key codes into [`Key`]; nothing in
//!   this crate depends on a windowing library.
//! - Actions never touch the scene store; they only drive the camera and the
//!   selected texture pack.

pub mod action;

pub use action::{Action, InputError, Key, KeyBindings, MoveDirection, MovementState, TexturePack};

pub fn crate_info() -> &'static str {
    concat!("tilescape-input v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
