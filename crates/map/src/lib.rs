//! Map loading: turns a plain-text character grid into a scene store.
//!
//! Row index is the depth axis (Z), column index is the lateral axis (X) and
//! every placement sits at Y = 0. Characters are classified through a
//! [`SymbolTable`]; characters with no rule are skipped.
//!
//! # Invariants
//! - Parsing is a single pass; the resulting [`SceneStore`] is never mutated
//!   afterwards.
//! - Record order within each category equals row-major scan order.
//! - A missing map is an error, an empty map is an empty store.

mod parser;
mod scene;
mod symbol;

pub use parser::{load_map, parse_lines, IgnoredCell, MapError, MapParser, ParseReport, ParsedMap};
pub use scene::{SceneCounts, SceneStore};
pub use symbol::{SymbolRule, SymbolTable};

pub fn crate_info() -> &'static str {
    concat!("tilescape-map v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("map"));
    }
}
