use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tilescape_common::{Category, Placement};

/// What a single map character produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolRule {
    pub symbol: char,
    pub category: Category,
    /// Rotation override in degrees about +Y.
    #[serde(default)]
    pub rotation: f32,
    /// Also place a floor tile under the object.
    #[serde(default)]
    pub with_floor: bool,
}

impl SymbolRule {
    pub const fn new(symbol: char, category: Category) -> Self {
        Self {
            symbol,
            category,
            rotation: 0.0,
            with_floor: false,
        }
    }

    pub const fn rotated(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub const fn on_floor(mut self) -> Self {
        self.with_floor = true;
        self
    }

    /// Records produced at `position`: the primary object first, then its floor.
    pub fn emit(&self, position: Vec3) -> impl Iterator<Item = (Category, Placement)> {
        let primary = (
            self.category,
            Placement::at(position).with_rotation(self.rotation),
        );
        let floor = self
            .with_floor
            .then(|| (Category::Floor, Placement::at(position)));
        std::iter::once(primary).chain(floor)
    }
}

/// Character-keyed lookup of [`SymbolRule`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    rules: BTreeMap<char, SymbolRule>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl SymbolTable {
    /// A table with no rules; every character is skipped.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// The stock map alphabet.
    ///
    /// | Symbol | Produces |
    /// |---|---|
    /// | `W` | wall |
    /// | `D` | door + floor |
    /// | `d` | door rotated 90 degrees + floor |
    /// | `O` | floor |
    /// | `l` | light + floor |
    /// | `M` | model instance + floor |
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.extend([
            SymbolRule::new('W', Category::Wall),
            SymbolRule::new('D', Category::Door).on_floor(),
            SymbolRule::new('d', Category::Door).rotated(90.0).on_floor(),
            SymbolRule::new('O', Category::Floor),
            SymbolRule::new('l', Category::Light).on_floor(),
            SymbolRule::new('M', Category::Model).on_floor(),
        ]);
        table
    }

    /// Add or replace the rule for `rule.symbol`, returning the previous rule.
    pub fn insert(&mut self, rule: SymbolRule) -> Option<SymbolRule> {
        self.rules.insert(rule.symbol, rule)
    }

    pub fn remove(&mut self, symbol: char) -> Option<SymbolRule> {
        self.rules.remove(&symbol)
    }

    pub fn lookup(&self, symbol: char) -> Option<&SymbolRule> {
        self.rules.get(&symbol)
    }

    pub fn rules(&self) -> impl Iterator<Item = &SymbolRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Extend<SymbolRule> for SymbolTable {
    fn extend<T: IntoIterator<Item = SymbolRule>>(&mut self, iter: T) {
        for rule in iter {
            self.insert(rule);
        }
    }
}
