use std::fmt;
use tilescape_common::{Category, Placement};

/// All placements of a map, one ordered sequence per category.
///
/// Built once by the parser and read-only afterwards: the only mutator is
/// crate-private.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneStore {
    walls: Vec<Placement>,
    doors: Vec<Placement>,
    floors: Vec<Placement>,
    lights: Vec<Placement>,
    models: Vec<Placement>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, category: Category, placement: Placement) {
        match category {
            Category::Wall => self.walls.push(placement),
            Category::Door => self.doors.push(placement),
            Category::Floor => self.floors.push(placement),
            Category::Light => self.lights.push(placement),
            Category::Model => self.models.push(placement),
        }
    }

    /// Placements of one category in scan order.
    pub fn get(&self, category: Category) -> &[Placement] {
        match category {
            Category::Wall => &self.walls,
            Category::Door => &self.doors,
            Category::Floor => &self.floors,
            Category::Light => &self.lights,
            Category::Model => &self.models,
        }
    }

    pub fn walls(&self) -> &[Placement] {
        &self.walls
    }

    pub fn doors(&self) -> &[Placement] {
        &self.doors
    }

    pub fn floors(&self) -> &[Placement] {
        &self.floors
    }

    pub fn lights(&self) -> &[Placement] {
        &self.lights
    }

    pub fn models(&self) -> &[Placement] {
        &self.models
    }

    /// Total number of placements across all categories.
    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn counts(&self) -> SceneCounts {
        SceneCounts {
            walls: self.walls.len(),
            doors: self.doors.len(),
            floors: self.floors.len(),
            lights: self.lights.len(),
            models: self.models.len(),
        }
    }

    /// Every placement tagged with its category, category by category.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &Placement)> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.get(c).iter().map(move |p| (c, p)))
    }
}

/// Per-category record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneCounts {
    pub walls: usize,
    pub doors: usize,
    pub floors: usize,
    pub lights: usize,
    pub models: usize,
}

impl SceneCounts {
    pub fn total(&self) -> usize {
        self.walls + self.doors + self.floors + self.lights + self.models
    }
}

impl fmt::Display for SceneCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "walls={} doors={} floors={} lights={} models={}",
            self.walls, self.doors, self.floors, self.lights, self.models
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_store() {
        let store = SceneStore::new();
        assert!(store.is_empty());
        assert_eq!(store.total(), 0);
        assert_eq!(store.counts(), SceneCounts::default());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn store_cannot_be_deserialized() {
        use std::marker::PhantomData;

        // Inherent methods win over trait methods when their bounds hold.
        struct Check<T>(PhantomData<T>);
        trait Fallback {
            fn deserializable(&self) -> bool {
                false
            }
        }
        impl<T> Fallback for Check<T> {}
        impl<T: serde::de::DeserializeOwned> Check<T> {
            fn deserializable(&self) -> bool {
                true
            }
        }

        assert!(Check::<Placement>(PhantomData).deserializable());
        assert!(!Check::<SceneStore>(PhantomData).deserializable());
    }

    #[test]
    fn push_routes_by_category() {
        let mut store = SceneStore::new();
        store.push(Category::Wall, Placement::at(Vec3::X));
        store.push(Category::Floor, Placement::at(Vec3::Z));
        store.push(Category::Floor, Placement::at(Vec3::ZERO));

        assert_eq!(store.walls().len(), 1);
        assert_eq!(store.floors().len(), 2);
        assert_eq!(store.get(Category::Floor)[0].position, Vec3::Z);
        assert_eq!(store.total(), 3);
        assert_eq!(store.counts().to_string(), "walls=1 doors=0 floors=2 lights=0 models=0");
    }

    #[test]
    fn iter_walks_categories_in_order() {
        let mut store = SceneStore::new();
        store.push(Category::Model, Placement::default());
        store.push(Category::Wall, Placement::default());
        let cats: Vec<Category> = store.iter().map(|(c, _)| c).collect();
        assert_eq!(cats, vec![Category::Wall, Category::Model]);
    }
}
