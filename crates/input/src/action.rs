use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Errors from interpreting input configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("texture pack must be 1, 2 or 3 (got {0})")]
    InvalidTexturePack(u8),
    #[error("not a texture pack number: {0:?}")]
    UnparsableTexturePack(String),
}

/// Keys the viewer reacts to. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    W,
    A,
    S,
    D,
    Digit1,
    Digit2,
    Digit3,
    Escape,
    F1,
    Other,
}

/// Camera movement directions relative to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// One of the three selectable floor/wall texture sets, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TexturePack(u8);

impl TexturePack {
    pub const COUNT: u8 = 3;

    pub fn new(number: u8) -> Result<Self, InputError> {
        if (1..=Self::COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(InputError::InvalidTexturePack(number))
        }
    }

    /// 1-based pack number as shown to the user.
    pub fn number(self) -> u8 {
        self.0
    }

    /// 0-based index into pack tables.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = TexturePack> {
        (1..=Self::COUNT).map(TexturePack)
    }
}

impl Default for TexturePack {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for TexturePack {
    type Error = InputError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::new(number)
    }
}

impl FromStr for TexturePack {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| InputError::UnparsableTexturePack(s.to_string()))?;
        Self::new(number)
    }
}

impl fmt::Display for TexturePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pack {}", self.0)
    }
}

/// A high-level viewer action.
///
/// The viewer consumes actions, never raw key codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move the camera while the key is held.
    Move(MoveDirection),
    /// Rotate the view. Positive `dy` pitches up.
    Look { dx: f32, dy: f32 },
    /// Change the field of view. Positive values zoom in.
    Zoom(f32),
    /// Swap the floor and wall textures.
    SelectTexturePack(TexturePack),
    /// Show or hide the overlay.
    ToggleHud,
    /// Close the viewer.
    Quit,
    /// Unbound input.
    Noop,
}

impl Action {
    /// Look action from a raw mouse delta, where screen Y grows downwards.
    pub fn look_from_mouse(dx: f64, dy: f64) -> Self {
        Action::Look {
            dx: dx as f32,
            dy: -dy as f32,
        }
    }

    /// Zoom action from a scroll delta in lines.
    pub fn zoom_from_scroll(lines: f32) -> Self {
        Action::Zoom(lines)
    }
}

/// Directions currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementState {
    held: BTreeSet<MoveDirection>,
}

impl MovementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, direction: MoveDirection) {
        self.held.insert(direction);
    }

    pub fn release(&mut self, direction: MoveDirection) {
        self.held.remove(&direction);
    }

    pub fn is_held(&self, direction: MoveDirection) -> bool {
        self.held.contains(&direction)
    }

    pub fn held(&self) -> impl Iterator<Item = MoveDirection> + '_ {
        self.held.iter().copied()
    }

    /// Forget all held keys, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Key to action table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<Key, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let pack = |n| Action::SelectTexturePack(TexturePack(n));
        let bindings = HashMap::from([
            (Key::W, Action::Move(MoveDirection::Forward)),
            (Key::S, Action::Move(MoveDirection::Backward)),
            (Key::A, Action::Move(MoveDirection::Left)),
            (Key::D, Action::Move(MoveDirection::Right)),
            (Key::Digit1, pack(1)),
            (Key::Digit2, pack(2)),
            (Key::Digit3, pack(3)),
            (Key::Escape, Action::Quit),
            (Key::F1, Action::ToggleHud),
        ]);
        Self { bindings }
    }
}

impl KeyBindings {
    pub fn bind(&mut self, key: Key, action: Action) -> Option<Action> {
        self.bindings.insert(key, action)
    }

    pub fn action_for(&self, key: Key) -> Action {
        self.bindings.get(&key).copied().unwrap_or(Action::Noop)
    }

    /// Feed a key transition.
    ///
    /// Movement keys update `movement` and yield nothing; other bound keys
    /// yield their action on press only.
    pub fn on_key(&self, key: Key, pressed: bool, movement: &mut MovementState) -> Option<Action> {
        match self.action_for(key) {
            Action::Move(direction) => {
                if pressed {
                    movement.press(direction);
                } else {
                    movement.release(direction);
                }
                None
            }
            Action::Noop => None,
            action if pressed => {
                tracing::debug!(?key, ?action, "key action");
                Some(action)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_pack_range() {
        assert!(TexturePack::new(0).is_err());
        assert_eq!(TexturePack::new(1).unwrap().index(), 0);
        assert_eq!(TexturePack::new(3).unwrap().index(), 2);
        assert_eq!(
            TexturePack::new(4),
            Err(InputError::InvalidTexturePack(4))
        );
        assert_eq!(TexturePack::default().number(), 1);
        assert_eq!(TexturePack::all().count(), 3);
    }

    #[test]
    fn texture_pack_from_str() {
        assert_eq!("2".parse::<TexturePack>().unwrap().number(), 2);
        assert!(matches!(
            "two".parse::<TexturePack>(),
            Err(InputError::UnparsableTexturePack(_))
        ));
        assert!("9".parse::<TexturePack>().is_err());
    }

    #[test]
    fn default_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(Key::W), Action::Move(MoveDirection::Forward));
        assert_eq!(keys.action_for(Key::A), Action::Move(MoveDirection::Left));
        assert_eq!(
            keys.action_for(Key::Digit3),
            Action::SelectTexturePack(TexturePack::new(3).unwrap())
        );
        assert_eq!(keys.action_for(Key::Escape), Action::Quit);
        assert_eq!(keys.action_for(Key::Other), Action::Noop);
    }

    #[test]
    fn movement_keys_are_held() {
        let keys = KeyBindings::default();
        let mut movement = MovementState::new();

        assert_eq!(keys.on_key(Key::W, true, &mut movement), None);
        assert_eq!(keys.on_key(Key::D, true, &mut movement), None);
        assert!(movement.is_held(MoveDirection::Forward));
        assert_eq!(movement.held().count(), 2);

        keys.on_key(Key::W, false, &mut movement);
        assert!(!movement.is_held(MoveDirection::Forward));
        assert!(movement.is_held(MoveDirection::Right));

        movement.clear();
        assert_eq!(movement.held().count(), 0);
    }

    #[test]
    fn discrete_keys_fire_on_press_only() {
        let keys = KeyBindings::default();
        let mut movement = MovementState::new();
        assert_eq!(
            keys.on_key(Key::Digit2, true, &mut movement),
            Some(Action::SelectTexturePack(TexturePack::new(2).unwrap()))
        );
        assert_eq!(keys.on_key(Key::Digit2, false, &mut movement), None);
        assert_eq!(keys.on_key(Key::Other, true, &mut movement), None);
    }

    #[test]
    fn rebinding() {
        let mut keys = KeyBindings::default();
        let old = keys.bind(Key::F1, Action::Quit);
        assert_eq!(old, Some(Action::ToggleHud));
        assert_eq!(keys.action_for(Key::F1), Action::Quit);
    }

    #[test]
    fn mouse_look_inverts_screen_y() {
        assert_eq!(
            Action::look_from_mouse(4.0, 2.0),
            Action::Look { dx: 4.0, dy: -2.0 }
        );
        assert_eq!(Action::zoom_from_scroll(1.5), Action::Zoom(1.5));
    }
}
