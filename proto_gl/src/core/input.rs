//! Keyboard and mouse state polled by the game loop.
//!
//! Keys must be registered before they are tracked. Events for keys nobody
//! registered are dropped, and polling one logs a warning and reads as
//! released.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use glam::Vec2;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("key {0} is already registered and can't be registered again")]
    AlreadyRegistered(String),
}

#[derive(Debug, Clone)]
pub struct InputManager<K: Copy + Eq + Hash + Debug> {
    keys: HashMap<K, bool>,
    mouse_position: Vec2,
    mouse_motion: Vec2,
}

impl<K: Copy + Eq + Hash + Debug> Default for InputManager<K> {
    fn default() -> Self {
        InputManager {
            keys: HashMap::new(),
            mouse_position: Vec2::ZERO,
            mouse_motion: Vec2::ZERO,
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> InputManager<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_key(&mut self, key: K) -> Result<(), InputError> {
        if self.keys.contains_key(&key) {
            return Err(InputError::AlreadyRegistered(format!("{:?}", key)));
        }
        self.keys.insert(key, false);
        Ok(())
    }

    pub fn register_keys(&mut self, keys: impl IntoIterator<Item = K>) -> Result<(), InputError> {
        keys.into_iter().try_for_each(|key| self.register_key(key))
    }

    #[inline(always)]
    pub fn is_registered(&self, key: K) -> bool {
        self.keys.contains_key(&key)
    }

    /// Record a key event. Returns false if the key is not registered.
    pub fn update_key(&mut self, key: K, pressed: bool) -> bool {
        match self.keys.get_mut(&key) {
            Some(state) => {
                *state = pressed;
                true
            }
            None => false,
        }
    }

    pub fn is_key_pressed(&self, key: K) -> bool {
        match self.keys.get(&key) {
            Some(pressed) => *pressed,
            None => {
                log::warn!("Key {:?} not found! Please register it before using it", key);
                false
            }
        }
    }

    /// Mark every key as released, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.keys.values_mut().for_each(|pressed| *pressed = false);
    }

    #[inline(always)]
    pub fn update_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    #[inline(always)]
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Accumulate relative mouse motion until the next [InputManager::take_mouse_motion]
    #[inline(always)]
    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        self.mouse_motion += delta;
    }

    pub fn take_mouse_motion(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Up,
        Down,
        Space,
    }

    #[test]
    fn test_only_registered_keys_are_tracked() {
        let mut input = InputManager::new();
        input.register_keys([Key::Up, Key::Down]).unwrap();

        assert!(input.update_key(Key::Up, true));
        assert!(!input.update_key(Key::Space, true));

        assert!(input.is_key_pressed(Key::Up));
        assert!(!input.is_key_pressed(Key::Down));
        assert!(!input.is_key_pressed(Key::Space));

        input.release_all();
        assert!(!input.is_key_pressed(Key::Up));
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut input = InputManager::new();
        input.register_key(Key::Space).unwrap();
        assert_eq!(
            input.register_key(Key::Space),
            Err(InputError::AlreadyRegistered("Space".to_string()))
        );
    }

    #[test]
    fn test_mouse_motion_accumulates_until_taken() {
        let mut input = InputManager::<Key>::new();
        input.add_mouse_motion(Vec2::new(1.0, 2.0));
        input.add_mouse_motion(Vec2::new(-3.0, 1.0));

        assert_eq!(input.take_mouse_motion(), Vec2::new(-2.0, 3.0));
        assert_eq!(input.take_mouse_motion(), Vec2::ZERO);
    }
}
