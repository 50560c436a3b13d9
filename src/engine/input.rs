use crate::browser;
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;

/// Logical keys the game understands. Anything else the keyboard sends is
/// dropped at the browser boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Key {
    Up,
    Left,
    Down,
    Right,
    Attack,
    Block,
}

impl Key {
    const COUNT: usize = 6;

    /// `KeyboardEvent.code` to logical key. WASD and the arrows both steer.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Up),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyS" | "ArrowDown" => Some(Key::Down),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "Space" => Some(Key::Attack),
            "ShiftLeft" | "ShiftRight" => Some(Key::Block),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Left => 1,
            Key::Down => 2,
            Key::Right => 3,
            Key::Attack => 4,
            Key::Block => 5,
        }
    }
}

#[derive(Debug)]
pub enum KeyPress {
    KeyUp(Key),
    KeyDown(Key),
}

/// Pressed/released table over the fixed key set. Mutated only by the
/// per-frame drain below; actors read it, never write it.
#[derive(Debug, Default, Copy, Clone)]
pub struct KeyState {
    pressed: [bool; Key::COUNT],
}

impl KeyState {
    pub fn new() -> Self {
        KeyState::default()
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    pub fn any_movement(&self) -> bool {
        [Key::Up, Key::Left, Key::Down, Key::Right]
            .iter()
            .any(|key| self.is_pressed(*key))
    }

    fn set_pressed(&mut self, key: Key) {
        self.pressed[key.index()] = true;
    }

    fn set_released(&mut self, key: Key) {
        self.pressed[key.index()] = false;
    }
}

/// Drain every key event queued since the last frame into the state table.
pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
    loop {
        match keyevent_receiver.try_next() {
            Ok(None) => break,
            Err(_err) => break,
            Ok(Some(event)) => match event {
                KeyPress::KeyUp(key) => state.set_released(key),
                KeyPress::KeyDown(key) => state.set_pressed(key),
            },
        }
    }
}

/// Bind keydown/keyup on the window and funnel recognized keys into an
/// unbounded channel, drained once per frame by the game loop.
pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
    let (keydown_sender, keyevent_receiver) = unbounded();
    let keydown_sender = Rc::new(RefCell::new(keydown_sender));
    let keyup_sender = keydown_sender.clone();

    let onkeydown = browser::closure_wrap(Box::new(move |keycode: web_sys::KeyboardEvent| {
        if let Some(key) = Key::from_code(&keycode.code()) {
            let _ = keydown_sender
                .borrow_mut()
                .start_send(KeyPress::KeyDown(key));
        }
    }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

    let onkeyup = browser::closure_wrap(Box::new(move |keycode: web_sys::KeyboardEvent| {
        if let Some(key) = Key::from_code(&keycode.code()) {
            let _ = keyup_sender.borrow_mut().start_send(KeyPress::KeyUp(key));
        }
    }) as Box<dyn FnMut(web_sys::KeyboardEvent)>);

    let window = browser::window()?;
    window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
    onkeydown.forget();
    onkeyup.forget();

    Ok(keyevent_receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_to_the_same_keys() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Up));
        assert_eq!(Key::from_code("ArrowUp"), Some(Key::Up));
        assert_eq!(Key::from_code("KeyD"), Some(Key::Right));
        assert_eq!(Key::from_code("ArrowRight"), Some(Key::Right));
        assert_eq!(Key::from_code("Space"), Some(Key::Attack));
        assert_eq!(Key::from_code("ShiftLeft"), Some(Key::Block));
    }

    #[test]
    fn unknown_codes_are_dropped() {
        assert_eq!(Key::from_code("KeyQ"), None);
        assert_eq!(Key::from_code("Escape"), None);
    }

    #[test]
    fn press_and_release_round_trip() {
        let mut state = KeyState::new();
        assert!(!state.is_pressed(Key::Attack));

        state.set_pressed(Key::Attack);
        assert!(state.is_pressed(Key::Attack));
        assert!(!state.any_movement());

        state.set_pressed(Key::Left);
        assert!(state.any_movement());

        state.set_released(Key::Attack);
        state.set_released(Key::Left);
        assert!(!state.is_pressed(Key::Attack));
        assert!(!state.any_movement());
    }

    #[test]
    fn drained_events_mutate_the_table_in_order() {
        let (sender, mut receiver) = unbounded();
        let mut state = KeyState::new();

        sender.unbounded_send(KeyPress::KeyDown(Key::Right)).unwrap();
        sender.unbounded_send(KeyPress::KeyDown(Key::Attack)).unwrap();
        sender.unbounded_send(KeyPress::KeyUp(Key::Right)).unwrap();
        process_input(&mut state, &mut receiver);

        assert!(!state.is_pressed(Key::Right));
        assert!(state.is_pressed(Key::Attack));
    }
}
