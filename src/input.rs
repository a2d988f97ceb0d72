//! Window input, queued per frame and mapped to viewer actions.

use std::collections::HashMap;

use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::MoveDirection;
use crate::config::Technique;

/// Phase of a key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

impl KeyAction {
    fn from_key_event(event: &KeyEvent) -> Self {
        match (event.state, event.repeat) {
            (ElementState::Released, _) => Self::Release,
            (ElementState::Pressed, true) => Self::Repeat,
            (ElementState::Pressed, false) => Self::Press,
        }
    }
}

/// An input event waiting for the next frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Pointer position in physical pixels.
    PointerMoved { x: f32, y: f32 },
    Key { key: KeyCode, action: KeyAction },
    Resized { width: u32, height: u32 },
}

/// Events collected between frames.
///
/// Window callbacks push into the queue and the frame loop drains it once per
/// frame. Pointer moves are coalesced: only the latest position survives,
/// since the pointer is re-centered after every frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
    close_requested: bool,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.events
            .retain(|e| !matches!(e, InputEvent::PointerMoved { .. }));
        self.events.push(InputEvent::PointerMoved { x, y });
    }

    pub fn on_key(&mut self, key: KeyCode, action: KeyAction) {
        self.events.push(InputEvent::Key { key, action });
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.events.push(InputEvent::Resized { width, height });
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Translate a window event into queued input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.on_key(key, KeyAction::from_key_event(event));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_pointer_move(position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => self.on_resize(size.width, size.height),
            WindowEvent::CloseRequested => self.request_close(),
            _ => {}
        }
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, InputEvent> {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// What a key does once bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Move(MoveDirection),
    /// Restore the start pose and the technique's default view state.
    ResetCamera,
    /// Show the raw shadow map instead of the lit scene.
    ToggleDebugView,
    /// Switch between sharp and soft ray-cast shadows.
    ToggleQuality,
    Quit,
}

impl Action {
    /// Movement follows key repeat. Everything else fires once per press.
    fn fires_on(self, phase: KeyAction) -> bool {
        match (self, phase) {
            (_, KeyAction::Release) => false,
            (Self::Move(_), _) => true,
            (_, KeyAction::Repeat) => false,
            (_, KeyAction::Press) => true,
        }
    }
}

/// Key to action table.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    map: HashMap<KeyCode, Action>,
}

impl Bindings {
    /// Movement and quit keys shared by every technique.
    pub fn common() -> Self {
        let mut bindings = Self::default();
        bindings
            .bind(KeyCode::KeyW, Action::Move(MoveDirection::Forward))
            .bind(KeyCode::KeyS, Action::Move(MoveDirection::Back))
            .bind(KeyCode::KeyA, Action::Move(MoveDirection::Left))
            .bind(KeyCode::KeyD, Action::Move(MoveDirection::Right))
            .bind(KeyCode::KeyR, Action::Move(MoveDirection::Up))
            .bind(KeyCode::KeyF, Action::Move(MoveDirection::Down))
            .bind(KeyCode::KeyC, Action::Quit)
            .bind(KeyCode::Escape, Action::Quit);
        bindings
    }

    pub fn for_technique(technique: Technique) -> Self {
        let mut bindings = Self::common();
        match technique {
            Technique::ShadowMap => {
                bindings
                    .bind(KeyCode::Digit1, Action::ResetCamera)
                    .bind(KeyCode::Digit2, Action::ToggleDebugView);
            }
            Technique::RayCast => {
                bindings
                    .bind(KeyCode::Digit0, Action::ResetCamera)
                    .bind(KeyCode::Digit1, Action::ToggleQuality);
            }
        }
        bindings
    }

    pub fn bind(&mut self, key: KeyCode, action: Action) -> &mut Self {
        self.map.insert(key, action);
        self
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<Action> {
        self.map.remove(&key)
    }

    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// The action a key event triggers, if any.
    pub fn resolve(&self, key: KeyCode, phase: KeyAction) -> Option<Action> {
        self.action_for(key).filter(|action| action.fires_on(phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_moves_coalesce_to_latest() {
        let mut queue = InputQueue::new();
        queue.on_pointer_move(10.0, 10.0);
        queue.on_key(KeyCode::KeyW, KeyAction::Press);
        queue.on_pointer_move(20.0, 30.0);
        queue.on_pointer_move(40.0, 50.0);

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(
            events,
            vec![
                InputEvent::Key { key: KeyCode::KeyW, action: KeyAction::Press },
                InputEvent::PointerMoved { x: 40.0, y: 50.0 },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn keys_and_resizes_keep_arrival_order() {
        let mut queue = InputQueue::new();
        queue.on_key(KeyCode::KeyW, KeyAction::Press);
        queue.on_resize(800, 600);
        queue.on_key(KeyCode::KeyW, KeyAction::Repeat);
        queue.on_key(KeyCode::KeyW, KeyAction::Release);

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1], InputEvent::Resized { width: 800, height: 600 });
        assert_eq!(
            events[3],
            InputEvent::Key { key: KeyCode::KeyW, action: KeyAction::Release }
        );
    }

    #[test]
    fn movement_follows_repeat_but_not_release() {
        let bindings = Bindings::for_technique(Technique::RayCast);
        let forward = Some(Action::Move(MoveDirection::Forward));
        assert_eq!(bindings.resolve(KeyCode::KeyW, KeyAction::Press), forward);
        assert_eq!(bindings.resolve(KeyCode::KeyW, KeyAction::Repeat), forward);
        assert_eq!(bindings.resolve(KeyCode::KeyW, KeyAction::Release), None);
    }

    #[test]
    fn toggles_ignore_repeat() {
        let bindings = Bindings::for_technique(Technique::ShadowMap);
        assert_eq!(
            bindings.resolve(KeyCode::Digit2, KeyAction::Press),
            Some(Action::ToggleDebugView)
        );
        assert_eq!(bindings.resolve(KeyCode::Digit2, KeyAction::Repeat), None);
        assert_eq!(bindings.resolve(KeyCode::Digit2, KeyAction::Release), None);
    }

    #[test]
    fn digit_keys_differ_per_technique() {
        let shadow = Bindings::for_technique(Technique::ShadowMap);
        let ray = Bindings::for_technique(Technique::RayCast);

        assert_eq!(shadow.action_for(KeyCode::Digit1), Some(Action::ResetCamera));
        assert_eq!(ray.action_for(KeyCode::Digit1), Some(Action::ToggleQuality));
        assert_eq!(ray.action_for(KeyCode::Digit0), Some(Action::ResetCamera));
        assert_eq!(shadow.action_for(KeyCode::Digit0), None);
        assert_eq!(ray.action_for(KeyCode::Digit2), None);
    }

    #[test]
    fn bindings_can_be_remapped() {
        let mut bindings = Bindings::for_technique(Technique::ShadowMap);
        bindings.unbind(KeyCode::KeyW);
        bindings.bind(KeyCode::ArrowUp, Action::Move(MoveDirection::Forward));

        assert_eq!(bindings.resolve(KeyCode::KeyW, KeyAction::Press), None);
        assert_eq!(
            bindings.resolve(KeyCode::ArrowUp, KeyAction::Press),
            Some(Action::Move(MoveDirection::Forward))
        );
    }

    #[test]
    fn quit_is_bound_everywhere() {
        for technique in [Technique::ShadowMap, Technique::RayCast] {
            let bindings = Bindings::for_technique(technique);
            assert_eq!(bindings.action_for(KeyCode::KeyC), Some(Action::Quit));
            assert_eq!(bindings.action_for(KeyCode::Escape), Some(Action::Quit));
        }
    }
}
