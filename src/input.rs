// src/input.rs
// Pointer / keyboard tracking for the map controls.
// Raw winit events go in, control gestures come out. Only one pointer drag is
// active at a time: the first button pressed owns the drag until released.

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::PerspectiveCamera;
use crate::controls::{MapControls, PanKey};

/// What a pointer drag does.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DragAction {
    Pan,
    Rotate,
    Dolly,
}

impl DragAction {
    pub fn for_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::Left => Some(DragAction::Pan),
            MouseButton::Right => Some(DragAction::Rotate),
            MouseButton::Middle => Some(DragAction::Dolly),
            _ => None,
        }
    }
}

/// A single control input derived from one window event.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Gesture {
    Pan(Vec2),
    Rotate(Vec2),
    /// Vertical drag distance, positive downward.
    DollyDrag(f32),
    /// Wheel step, positive away from the user (zoom in).
    Wheel(f32),
    KeyPan(PanKey),
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    position: Option<Vec2>,
    drag: Option<(MouseButton, DragAction)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_action(&self) -> Option<DragAction> {
        self.drag.map(|(_, action)| action)
    }

    /// Translate a window event. `scale_factor` converts physical cursor
    /// positions to logical pixels.
    pub fn handle_window_event(&mut self, event: &WindowEvent, scale_factor: f64) -> Option<Gesture> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.button(*button, *state == ElementState::Pressed);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale_factor);
                self.cursor_moved(Vec2::new(logical.x, logical.y))
            }
            WindowEvent::CursorLeft { .. } => {
                self.position = None;
                None
            }
            WindowEvent::Focused(false) => {
                self.drag = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                self.wheel(y)
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => self.key(*code),
            _ => None,
        }
    }

    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.drag.is_none() {
                if let Some(action) = DragAction::for_button(button) {
                    log::trace!("Drag start: {:?} ({:?})", action, button);
                    self.drag = Some((button, action));
                }
            }
        } else if matches!(self.drag, Some((b, _)) if b == button) {
            log::trace!("Drag end: {:?}", button);
            self.drag = None;
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) -> Option<Gesture> {
        let previous = self.position.replace(position)?;
        let (_, action) = self.drag?;
        let delta = position - previous;
        if delta == Vec2::ZERO {
            return None;
        }
        log::trace!("Drag {:?} by {:?}", action, delta);
        Some(match action {
            DragAction::Pan => Gesture::Pan(delta),
            DragAction::Rotate => Gesture::Rotate(delta),
            DragAction::Dolly => Gesture::DollyDrag(delta.y),
        })
    }

    pub fn wheel(&mut self, delta_y: f32) -> Option<Gesture> {
        (delta_y != 0.0).then_some(Gesture::Wheel(delta_y))
    }

    pub fn key(&mut self, code: KeyCode) -> Option<Gesture> {
        let key = match code {
            KeyCode::ArrowUp => PanKey::Up,
            KeyCode::ArrowDown => PanKey::Down,
            KeyCode::ArrowLeft => PanKey::Left,
            KeyCode::ArrowRight => PanKey::Right,
            _ => return None,
        };
        Some(Gesture::KeyPan(key))
    }
}

/// Feed one gesture into the controls.
pub fn apply_gesture(
    gesture: Gesture,
    controls: &mut MapControls,
    camera: &PerspectiveCamera,
    viewport_height: f32,
) {
    match gesture {
        Gesture::Pan(delta) => controls.pan(delta, camera, viewport_height),
        Gesture::Rotate(delta) => controls.rotate(delta, viewport_height),
        Gesture::DollyDrag(dy) => controls.dolly_drag(dy),
        Gesture::Wheel(dy) => controls.wheel(dy),
        Gesture::KeyPan(key) => controls.key_pan(key, camera, viewport_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlsConfig;
    use glam::Vec3;

    #[test]
    fn test_button_mapping() {
        assert_eq!(DragAction::for_button(MouseButton::Left), Some(DragAction::Pan));
        assert_eq!(DragAction::for_button(MouseButton::Right), Some(DragAction::Rotate));
        assert_eq!(DragAction::for_button(MouseButton::Middle), Some(DragAction::Dolly));
        assert_eq!(DragAction::for_button(MouseButton::Back), None);
    }

    #[test]
    fn test_drag_produces_deltas() {
        let mut p = PointerTracker::new();
        assert_eq!(p.cursor_moved(Vec2::new(10.0, 10.0)), None);
        p.button(MouseButton::Left, true);
        assert_eq!(p.cursor_moved(Vec2::new(15.0, 8.0)), Some(Gesture::Pan(Vec2::new(5.0, -2.0))));
        p.button(MouseButton::Left, false);
        assert_eq!(p.cursor_moved(Vec2::new(30.0, 30.0)), None);
        assert_eq!(p.drag_action(), None);
    }

    #[test]
    fn test_first_button_owns_drag() {
        let mut p = PointerTracker::new();
        p.cursor_moved(Vec2::ZERO);
        p.button(MouseButton::Right, true);
        p.button(MouseButton::Left, true);
        assert_eq!(p.drag_action(), Some(DragAction::Rotate));
        // releasing the other button leaves the drag alone
        p.button(MouseButton::Left, false);
        assert_eq!(p.cursor_moved(Vec2::new(0.0, 4.0)), Some(Gesture::Rotate(Vec2::new(0.0, 4.0))));
        p.button(MouseButton::Right, false);
        assert_eq!(p.drag_action(), None);
    }

    #[test]
    fn test_middle_drag_and_wheel() {
        let mut p = PointerTracker::new();
        p.cursor_moved(Vec2::ZERO);
        p.button(MouseButton::Middle, true);
        assert_eq!(p.cursor_moved(Vec2::new(3.0, 6.0)), Some(Gesture::DollyDrag(6.0)));
        assert_eq!(p.wheel(0.0), None);
        assert_eq!(p.wheel(-1.0), Some(Gesture::Wheel(-1.0)));
    }

    #[test]
    fn test_arrow_keys_pan() {
        let mut p = PointerTracker::new();
        assert_eq!(p.key(KeyCode::ArrowLeft), Some(Gesture::KeyPan(PanKey::Left)));
        assert_eq!(p.key(KeyCode::ArrowDown), Some(Gesture::KeyPan(PanKey::Down)));
        assert_eq!(p.key(KeyCode::KeyW), None);
    }

    #[test]
    fn test_apply_gesture_reaches_controls() {
        let mut controls = MapControls::new(ControlsConfig::default());
        let mut cam = PerspectiveCamera::new(100.0, 1.0, 0.1, 700.0);
        cam.position = Vec3::new(0.0, 0.0, 200.0);
        apply_gesture(Gesture::Wheel(1.0), &mut controls, &cam, 600.0);
        assert!(!controls.is_settled());
        assert!(controls.update(&mut cam));
    }
}
