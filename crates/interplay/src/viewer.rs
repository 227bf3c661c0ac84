use std::collections::HashSet;

use bevy::prelude::*;

use interplay_client::events::InteractInput;
use interplay_client::interaction::{FocusedPrompt, ViewerPose};
use interplay_protocol::handle::ObjectHandle;
use interplay_protocol::scenario::ViewerPath;

/// Walks the local player along the scenario path and presses interact
/// on every prop it looks at, once.
#[derive(Resource)]
pub struct ScriptedViewer {
    pub walk: ViewerPath,
    pub hold: f32,
    pub frames_left: u32,
    elapsed: f32,
    pressed_at: Option<f32>,
    used: HashSet<ObjectHandle>,
}

impl ScriptedViewer {
    pub fn new(walk: ViewerPath, hold: f32, frames: u32) -> Self {
        Self {
            walk,
            hold,
            frames_left: frames,
            elapsed: 0.0,
            pressed_at: None,
            used: HashSet::new(),
        }
    }

    /// Decide what to do with the interact key this frame.
    pub fn next_input(&mut self, focused: Option<ObjectHandle>) -> Option<InteractInput> {
        match (self.pressed_at, focused) {
            (Some(at), target) => {
                if target.is_none() || self.elapsed - at >= self.hold {
                    self.pressed_at = None;
                    Some(InteractInput::Released)
                } else {
                    None
                }
            }
            (None, Some(target)) if self.used.insert(target) => {
                self.pressed_at = Some(self.elapsed);
                Some(InteractInput::Pressed)
            }
            (None, _) => None,
        }
    }
}

pub fn drive_viewer(
    time: Res<Time>,
    mut viewer: ResMut<ScriptedViewer>,
    mut pose: ResMut<ViewerPose>,
    prompt: Res<FocusedPrompt>,
    mut inputs: EventWriter<InteractInput>,
    mut exit: EventWriter<AppExit>,
) {
    viewer.elapsed += time.delta_secs();
    pose.set_if_neq(ViewerPose(viewer.walk.view_at(viewer.elapsed)));

    let focused = prompt.0.as_ref().map(|(target, _)| *target);
    if let Some(input) = viewer.next_input(focused) {
        inputs.send(input);
    }

    viewer.frames_left = viewer.frames_left.saturating_sub(1);
    if viewer.frames_left == 0 {
        info!("Scripted walk finished after {:.1}s", viewer.elapsed);
        exit.send(AppExit::Success);
    }
}

/// Log the prompt whenever the focused prop changes.
pub fn log_prompt(prompt: Res<FocusedPrompt>, mut shown: Local<Option<ObjectHandle>>) {
    let current = prompt.0.as_ref().map(|(target, _)| *target);
    if current == *shown {
        return;
    }
    *shown = current;

    match &prompt.0 {
        Some((_, view)) => info!("[prompt] {} - {}", view.name, view.action),
        None => info!("[prompt] hidden"),
    }
}

#[cfg(test)]
mod tests {
    use interplay_protocol::handle::ObjectTable;
    use interplay_protocol::scenario::Scenario;

    use super::*;

    #[test]
    fn presses_each_target_once_and_releases_after_hold() {
        let mut objects = ObjectTable::default();
        let chest = objects.spawn();
        let mut viewer = ScriptedViewer::new(Scenario::default().walk, 1.0, 100);

        assert_eq!(viewer.next_input(None), None);
        assert_eq!(viewer.next_input(Some(chest)), Some(InteractInput::Pressed));
        viewer.elapsed = 0.5;
        assert_eq!(viewer.next_input(Some(chest)), None);
        viewer.elapsed = 1.0;
        assert_eq!(viewer.next_input(Some(chest)), Some(InteractInput::Released));
        assert_eq!(viewer.next_input(Some(chest)), None);
    }

    #[test]
    fn losing_the_target_releases_early() {
        let mut objects = ObjectTable::default();
        let lever = objects.spawn();
        let mut viewer = ScriptedViewer::new(Scenario::default().walk, 5.0, 100);

        viewer.next_input(Some(lever));
        assert_eq!(viewer.next_input(None), Some(InteractInput::Released));
    }
}
