use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Surface that draws an interactable's prompt and outline.
pub trait Presentation: Send + Sync + 'static {
    fn set_visible(&mut self, visible: bool);
    /// Toggles the outline on every render primitive of the owner.
    fn set_highlighted(&mut self, highlighted: bool);
    fn refresh(&mut self, name: &str, action: &str, progress: f32);
}

/// What a prompt widget needs to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptView {
    pub visible: bool,
    pub highlighted: bool,
    pub name: String,
    pub action: String,
    pub progress: f32,
    /// Number of refresh requests received so far.
    pub refreshes: u32,
}

/// Clonable handle to a [`PromptView`]; one clone lives in the interactable,
/// the others are read by the UI.
#[derive(Debug, Clone, Default)]
pub struct SharedPrompt(Arc<Mutex<PromptView>>);

impl SharedPrompt {
    pub fn view(&self) -> PromptView {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PromptView> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Presentation for SharedPrompt {
    fn set_visible(&mut self, visible: bool) {
        self.lock().visible = visible;
    }

    fn set_highlighted(&mut self, highlighted: bool) {
        self.lock().highlighted = highlighted;
    }

    fn refresh(&mut self, name: &str, action: &str, progress: f32) {
        let mut view = self.lock();
        view.name.clear();
        view.name.push_str(name);
        view.action.clear();
        view.action.push_str(action);
        view.progress = progress;
        view.refreshes += 1;
    }
}
