use crate::domain::CompletionModel;

use super::super::Container;

pub struct ModelsController<'a> {
    container: &'a Container,
}

impl<'a> ModelsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn list(&self) -> String {
        let current = self.container.model();
        let mut output = "Available models:\n\n".to_string();
        for model in CompletionModel::ALL {
            let marker = if model.as_str() == current { "*" } else { " " };
            output.push_str(&format!("  {} {}\n", marker, model));
        }
        output.push_str(&format!("\nCurrent default: {}", current));
        if !self.container.model_is_listed() {
            output.push_str(" (not in the list above; per-conversation overrides must be)");
        }
        output
    }
}
