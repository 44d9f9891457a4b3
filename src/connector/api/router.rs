use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{AskController, ModelsController};

/// Routes the one-shot commands. `chat` and `serve` run until interrupted and
/// are driven from `main` directly.
pub struct Router<'a> {
    ask_controller: AskController<'a>,
    models_controller: ModelsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            ask_controller: AskController::new(container),
            models_controller: ModelsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ask {
                text,
                parent_message_id,
            } => self.ask_controller.ask(text, parent_message_id).await,
            Commands::Models => Ok(self.models_controller.list()),
            Commands::Chat | Commands::Serve { .. } => {
                unreachable!("long-running commands are handled separately in main")
            }
        }
    }
}
