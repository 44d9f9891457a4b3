use anyhow::Result;

use crate::domain::{CompletionRequest, Turn};

use super::super::Container;

pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask(&self, text: String, parent_message_id: Option<String>) -> Result<String> {
        if text.trim().is_empty() {
            anyhow::bail!("Nothing to send: the message is blank");
        }

        let credential = self.container.credential()?;
        let mut request = CompletionRequest::new(text);
        if let Some(parent) = parent_message_id {
            request = request.with_parent_message_id(parent);
        }

        let turn = self
            .container
            .submit_use_case()
            .execute_detached(credential, &request)
            .await?;
        Ok(format_reply(&turn))
    }
}

fn format_reply(turn: &Turn) -> String {
    match turn.id() {
        Some(id) => format!("{}\n\n[id: {}]", turn.text(), id),
        None => turn.text().to_string(),
    }
}
