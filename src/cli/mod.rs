use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat in the terminal
    Chat,

    /// Send a single message and print the reply with its id
    Ask {
        text: String,

        /// Id of an earlier reply to continue from
        #[arg(short, long)]
        parent_message_id: Option<String>,
    },

    /// Serve the chat page and its JSON API over HTTP
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// List the model identifiers accepted by /model and the chat API
    Models,
}
