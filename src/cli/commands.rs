use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `chatterm` - terminal client for a session-based chat backend.
#[derive(Parser, Debug)]
#[command(name = "chatterm")]
#[command(version = "0.1.0")]
#[command(about = "Chat with a session-based backend from the terminal.", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides the saved server_url setting)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send messages to the active session (interactive without -m)
    Chat {
        /// Single message mode (don't enter the interactive loop)
        #[arg(short, long)]
        message: Option<String>,

        /// Attach a file to the message
        #[arg(long)]
        file: Option<PathBuf>,

        /// Target a specific session id instead of the active one
        #[arg(long)]
        session: Option<String>,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Show or edit persisted settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List sessions and show the active transcript
    List,

    /// Create a session and make it active
    New {
        /// Title for the new session (default: "New Chat")
        #[arg(long)]
        title: Option<String>,
    },

    /// Rename a session (the active one unless an id is given)
    Rename {
        /// New title
        title: String,

        /// Session id (default: active session)
        #[arg(long)]
        id: Option<String>,
    },

    /// Clear a session's transcript
    Clear {
        /// Session id (default: active session)
        #[arg(long)]
        id: Option<String>,
    },

    /// Download one session as JSON
    Export {
        /// Session id (default: active session)
        #[arg(long)]
        id: Option<String>,
    },

    /// Download every session as one JSON archive
    ExportAll,

    /// Upload a previously exported JSON archive
    Import {
        /// Path to the archive
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the current settings
    Show,

    /// Set one key (temperature, top_p, top_k, max_tokens, provider, model,
    /// openai_base_url, show_tokens, dark_mode, server_url)
    Set { key: String, value: String },
}
