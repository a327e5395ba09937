use crate::api::{ApiClient, FilePayload};
use crate::cli::{Cli, Commands, ConfigCommands, SessionCommands};
use crate::config::Settings;
use crate::controller::{ChatController, Renderer, UiAction};
use crate::error::ChatError;
use crate::ui::{TerminalRenderer, style};
use anyhow::{Context, Result};
use dialoguer::Input;
use std::path::PathBuf;

/// Route the parsed CLI onto controller actions.
pub async fn run(cli: Cli, mut settings: Settings) -> Result<()> {
    if let Commands::Config { command } = &cli.command {
        return handle_config(command, &mut settings);
    }

    // A --server override applies to this invocation only, never persisted.
    if let Some(server) = cli.server {
        settings.server_url = server;
    }

    let api = ApiClient::new(&settings.server_url);
    let renderer = TerminalRenderer::new(
        settings.show_tokens,
        settings.dark_mode,
        std::env::current_dir().context("resolve working directory")?,
    );
    let mut controller = ChatController::new(api, settings, renderer);

    match cli.command {
        Commands::Chat {
            message,
            file,
            session,
        } => {
            controller.refresh().await?;
            if let Some(id) = session {
                controller.select(&id).await?;
            }
            match message {
                Some(text) => {
                    let payload = read_payload(file).await?;
                    controller.send_turn(&text, payload).await?;
                }
                None => repl(&mut controller).await?,
            }
        }

        Commands::Sessions { command } => match command {
            SessionCommands::List => controller.refresh().await?,
            SessionCommands::New { title } => {
                controller.dispatch(UiAction::NewSession).await?;
                if let Some(title) = title {
                    controller.dispatch(UiAction::Rename { title }).await?;
                }
            }
            SessionCommands::Rename { title, id } => {
                controller.refresh().await?;
                if let Some(id) = id {
                    controller.select(&id).await?;
                }
                controller.dispatch(UiAction::Rename { title }).await?;
            }
            SessionCommands::Clear { id } => {
                controller.refresh().await?;
                if let Some(id) = id {
                    controller.select(&id).await?;
                }
                controller.dispatch(UiAction::Clear).await?;
            }
            SessionCommands::Export { id } => {
                controller.refresh().await?;
                if let Some(id) = id {
                    controller.select(&id).await?;
                }
                controller.dispatch(UiAction::ExportActive).await?;
            }
            SessionCommands::ExportAll => {
                controller.dispatch(UiAction::ExportAll).await?;
            }
            SessionCommands::Import { file } => {
                let payload = read_payload(Some(file))
                    .await?
                    .context("import file is required")?;
                controller.dispatch(UiAction::Import { file: payload }).await?;
            }
        },

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Interactive message loop. Slash commands act on the session directory;
/// everything else is sent as a turn.
async fn repl<R: Renderer>(controller: &mut ChatController<R>) -> Result<()> {
    println!(
        "{}",
        style::dim("Type a message. /new /clear /sessions /quit")
    );
    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
            .context("read input line")?;
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/new" => controller.dispatch(UiAction::NewSession).await?,
            "/clear" => controller.dispatch(UiAction::Clear).await?,
            "/sessions" => controller.refresh().await?,
            text => match controller.send_turn(text, None).await {
                Err(ChatError::TurnInFlight) => {
                    println!("{}", style::warning("Still waiting on the previous turn."));
                }
                other => other?,
            },
        }
    }
    Ok(())
}

fn handle_config(command: &ConfigCommands, settings: &mut Settings) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let rendered =
                toml::to_string_pretty(settings).context("render settings")?;
            print!("{rendered}");
        }
        ConfigCommands::Set { key, value } => {
            settings.set_key(key, value)?;
            settings.save()?;
            println!("{}", style::value(format!("{key} = {value}")));
        }
    }
    Ok(())
}

async fn read_payload(path: Option<PathBuf>) -> Result<Option<FilePayload>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(Some(FilePayload { name, bytes }))
}
