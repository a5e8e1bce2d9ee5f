//! Interactive service menu
//!
//! Reads one command per line, applies it through the registry, and prints
//! the affected service's label. Exit notifications from the supervisor are
//! printed as they arrive, so a service that dies on its own shows up as
//! stopped without the user asking.
//!
//! ```text
//! list | start <name> | stop <name> | toggle <name> | help | quit
//! ```

use crate::{CliError, Result};
use std::future::Future;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};
use traymux_core::{ServiceRegistry, SupervisorEvent};

const HELP: &str = "commands: list | start <name> | stop <name> | toggle <name> | help | quit";

/// One line of menu input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    /// Print every service label
    List,
    /// Start a service
    Start(String),
    /// Stop a service
    Stop(String),
    /// Stop if running, start otherwise
    Toggle(String),
    /// Print the command summary
    Help,
    /// Stop everything and leave
    Quit,
}

impl FromStr for MenuCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let name = rest.trim();

        let needs_name = |build: fn(String) -> MenuCommand| {
            if name.is_empty() {
                Err(CliError::InvalidArgument(format!("'{verb}' needs a service name")))
            } else {
                Ok(build(name.to_string()))
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" if name.is_empty() => Ok(MenuCommand::List),
            "start" => needs_name(MenuCommand::Start),
            "stop" => needs_name(MenuCommand::Stop),
            "toggle" | "t" => needs_name(MenuCommand::Toggle),
            "help" | "?" if name.is_empty() => Ok(MenuCommand::Help),
            "quit" | "exit" | "q" if name.is_empty() => Ok(MenuCommand::Quit),
            _ => Err(CliError::UnknownCommand(line.to_string())),
        }
    }
}

impl MenuCommand {
    /// The command word, as typed
    pub fn verb(&self) -> &'static str {
        match self {
            MenuCommand::List => "list",
            MenuCommand::Start(_) => "start",
            MenuCommand::Stop(_) => "stop",
            MenuCommand::Toggle(_) => "toggle",
            MenuCommand::Help => "help",
            MenuCommand::Quit => "quit",
        }
    }
}

/// Every service label, one per line, in display order
pub fn render_menu(registry: &ServiceRegistry) -> String {
    if registry.is_empty() {
        return "(no services configured)\n".to_string();
    }
    registry
        .statuses()
        .into_iter()
        .map(|(name, status)| format!("  {}\n", status.label(&name)))
        .collect()
}

fn render_label(registry: &ServiceRegistry, name: &str) -> Result<String> {
    let status = registry.status(name)?;
    Ok(format!("  {}\n", status.label(name)))
}

/// Apply one command; returns `false` when the menu should close
async fn dispatch<W>(registry: &ServiceRegistry, command: MenuCommand, output: &mut W) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let name = match &command {
        MenuCommand::List => {
            output.write_all(render_menu(registry).as_bytes()).await?;
            return Ok(true);
        }
        MenuCommand::Help => {
            output.write_all(format!("{HELP}\n").as_bytes()).await?;
            return Ok(true);
        }
        MenuCommand::Quit => return Ok(false),
        MenuCommand::Start(name) | MenuCommand::Stop(name) | MenuCommand::Toggle(name) => name,
    };

    let result = match &command {
        MenuCommand::Start(_) => registry.start(name).await,
        MenuCommand::Stop(_) => registry.stop(name).await,
        _ => registry.toggle(name).await,
    };
    if let Err(e) = result {
        error!("Failed to {} service {}: {}", command.verb(), name, e);
        output.write_all(format!("error: {e}\n").as_bytes()).await?;
        return Ok(true);
    }

    output
        .write_all(render_label(registry, name)?.as_bytes())
        .await?;
    Ok(true)
}

/// Run the menu until `quit`, end of input, or `shutdown` resolves
///
/// Every running service is stopped before this returns, including when
/// reading input or writing output fails. The first error is returned.
pub async fn run_menu<R, W, F>(
    registry: &ServiceRegistry,
    input: R,
    output: &mut W,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let outcome = menu_loop(registry, input, output, shutdown).await;
    if let Err(e) = &outcome {
        error!("Menu stopped on error: {}", e);
    }

    let stopped = registry.shutdown().await;
    let farewell = async {
        output.write_all(b"bye\n").await?;
        output.flush().await
    }
    .await;

    outcome?;
    stopped?;
    farewell?;
    Ok(())
}

async fn menu_loop<R, W, F>(
    registry: &ServiceRegistry,
    input: R,
    output: &mut W,
    shutdown: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut events = registry.subscribe();
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    output.write_all(render_menu(registry).as_bytes()).await?;
    output.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Menu input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<MenuCommand>() {
                    Ok(command) => {
                        if !dispatch(registry, command, output).await? {
                            break;
                        }
                    }
                    Err(e) => {
                        output.write_all(format!("{e}\n{HELP}\n").as_bytes()).await?;
                    }
                }
            }
            event = events.recv() => match event {
                Ok(SupervisorEvent::Exited { name, exit }) => {
                    let label = render_label(registry, &name).unwrap_or_default();
                    output
                        .write_all(format!("{}  exited with {}\n", label.trim_end(), exit).as_bytes())
                        .await?;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {} service notifications, redrawing", missed);
                    output.write_all(render_menu(registry).as_bytes()).await?;
                }
                Err(RecvError::Closed) => break,
            },
            () = &mut shutdown => {
                debug!("Shutdown requested");
                break;
            }
        }
        output.flush().await?;
    }
    Ok(())
}
