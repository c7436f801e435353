//!
//! src/shell.rs
//!
//! Interactive loop: every line is one user action against the
//! controller, the terminal standing in for the page
//!

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::error;

use crate::controller::ViewController;
use crate::errors::ClientError;
use crate::fetch::PlaylistApi;
use crate::terminal::TerminalView;
use crate::view::{Field, Player, View};

pub const HELP: &str = "\
commands:
  list                 reload every playlist
  create <name>        create a playlist
  select <id>          choose the playlist tracks are added to
  add                  add a track to the selected playlist (prompts)
  play <card>.<row>    play a track preview, e.g. `play 1.2`
  health               ask the backend whether it is up
  help                 show this text
  quit                 leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Create(String),
    Select(String),
    Add,
    Play { card: usize, row: usize },
    Health,
    Help,
    Quit
}

/// `Ok(None)` for blank lines, `Err` carries a usage hint
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, "")
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List,
        "create" | "new" => ShellCommand::Create(rest.to_string()),
        "select" | "use" => ShellCommand::Select(rest.to_string()),
        "add" => ShellCommand::Add,
        "play" => {
            let (card, row) = rest.split_once('.')
                .ok_or_else(|| "usage: play <card>.<row>".to_string())?;
            let card = card.trim().parse::<usize>()
                .map_err(|_| format!("not a card number: {card}"))?;
            let row = row.trim().parse::<usize>()
                .map_err(|_| format!("not a row number: {row}"))?;
            ShellCommand::Play { card, row }
        }
        "health" => ShellCommand::Health,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}`, try `help`"))
    };
    Ok(Some(cmd))
}

fn say<W: Write>(view: &mut TerminalView<W>, text: &str) -> Result<(), ClientError> {
    let out = view.writer();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

async fn prompt<W, R>(
    view: &mut TerminalView<W>,
    lines: &mut Lines<R>,
    label: &str
) -> Result<Option<String>, ClientError>
where
    W: Write,
    R: AsyncBufRead + Unpin
{
    say(view, &format!("{label}: "))?;
    Ok(lines.next_line().await?)
}

/// Mutation failures are logged, never alerted
fn report(result: Result<crate::controller::Outcome, ClientError>, event: &'static str) {
    if let Err(e) = result {
        match &e {
            ClientError::RequestFailed { status, body } =>
                error!(status, body = %body, event, "operation failed"),
            other => error!(error = %other, event, "operation failed")
        }
    }
}

/// Runs the initial load, then serves commands until `quit` or end of input
pub async fn run_shell<A, W, P, R>(
    ctl: &mut ViewController<A, TerminalView<W>, P>,
    input: R
) -> Result<(), ClientError>
where
    A: PlaylistApi,
    W: Write,
    P: Player,
    R: AsyncBufRead + Unpin
{
    let mut lines = input.lines();
    ctl.initial_load().await;
    say(ctl.view_mut(), "type `help` for commands\n")?;

    loop {
        say(ctl.view_mut(), "> ")?;
        let Some(line) = lines.next_line().await? else { break };

        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(hint) => {
                say(ctl.view_mut(), &format!("{hint}\n"))?;
                continue;
            }
        };

        match cmd {
            ShellCommand::List => {
                if let Err(e) = ctl.load_playlists().await {
                    error!(error = %e, "playlists.load.failed");
                }
            }
            ShellCommand::Create(name) => {
                ctl.view_mut().set_field(Field::PlaylistName, name);
                report(ctl.create_playlist().await, "playlists.create");
            }
            ShellCommand::Select(id) => {
                let known = ctl.view().options().iter().any(|o| o.value.to_string() == id);
                if known {
                    ctl.view_mut().set_field(Field::PlaylistSelect, id);
                } else {
                    say(ctl.view_mut(), &format!("no playlist with id `{id}`\n"))?;
                }
            }
            ShellCommand::Add => {
                let selected = ctl.view().read_field(Field::PlaylistSelect);
                say(ctl.view_mut(), &format!("adding to playlist [{selected}]\n"))?;
                for field in Field::TRACK_INPUTS {
                    let Some(value) = prompt(ctl.view_mut(), &mut lines, field.label()).await?
                    else { return Ok(()) };
                    ctl.view_mut().set_field(field, value);
                }
                report(ctl.add_track().await, "track.add");
            }
            ShellCommand::Play { card, row } => {
                match ctl.view().preview_at(card, row) {
                    Some(preview) => { ctl.play(preview.as_deref()); }
                    None => say(ctl.view_mut(), &format!("no track {card}.{row}\n"))?
                }
            }
            ShellCommand::Health => {
                let text = match ctl.api().health().await {
                    Ok(message) => format!("backend: {message}\n"),
                    Err(e) => format!("backend unreachable: {e}\n")
                };
                say(ctl.view_mut(), &text)?;
            }
            ShellCommand::Help => say(ctl.view_mut(), HELP)?,
            ShellCommand::Quit => break
        }
    }
    Ok(())
}
