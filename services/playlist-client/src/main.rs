//!
//! src/main.rs
//!
//! Entry point of the playlist client: wires configuration, logging,
//! the backend client and the terminal view together
//!

mod config;
mod errors;
mod logging;

mod controller;
mod fetch;
mod shell;
mod terminal;
mod types;
mod view;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::controller::{Outcome, ViewController};
use crate::errors::ClientError;
use crate::fetch::{BackendClient, PlaylistApi};
use crate::terminal::{ProcessPlayer, TerminalView};
use crate::view::Field;

#[derive(Debug, Parser)]
#[command(name = "playlist-client", version, about = "Browse and edit playlists on a music backend")]
struct Cli {
    /// Backend base url, overrides PLAYLIST_API_BASE
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show every playlist and its tracks
    List,
    /// Create a playlist
    Create {
        #[arg(default_value = "")]
        name: String
    },
    /// Add a track to a playlist
    Add {
        #[arg(long, default_value = "")]
        playlist: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        artist: String,
        #[arg(long, default_value = "")]
        preview: String,
        #[arg(long, default_value = "")]
        cover: String,
        /// Generated when omitted
        #[arg(long, default_value = "")]
        track_id: String
    },
    /// Play a preview url until it ends
    Play {
        url: Option<String>
    },
    /// Ask the backend whether it is up
    Health,
    /// Interactive session (default)
    Shell
}

type Terminal = ViewController<BackendClient, TerminalView<std::io::Stdout>, ProcessPlayer>;

fn exit_for(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Applied => ExitCode::SUCCESS,
        Outcome::Rejected => ExitCode::FAILURE
    }
}

/// Mutations surface failures to the caller only; they are logged here
/// and turned into the process error
fn logged(result: Result<Outcome, ClientError>, event: &'static str)
    -> Result<ExitCode, ClientError> {
    match result {
        Ok(outcome) => Ok(exit_for(outcome)),
        Err(e) => {
            tracing::error!(error = %e, event, "operation failed");
            Err(e)
        }
    }
}

async fn dispatch(ctl: &mut Terminal, command: Command) -> Result<ExitCode, ClientError> {
    match command {
        Command::List => Ok(exit_for(ctl.initial_load().await)),
        Command::Create { name } => {
            ctl.view_mut().set_field(Field::PlaylistName, name);
            logged(ctl.create_playlist().await, "playlists.create")
        }
        Command::Add { playlist, title, artist, preview, cover, track_id } => {
            let view = ctl.view_mut();
            view.set_field(Field::PlaylistSelect, playlist);
            view.set_field(Field::Title, title);
            view.set_field(Field::Artist, artist);
            view.set_field(Field::Preview, preview);
            view.set_field(Field::Cover, cover);
            view.set_field(Field::TrackId, track_id);
            logged(ctl.add_track().await, "track.add")
        }
        Command::Play { url } => {
            let outcome = ctl.play(url.as_deref());
            if outcome == Outcome::Applied {
                ctl.player_mut().wait().await?;
            }
            Ok(exit_for(outcome))
        }
        Command::Health => {
            let message = ctl.api().health().await?;
            println!("{message}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Shell => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run_shell(ctl, stdin).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, ClientError> {
    let cli = Cli::parse();

    let cfgs = config::load_config(cli.base_url.as_deref())?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    tracing::info!(
        service = "playlist-client",
        version = %env!("CARGO_PKG_VERSION"),
        backend = %cfgs.api.base_url,
        "starting"
    );

    let backend = BackendClient::new(&cfgs.http, &cfgs.api)?;
    let view    = TerminalView::new(std::io::stdout());
    let player  = ProcessPlayer::new(cfgs.player.clone());
    let mut ctl = ViewController::new(backend, view, player);

    dispatch(&mut ctl, cli.command.unwrap_or(Command::Shell)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_flags_parse() {
        let cli = Cli::try_parse_from([
            "playlist-client", "--base-url", "http://127.0.0.1:8000",
            "add", "--playlist", "3", "--title", "Song", "--artist", "Band"
        ]).unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:8000"));
        let Some(Command::Add { playlist, title, track_id, .. }) = cli.command else {
            panic!("expected add")
        };
        assert_eq!(playlist, "3");
        assert_eq!(title, "Song");
        assert_eq!(track_id, "");
    }

    #[test]
    fn bare_invocation_defaults_to_shell() {
        let cli = Cli::try_parse_from(["playlist-client"]).unwrap();
        assert!(cli.command.is_none());
    }
}
