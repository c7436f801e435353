//!
//! src/terminal.rs
//!
//! Terminal rendition of the view and an external-process audio player
//!

use std::collections::HashMap;
use std::io::Write;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

use crate::config::PlayerConfig;
use crate::view::{Field, Player, PlaylistCard, SelectOption, View};

/// Draws into any writer; the binary hands it stdout
pub struct TerminalView<W: Write> {
    out: W,
    fields: HashMap<Field, String>,
    options: Vec<SelectOption>,
    cards: Vec<PlaylistCard>
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out, fields: HashMap::new(), options: Vec::new(), cards: Vec::new() }
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn options(&self) -> &[SelectOption] { &self.options }

    /// Preview of the 1-based `card`.`row` play control, `None` if there is
    /// no such control
    pub fn preview_at(&self, card: usize, row: usize) -> Option<Option<String>> {
        let card = self.cards.get(card.checked_sub(1)?)?;
        let row = card.tracks.get(row.checked_sub(1)?)?;
        Some(row.preview.clone())
    }

    pub fn writer(&mut self) -> &mut W { &mut self.out }

    fn emit(&mut self, text: &str) {
        let written = self.out.write_all(text.as_bytes());
        if let Err(e) = written.and_then(|()| self.out.flush()) {
            warn!(error = %e, "terminal.write");
        }
    }
}

pub fn format_options(options: &[SelectOption], selected: &str) -> String {
    let mut text = String::from("Playlists:\n");
    if options.is_empty() {
        text.push_str("  (none)\n");
    }
    for opt in options {
        let marker = if opt.value.to_string() == selected { '*' } else { ' ' };
        text.push_str(&format!(" {marker}[{}] {}\n", opt.value, opt.label));
    }
    text
}

pub fn format_cards(cards: &[PlaylistCard]) -> String {
    let mut text = String::new();
    for (c, card) in cards.iter().enumerate() {
        text.push_str(&format!("\n{}. {}  ({})\n", c + 1, card.name, card.badge));
        for (r, row) in card.tracks.iter().enumerate() {
            let play = if row.preview.as_deref().is_some_and(|p| !p.is_empty()) {
                "play"
            } else {
                "----"
            };
            text.push_str(&format!(
                "   {}.{}  [{play}]  {} - {}\n", c + 1, r + 1, row.title, row.artist
            ));
            if !row.cover.is_empty() {
                text.push_str(&format!("          cover: {}\n", row.cover));
            }
        }
    }
    text
}

impl<W: Write> View for TerminalView<W> {
    // A rebuilt selector falls back to its first option
    fn set_options(&mut self, options: Vec<SelectOption>) {
        let first = options.first().map(|o| o.value.to_string()).unwrap_or_default();
        self.fields.insert(Field::PlaylistSelect, first);
        self.options = options;
    }

    fn render_list(&mut self, cards: Vec<PlaylistCard>) {
        self.cards = cards;
        let selected = self.read_field(Field::PlaylistSelect);
        let text = format!("{}{}", format_options(&self.options, &selected),
            format_cards(&self.cards));
        self.emit(&text);
    }

    fn read_field(&self, field: Field) -> String {
        self.fields.get(&field).cloned().unwrap_or_default()
    }

    fn clear_field(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    fn alert(&mut self, message: &str) {
        self.emit(&format!("! {message}\n"));
    }
}

/// Plays previews by handing the url to an external program. A new source
/// stops whatever was playing.
pub struct ProcessPlayer {
    cfg: PlayerConfig,
    source: Option<String>,
    child: Option<Child>
}

impl ProcessPlayer {
    pub fn new(cfg: PlayerConfig) -> Self {
        Self { cfg, source: None, child: None }
    }

    /// Blocks until the current preview ends
    pub async fn wait(&mut self) -> std::io::Result<()> {
        if let Some(child) = self.child.as_mut() {
            let status = child.wait().await?;
            debug!(status = %status, "player.exit");
        }
        self.child = None;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "player.stop");
            }
        }
    }
}

impl Player for ProcessPlayer {
    fn set_source(&mut self, url: &str) {
        self.stop();
        self.source = Some(url.to_string());
    }

    fn play(&mut self) {
        let Some(url) = self.source.clone() else { return };
        self.stop();
        let spawned = Command::new(&self.cfg.program)
            .args(&self.cfg.args)
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        match spawned {
            Ok(child) => self.child = Some(child),
            Err(e) => error!(program = %self.cfg.program, url = %url, error = %e,
                "player.spawn")
        }
    }
}

impl Drop for ProcessPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
