//!
//! src/controller.rs
//!
//! Keeps the view a projection of the backend: every successful
//! mutation is followed by a full re-fetch and re-render
//!

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::ClientError;
use crate::fetch::PlaylistApi;
use crate::types::{NewPlaylist, NewTrack, PlaylistId};
use crate::view::{Field, Player, PlaylistCard, SelectOption, View};

pub const NO_PREVIEW: &str = "No preview URL for this track.";
pub const LOAD_FAILED: &str = "Failed to load playlists: ";

/// What a public operation did when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Client-side validation alerted and nothing was sent
    Rejected
}

pub struct ViewController<A, V, P> {
    api: A,
    view: V,
    player: P
}

impl<A: PlaylistApi, V: View, P: Player> ViewController<A, V, P> {
    pub fn new(api: A, view: V, player: P) -> Self {
        Self { api, view, player }
    }

    pub fn view(&self) -> &V { &self.view }

    pub fn view_mut(&mut self) -> &mut V { &mut self.view }

    #[cfg(test)]
    pub fn player(&self) -> &P { &self.player }

    pub fn player_mut(&mut self) -> &mut P { &mut self.player }

    pub fn api(&self) -> &A { &self.api }

    /// Fetches every playlist and redraws selector and cards. On error the
    /// previous render is left untouched.
    pub async fn load_playlists(&mut self) -> Result<Outcome, ClientError> {
        let playlists = self.api.list_playlists().await?;
        info!(count = playlists.len(), "playlists.load");

        self.view.set_options(playlists.iter().map(SelectOption::from).collect());
        self.view.render_list(playlists.iter().map(PlaylistCard::from).collect());
        Ok(Outcome::Applied)
    }

    /// Initial page load: failures are surfaced as an alert
    pub async fn initial_load(&mut self) -> Outcome {
        match self.load_playlists().await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "playlists.load.failed");
                self.view.alert(&format!("{LOAD_FAILED}{e}"));
                Outcome::Rejected
            }
        }
    }

    pub fn play(&mut self, url: Option<&str>) -> Outcome {
        match url {
            Some(url) if !url.is_empty() => {
                info!(url = %url, "player.play");
                self.player.set_source(url);
                self.player.play();
                Outcome::Applied
            }
            _ => {
                self.view.alert(NO_PREVIEW);
                Outcome::Rejected
            }
        }
    }

    pub async fn create_playlist(&mut self) -> Result<Outcome, ClientError> {
        let name = self.view.read_field(Field::PlaylistName).trim().to_string();
        if name.is_empty() {
            return Ok(self.reject(ClientError::MissingName));
        }

        self.api.create_playlist(&NewPlaylist { name: name.clone() }).await?;
        info!(name = %name, "playlists.create");

        self.view.clear_field(Field::PlaylistName);
        self.load_playlists().await
    }

    pub async fn add_track(&mut self) -> Result<Outcome, ClientError> {
        let playlist_id = parse_selection(&self.view.read_field(Field::PlaylistSelect));
        let title       = self.trimmed(Field::Title);
        let artist      = self.trimmed(Field::Artist);
        let preview     = self.trimmed(Field::Preview);
        let album_cover = self.trimmed(Field::Cover);
        let track_id = match self.trimmed(Field::TrackId) {
            id if id.is_empty() => Uuid::new_v4().to_string(),
            id => id
        };

        if playlist_id == 0 || title.is_empty() || artist.is_empty() {
            return Ok(self.reject(ClientError::MissingRequiredField));
        }

        let track = NewTrack { playlist_id, track_id, title, artist, preview, album_cover };
        self.api.add_track(&track).await?;
        info!(playlist_id, track = %track.track_id, "track.add");

        for field in Field::TRACK_INPUTS {
            self.view.clear_field(field);
        }
        self.load_playlists().await
    }

    fn trimmed(&self, field: Field) -> String {
        self.view.read_field(field).trim().to_string()
    }

    fn reject(&mut self, reason: ClientError) -> Outcome {
        debug!(reason = %reason, "validation.rejected");
        self.view.alert(&reason.to_string());
        Outcome::Rejected
    }
}

/// Selector values that are not an integer count as "nothing selected"
fn parse_selection(raw: &str) -> PlaylistId {
    raw.trim().parse::<PlaylistId>().unwrap_or(0)
}
