//!
//! src/view.rs
//!
//! The seam between the controller and whatever draws the playlists.
//! A view owns the input fields, the playlist selector, the card list
//! and blocking alerts; a player owns the single audio output.
//!

use crate::types::{Playlist, PlaylistId, Track};

/// Inputs the controller reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PlaylistName,
    PlaylistSelect,
    Title,
    Artist,
    Preview,
    Cover,
    TrackId
}

impl Field {
    /// Cleared after a track is added; the selection is kept
    pub const TRACK_INPUTS: [Field; 5] = [
        Field::Title, Field::Artist, Field::Preview, Field::Cover, Field::TrackId
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::PlaylistName   => "playlist name",
            Field::PlaylistSelect => "playlist",
            Field::Title          => "title",
            Field::Artist         => "artist",
            Field::Preview        => "preview url",
            Field::Cover          => "cover url",
            Field::TrackId        => "track id (optional)"
        }
    }
}

/// One entry of the playlist selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: PlaylistId,
    pub label: String
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRow {
    pub cover: String,
    pub title: String,
    pub artist: String,
    pub preview: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCard {
    pub name: String,
    pub badge: String,
    pub tracks: Vec<TrackRow>
}

impl From<&Playlist> for SelectOption {
    fn from(p: &Playlist) -> Self {
        SelectOption { value: p.id, label: p.name.clone() }
    }
}

impl From<&Track> for TrackRow {
    fn from(t: &Track) -> Self {
        TrackRow {
            cover: t.album_cover.clone().unwrap_or_default(),
            title: t.title.clone(),
            artist: t.artist.clone(),
            preview: t.preview.clone()
        }
    }
}

impl From<&Playlist> for PlaylistCard {
    fn from(p: &Playlist) -> Self {
        PlaylistCard {
            name: p.name.clone(),
            badge: format!("{} tracks", p.tracks.len()),
            tracks: p.tracks.iter().map(TrackRow::from).collect()
        }
    }
}

pub trait View {
    /// Replaces every option of the playlist selector
    fn set_options(&mut self, options: Vec<SelectOption>);

    /// Replaces every rendered playlist card
    fn render_list(&mut self, cards: Vec<PlaylistCard>);

    fn read_field(&self, field: Field) -> String;

    fn clear_field(&mut self, field: Field);

    /// Blocking, user-facing message
    fn alert(&mut self, message: &str);
}

/// The one shared audio output
pub trait Player {
    fn set_source(&mut self, url: &str);

    fn play(&mut self);
}
