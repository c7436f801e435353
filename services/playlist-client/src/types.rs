use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned playlist identity
pub type PlaylistId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tracks: Vec<Track>
}

// The bundled backend answers with `id`/`albumCover`, the client
// documents `track_id`/`album_cover`; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, alias = "id", deserialize_with = "null_as_empty")]
    pub track_id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default, alias = "albumCover")]
    pub album_cover: Option<String>
}

/// POST /playlists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlaylist {
    pub name: String
}

/// POST /playlists/add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub playlist_id: PlaylistId,
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub preview: String,
    pub album_cover: String
}

fn null_as_empty<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
