mod ids;
mod playlist;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use playlist::{Playlist, PlaylistInfo};
pub use track::{Singer, Track};
