//! Crate-wide error type. Playback start failures are not errors in this sense: they go to the
//! log, see [PlayError](crate::player::PlayError).

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
