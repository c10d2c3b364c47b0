use crate::error::Result;

mod controller;
pub use controller::{PlaybackController, DEFAULT_SKIP_SECONDS};

#[cfg_attr(not(feature = "mpv"), allow(dead_code))]
mod start;

#[cfg(feature = "mpv")]
pub mod mpv;
#[cfg(feature = "mpv")]
pub type DefaultSink = mpv::MpvSink;

/// Why a sink couldn't start playing a source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    /// The start was superseded by another source, or the sink went away.
    #[error("aborted")]
    Aborted,
    #[error("network error")]
    Network,
    #[error("decode error")]
    Decode,
    #[error("source not supported")]
    NotSupported,
    #[error("not allowed")]
    NotAllowed,
    #[error("{0}")]
    Backend(String),
}

/// Called exactly once by a [MediaSink] when an asynchronous start either begins playing or
/// fails. May be called from any thread.
pub type PlayCompletion = Box<dyn FnOnce(std::result::Result<(), PlayError>) + Send + 'static>;

/// A platform playback resource, like mpv or a browser `<audio>` element.
///
/// Times are in seconds. Queries report `f64::NAN` when the value is not defined yet, e.g. the
/// duration of a source that hasn't finished loading.
pub trait MediaSink: Sized {
    fn new() -> Result<Self>;

    /// Replaces the current source. A start still pending for the previous source resolves with
    /// [PlayError::Aborted].
    fn set_source(&mut self, source: &str) -> Result<()>;
    fn source(&self) -> Option<String>;

    /// Requests playback of the current source. Must not wait for the source to load.
    fn play(&mut self, done: PlayCompletion);
    fn pause(&mut self) -> Result<()>;
    fn paused(&self) -> Result<bool>;

    fn current_time(&self) -> Result<f64>;
    fn set_current_time(&mut self, seconds: f64) -> Result<()>;
    fn duration(&self) -> Result<f64>;
}
