#![doc = include_str!("../README.md")]

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod player;

pub use error::{Error, Result};
pub use player::{MediaSink, PlayError, PlaybackController};
