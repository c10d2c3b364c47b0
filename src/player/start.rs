use super::{PlayCompletion, PlayError};
use std::mem;

/// Tracks which source a sink is loading and the play requests waiting on it.
///
/// The backend reports progress as "a file started", "a file loaded" and "a file failed". Each
/// report is matched against the current source by path, so reports about a replaced source are
/// ignored no matter how the backend batches them.
#[derive(Default)]
pub struct StartTracker {
    source: Option<String>,
    /// Path of the file the backend most recently started
    started: Option<String>,
    loaded: bool,
    failed: Option<PlayError>,
    pending: Vec<PlayCompletion>,
}

impl StartTracker {
    /// Switches to `source`. Returns the requests that were waiting on the old one.
    #[must_use]
    pub fn replace(&mut self, source: &str) -> Vec<PlayCompletion> {
        self.source = Some(source.to_owned());
        self.started = None;
        self.loaded = false;
        self.failed = None;
        mem::take(&mut self.pending)
    }

    /// Parks `done` until the current source settles. If it already has, `done` is handed back
    /// with its outcome.
    #[must_use]
    pub fn request(
        &mut self,
        done: PlayCompletion,
    ) -> Option<(PlayCompletion, Result<(), PlayError>)> {
        if self.source.is_none() {
            Some((done, Err(PlayError::NotSupported)))
        } else if let Some(err) = &self.failed {
            Some((done, Err(err.clone())))
        } else if self.loaded {
            Some((done, Ok(())))
        } else {
            self.pending.push(done);
            None
        }
    }

    pub fn started(&mut self, path: Option<String>) {
        self.started = path;
    }

    /// Returns the requests that can now resolve with `Ok`.
    #[must_use]
    pub fn loaded(&mut self, path: Option<String>) -> Vec<PlayCompletion> {
        if path.is_none() || path != self.source {
            log::debug!("ignoring load of superseded source {:?}", path);
            return Vec::new();
        }
        self.loaded = true;
        mem::take(&mut self.pending)
    }

    /// Returns the requests that must now resolve with `err`. The failure belongs to whichever
    /// file was started last.
    #[must_use]
    pub fn failed(&mut self, err: &PlayError) -> Vec<PlayCompletion> {
        if self.started.is_none() || self.started != self.source {
            log::debug!("ignoring failure of superseded source {:?}", self.started);
            return Vec::new();
        }
        self.failed = Some(err.clone());
        mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn abort_all(&mut self) -> Vec<PlayCompletion> {
        mem::take(&mut self.pending)
    }
}

pub fn settle(completions: Vec<PlayCompletion>, outcome: Result<(), PlayError>) {
    for done in completions {
        done(outcome.clone());
    }
}
