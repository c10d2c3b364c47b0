use super::start::{settle, StartTracker};
use super::{MediaSink, PlayCompletion, PlayError};
use crate::config::Config;
use crate::error::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, SendError, Sender};
use libmpv::events::Event;
use libmpv::mpv_error;
use libmpv::{FileState, Mpv};
use std::thread;
use std::time::Duration;

/// How long the worker waits for a request before checking mpv's events again
const EVENT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum MpvError {
    #[error("mpv error: {0}")]
    Mpv(String),
    #[error("the mpv thread is gone")]
    Gone,
}

impl From<libmpv::Error> for MpvError {
    fn from(e: libmpv::Error) -> Self {
        MpvError::Mpv(format!("{:?}", e))
    }
}

type MpvResult<T> = std::result::Result<T, MpvError>;

enum Request {
    SetSource(String, Sender<MpvResult<()>>),
    Play(PlayCompletion),
    Pause(Sender<MpvResult<()>>),
    Paused(Sender<MpvResult<bool>>),
    CurrentTime(Sender<f64>),
    Seek(f64, Sender<MpvResult<()>>),
    Duration(Sender<f64>),
}

/// A [MediaSink] backed by libmpv.
///
/// mpv and its event context live on a worker thread; every call is a request over a channel.
/// mpv is kept paused until [MediaSink::play] is called.
pub struct MpvSink {
    requests: Option<Sender<Request>>,
    source: Option<String>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MpvSink {
    fn ask<T>(&self, request: impl FnOnce(Sender<T>) -> Request) -> MpvResult<T> {
        let requests = self.requests.as_ref().ok_or(MpvError::Gone)?;
        let (tx, rx) = bounded(1);
        requests.send(request(tx)).map_err(|_| MpvError::Gone)?;
        rx.recv().map_err(|_| MpvError::Gone)
    }
}

impl MediaSink for MpvSink {
    fn new() -> Result<Self> {
        let (requests, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let worker = thread::Builder::new()
            .name("mpv".into())
            .spawn(move || run_worker(rx, ready_tx))?;

        ready_rx.recv().map_err(|_| MpvError::Gone)??;

        log::debug!("mpv sink ready");
        Ok(Self {
            requests: Some(requests),
            source: None,
            worker: Some(worker),
        })
    }

    fn set_source(&mut self, source: &str) -> Result<()> {
        self.ask(|reply| Request::SetSource(source.to_owned(), reply))??;
        self.source = Some(source.to_owned());
        Ok(())
    }

    fn source(&self) -> Option<String> {
        self.source.clone()
    }

    fn play(&mut self, done: PlayCompletion) {
        let Some(requests) = &self.requests else {
            done(Err(PlayError::Aborted));
            return;
        };
        if let Err(SendError(Request::Play(done))) = requests.send(Request::Play(done)) {
            done(Err(PlayError::Aborted));
        }
    }

    fn pause(&mut self) -> Result<()> {
        Ok(self.ask(Request::Pause)??)
    }

    fn paused(&self) -> Result<bool> {
        Ok(self.ask(Request::Paused)??)
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.ask(Request::CurrentTime)?)
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<()> {
        Ok(self.ask(|reply| Request::Seek(seconds, reply))??)
    }

    fn duration(&self) -> Result<f64> {
        Ok(self.ask(Request::Duration)?)
    }
}

impl Drop for MpvSink {
    fn drop(&mut self) {
        // Disconnecting the channel stops the worker, which aborts whatever is still pending
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn create_mpv() -> MpvResult<Mpv> {
    let mpv = Mpv::with_initializer(|mpv| {
        mpv.set_property("video", false)?;
        mpv.set_property("volume", 100i64)?;
        mpv.set_property("pause", true)?;
        mpv.set_property("keep-open", "yes")?;
        if let Some(ao) = &Config::global().mpv_ao {
            mpv.set_property("ao", ao.as_str())?;
        }
        Ok(())
    })?;
    Ok(mpv)
}

fn run_worker(requests: Receiver<Request>, ready: Sender<MpvResult<()>>) {
    let mpv = match create_mpv() {
        Ok(mpv) => mpv,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut ev_ctx = mpv.create_event_context();
    if let Err(e) = ev_ctx.disable_deprecated_events() {
        let _ = ready.send(Err(e.into()));
        return;
    }
    let _ = ready.send(Ok(()));

    let mut tracker = StartTracker::default();
    loop {
        match requests.recv_timeout(EVENT_POLL) {
            Ok(request) => handle_request(&mpv, &mut tracker, request),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        while let Some(event) = ev_ctx.wait_event(0.0) {
            match event {
                Ok(Event::StartFile) => tracker.started(mpv.get_property("path").ok()),
                Ok(Event::FileLoaded) => {
                    settle(tracker.loaded(mpv.get_property("path").ok()), Ok(()));
                }
                Ok(_) => {}
                Err(e) => {
                    let err = play_error(e);
                    settle(tracker.failed(&err), Err(err));
                }
            }
        }
    }

    settle(tracker.abort_all(), Err(PlayError::Aborted));
    log::debug!("mpv worker stopped");
}

fn handle_request(mpv: &Mpv, tracker: &mut StartTracker, request: Request) {
    // Replies only fail when the caller stopped waiting, which is fine
    match request {
        Request::SetSource(source, reply) => {
            settle(tracker.replace(&source), Err(PlayError::Aborted));
            let loaded = mpv.set_property("pause", true).and_then(|()| {
                mpv.playlist_load_files(&[(source.as_str(), FileState::Replace, None)])
            });
            let _ = reply.send(loaded.map_err(MpvError::from));
        }
        Request::Play(done) => {
            if let Err(e) = mpv.set_property("pause", false) {
                done(Err(PlayError::Backend(MpvError::from(e).to_string())));
            } else if let Some((done, outcome)) = tracker.request(done) {
                done(outcome);
            }
        }
        Request::Pause(reply) => {
            let _ = reply.send(mpv.set_property("pause", true).map_err(MpvError::from));
        }
        Request::Paused(reply) => {
            let _ = reply.send(mpv.get_property("pause").map_err(MpvError::from));
        }
        Request::CurrentTime(reply) => {
            // mpv has no time-pos while nothing is loaded
            let _ = reply.send(mpv.get_property("time-pos").unwrap_or(f64::NAN));
        }
        Request::Seek(seconds, reply) => {
            let target = seconds.to_string();
            let sought = mpv.command("seek", &[target.as_str(), "absolute"]);
            let _ = reply.send(sought.map_err(MpvError::from));
        }
        Request::Duration(reply) => {
            let _ = reply.send(mpv.get_property("duration").unwrap_or(f64::NAN));
        }
    }
}

fn play_error(e: libmpv::Error) -> PlayError {
    match e {
        libmpv::Error::Raw(mpv_error::LoadingFailed) => PlayError::Network,
        libmpv::Error::Raw(
            mpv_error::NothingToPlay | mpv_error::UnknownFormat | mpv_error::Unsupported,
        ) => PlayError::NotSupported,
        libmpv::Error::Raw(mpv_error::AoInitFailed) => {
            PlayError::Backend("couldn't initialize audio output".into())
        }
        other => PlayError::Backend(MpvError::from(other).to_string()),
    }
}
