use super::{MediaSink, PlayCompletion};
use crate::error::Result;
use log::{debug, error, warn};

/// How far [PlaybackController::skip_forward] and [PlaybackController::skip_backward] move when
/// called with `None`.
pub const DEFAULT_SKIP_SECONDS: f64 = 10.0;

/// Play/pause/seek/skip controls over a single [MediaSink].
///
/// The controller keeps no transport state of its own: position, duration and the loaded source
/// are always read back from the sink. If the sink couldn't be created, or was torn down, every
/// command is a no-op and every query returns zero.
///
/// Nothing here is fatal. Starting playback is fire-and-forget: failures are written to the
/// `log` error channel and never returned to the caller.
pub struct PlaybackController<S: MediaSink> {
    sink: Option<S>,
}

impl<S: MediaSink> Default for PlaybackController<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MediaSink> PlaybackController<S> {
    pub fn new() -> Self {
        let sink = match S::new() {
            Ok(sink) => Some(sink),
            Err(e) => {
                error!("couldn't create media sink: {}", e);
                None
            }
        };
        Self { sink }
    }

    pub fn with_sink(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Drops the sink. The controller stays usable, but inert.
    pub fn teardown(&mut self) {
        if self.sink.take().is_some() {
            debug!("media sink torn down");
        }
    }

    /// Replaces the current source and asks the sink to start playing it. Returns before the
    /// source has loaded, so [current_time](Self::current_time) and [duration](Self::duration)
    /// may still read zero right after this.
    pub fn load_and_play(&mut self, source: &str) {
        let Some(sink) = &mut self.sink else {
            return;
        };

        debug!("loading {:?}", source);
        if let Err(e) = sink.set_source(source) {
            error!("error playing audio: {}", e);
            return;
        }
        sink.play(log_start_failure(source));
    }

    /// Starts playing the current source again after a [pause](Self::pause) or
    /// [stop](Self::stop).
    pub fn resume(&mut self) {
        if let Some(sink) = &mut self.sink {
            let source = sink.source().unwrap_or_default();
            sink.play(log_start_failure(&source));
        }
    }

    pub fn stop(&mut self) {
        self.forward("pause", |sink| sink.pause());
        self.forward("rewind", |sink| sink.set_current_time(0.0));
    }

    pub fn pause(&mut self) {
        self.forward("pause", |sink| sink.pause());
    }

    /// Moves to `time` seconds. Out-of-range values are left for the sink to deal with.
    pub fn seek(&mut self, time: f64) {
        self.forward("seek", |sink| sink.set_current_time(time));
    }

    pub fn current_time(&self) -> f64 {
        self.sink
            .as_ref()
            .and_then(|sink| defined(sink.current_time()))
            .unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.sink
            .as_ref()
            .and_then(|sink| defined(sink.duration()))
            .unwrap_or(0.0)
    }

    pub fn paused(&self) -> bool {
        self.sink
            .as_ref()
            .map(|sink| sink.paused().unwrap_or(true))
            .unwrap_or(true)
    }

    pub fn source(&self) -> Option<String> {
        self.sink.as_ref().and_then(MediaSink::source)
    }

    /// Advances by `seconds` (default [DEFAULT_SKIP_SECONDS]) without going past the end.
    /// While the duration is unknown there is no end to clamp to.
    pub fn skip_forward(&mut self, seconds: Option<f64>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let target = self.current_time() + seconds.unwrap_or(DEFAULT_SKIP_SECONDS);
        let target = match defined(sink.duration()) {
            Some(duration) => target.min(duration),
            None => target,
        };
        self.forward("skip forward", |sink| sink.set_current_time(target));
    }

    /// Goes back by `seconds` (default [DEFAULT_SKIP_SECONDS]), stopping at the start.
    pub fn skip_backward(&mut self, seconds: Option<f64>) {
        if self.sink.is_none() {
            return;
        }

        let target = (self.current_time() - seconds.unwrap_or(DEFAULT_SKIP_SECONDS)).max(0.0);
        self.forward("skip backward", |sink| sink.set_current_time(target));
    }

    fn forward(&mut self, what: &str, command: impl FnOnce(&mut S) -> Result<()>) {
        if let Some(sink) = &mut self.sink {
            if let Err(e) = command(sink) {
                warn!("media sink couldn't {}: {}", what, e);
            }
        }
    }
}

/// NaN means "not known yet"
fn defined(value: Result<f64>) -> Option<f64> {
    value.ok().filter(|v| !v.is_nan())
}

fn log_start_failure(source: &str) -> PlayCompletion {
    let source = source.to_owned();
    Box::new(move |outcome| match outcome {
        Ok(()) => debug!("playing {:?}", source),
        Err(e) => error!("error playing audio: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayError;
    use log::{Level, LevelFilter, Metadata, Record};
    use std::cell::RefCell;
    use std::collections::HashMap;

    thread_local! {
        static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
    }

    /// Keeps what each test thread logs, so tests can check the error channel
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            let line = (record.level(), record.args().to_string());
            RECORDS.with(|records| records.borrow_mut().push(line));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;

    fn capture_logs() {
        // another test may have installed it already
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
        RECORDS.with(|records| records.borrow_mut().clear());
    }

    fn logged_errors() -> Vec<String> {
        RECORDS.with(|records| {
            records
                .borrow()
                .iter()
                .filter(|(level, _)| *level == Level::Error)
                .map(|(_, line)| line.clone())
                .collect()
        })
    }

    /// In-memory sink. Sources listed in `durations` "load" with that duration.
    struct ScriptedSink {
        source: Option<String>,
        paused: bool,
        time: f64,
        duration: f64,
        durations: HashMap<String, f64>,
        fail_source: bool,
        fail_start: bool,
        defer_start: bool,
        reject_commands: bool,
        pending: Option<PlayCompletion>,
        delivered: Vec<std::result::Result<(), PlayError>>,
        plays: usize,
    }

    impl ScriptedSink {
        fn with_durations(durations: &[(&str, f64)]) -> Self {
            let mut sink = Self::new().unwrap();
            sink.durations = durations
                .iter()
                .map(|(src, d)| (src.to_string(), *d))
                .collect();
            sink
        }

        fn resolve(&mut self, done: PlayCompletion, outcome: std::result::Result<(), PlayError>) {
            if outcome.is_ok() {
                self.paused = false;
                self.duration = self
                    .source
                    .as_ref()
                    .and_then(|src| self.durations.get(src).copied())
                    .unwrap_or(f64::NAN);
            }
            self.delivered.push(outcome.clone());
            done(outcome);
        }

        fn finish_loading(&mut self) {
            if let Some(done) = self.pending.take() {
                self.resolve(done, Ok(()));
            }
        }
    }

    impl MediaSink for ScriptedSink {
        fn new() -> Result<Self> {
            Ok(Self {
                source: None,
                paused: true,
                time: 0.0,
                duration: f64::NAN,
                durations: HashMap::new(),
                fail_source: false,
                fail_start: false,
                defer_start: false,
                reject_commands: false,
                pending: None,
                delivered: Vec::new(),
                plays: 0,
            })
        }

        fn set_source(&mut self, source: &str) -> Result<()> {
            if self.fail_source {
                return Err("source rejected".into());
            }
            if let Some(done) = self.pending.take() {
                self.resolve(done, Err(PlayError::Aborted));
            }
            self.source = Some(source.to_string());
            self.paused = true;
            self.time = 0.0;
            self.duration = f64::NAN;
            Ok(())
        }

        fn source(&self) -> Option<String> {
            self.source.clone()
        }

        fn play(&mut self, done: PlayCompletion) {
            self.plays += 1;
            if self.fail_start {
                self.resolve(done, Err(PlayError::Decode));
            } else if self.defer_start {
                self.pending = Some(done);
            } else {
                self.resolve(done, Ok(()));
            }
        }

        fn pause(&mut self) -> Result<()> {
            if self.reject_commands {
                return Err("pause rejected".into());
            }
            self.paused = true;
            Ok(())
        }

        fn paused(&self) -> Result<bool> {
            Ok(self.paused)
        }

        fn current_time(&self) -> Result<f64> {
            Ok(self.time)
        }

        fn set_current_time(&mut self, seconds: f64) -> Result<()> {
            if self.reject_commands {
                return Err("seek rejected".into());
            }
            self.time = seconds;
            Ok(())
        }

        fn duration(&self) -> Result<f64> {
            Ok(self.duration)
        }
    }

    struct BrokenSink;

    impl MediaSink for BrokenSink {
        fn new() -> Result<Self> {
            Err("no audio device".into())
        }
        fn set_source(&mut self, _: &str) -> Result<()> {
            unreachable!()
        }
        fn source(&self) -> Option<String> {
            unreachable!()
        }
        fn play(&mut self, _: PlayCompletion) {
            unreachable!()
        }
        fn pause(&mut self) -> Result<()> {
            unreachable!()
        }
        fn paused(&self) -> Result<bool> {
            unreachable!()
        }
        fn current_time(&self) -> Result<f64> {
            unreachable!()
        }
        fn set_current_time(&mut self, _: f64) -> Result<()> {
            unreachable!()
        }
        fn duration(&self) -> Result<f64> {
            unreachable!()
        }
    }

    fn playing(source: &str, duration: f64, at: f64) -> PlaybackController<ScriptedSink> {
        let mut player =
            PlaybackController::with_sink(ScriptedSink::with_durations(&[(source, duration)]));
        player.load_and_play(source);
        player.seek(at);
        player
    }

    fn sink(player: &PlaybackController<ScriptedSink>) -> &ScriptedSink {
        player.sink.as_ref().unwrap()
    }

    fn sink_mut(player: &mut PlaybackController<ScriptedSink>) -> &mut ScriptedSink {
        player.sink.as_mut().unwrap()
    }

    fn exercise<S: MediaSink>(player: &mut PlaybackController<S>) {
        player.load_and_play("song.mp3");
        player.resume();
        player.seek(42.0);
        player.skip_forward(None);
        player.skip_forward(Some(3.0));
        player.skip_backward(None);
        player.skip_backward(Some(1.0));
        player.pause();
        player.stop();
    }

    #[test]
    fn test_torn_down_sink_is_inert() {
        let mut player = playing("song.mp3", 100.0, 30.0);
        player.teardown();
        assert!(!player.has_sink());

        exercise(&mut player);
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.duration(), 0.0);
        assert_eq!(player.source(), None);
        assert!(player.paused());
    }

    #[test]
    fn test_failed_sink_construction() {
        capture_logs();
        let mut player = PlaybackController::<BrokenSink>::new();
        assert!(!player.has_sink());
        assert_eq!(
            logged_errors(),
            vec!["couldn't create media sink: no audio device"]
        );

        exercise(&mut player);
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.duration(), 0.0);
    }

    #[test]
    fn test_load_and_play() {
        let mut player = PlaybackController::with_sink(ScriptedSink::with_durations(&[(
            "song.mp3", 180.0,
        )]));
        player.load_and_play("song.mp3");
        assert_eq!(player.source().as_deref(), Some("song.mp3"));
        assert!(!player.paused());
        assert_eq!(player.duration(), 180.0);
        assert_eq!(sink(&player).delivered, vec![Ok(())]);
    }

    #[test]
    fn test_queries_before_load_finishes() {
        let mut scripted = ScriptedSink::with_durations(&[("song.mp3", 180.0)]);
        scripted.defer_start = true;
        let mut player = PlaybackController::with_sink(scripted);

        player.load_and_play("song.mp3");
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.duration(), 0.0);
        assert!(player.paused());

        sink_mut(&mut player).finish_loading();
        assert_eq!(player.duration(), 180.0);
        assert!(!player.paused());
    }

    #[test]
    fn test_stop_rewinds() {
        let mut player = playing("song.mp3", 100.0, 37.5);
        player.stop();
        assert_eq!(player.current_time(), 0.0);
        assert!(player.paused());

        // again, already stopped
        player.stop();
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn test_pause_keeps_position() {
        let mut player = playing("song.mp3", 100.0, 37.5);
        player.pause();
        player.pause();
        assert!(player.paused());
        assert_eq!(player.current_time(), 37.5);

        player.resume();
        assert!(!player.paused());
        assert_eq!(player.current_time(), 37.5);
    }

    #[test]
    fn test_seek_is_not_clamped() {
        let mut player = playing("song.mp3", 100.0, 0.0);
        player.seek(250.0);
        assert_eq!(player.current_time(), 250.0);
        player.seek(-5.0);
        assert_eq!(player.current_time(), -5.0);
    }

    #[test]
    fn test_skip_forward_clamps_to_duration() {
        let mut player = playing("song.mp3", 100.0, 95.0);
        player.skip_forward(Some(10.0));
        assert_eq!(player.current_time(), 100.0);

        let mut player = playing("song.mp3", 100.0, 20.0);
        player.skip_forward(Some(10.0));
        assert_eq!(player.current_time(), 30.0);
    }

    #[test]
    fn test_skip_forward_with_unknown_duration() {
        let mut player = playing("stream.ogg", f64::NAN, 95.0);
        assert_eq!(player.duration(), 0.0);
        player.skip_forward(Some(10.0));
        assert_eq!(player.current_time(), 105.0);
    }

    #[test]
    fn test_skip_backward_clamps_to_start() {
        let mut player = playing("song.mp3", 100.0, 5.0);
        player.skip_backward(Some(10.0));
        assert_eq!(player.current_time(), 0.0);

        let mut player = playing("song.mp3", 100.0, 50.0);
        player.skip_backward(Some(10.0));
        assert_eq!(player.current_time(), 40.0);
    }

    #[test]
    fn test_default_skip_amount() {
        for at in [0.0, 4.0, 50.0, 95.0] {
            let mut default = playing("song.mp3", 100.0, at);
            let mut explicit = playing("song.mp3", 100.0, at);
            default.skip_forward(None);
            explicit.skip_forward(Some(10.0));
            assert_eq!(default.current_time(), explicit.current_time());

            default.skip_backward(None);
            explicit.skip_backward(Some(10.0));
            assert_eq!(default.current_time(), explicit.current_time());
        }
    }

    #[test]
    fn test_source_replacement() {
        let mut player = PlaybackController::with_sink(ScriptedSink::with_durations(&[
            ("a.mp3", 200.0),
            ("b.mp3", 100.0),
        ]));
        player.load_and_play("a.mp3");
        player.seek(150.0);
        player.load_and_play("b.mp3");

        assert_eq!(player.source().as_deref(), Some("b.mp3"));
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.duration(), 100.0);
    }

    #[test]
    fn test_superseded_load_is_aborted() {
        let mut scripted = ScriptedSink::with_durations(&[("a.mp3", 200.0), ("b.mp3", 100.0)]);
        scripted.defer_start = true;
        let mut player = PlaybackController::with_sink(scripted);
        capture_logs();

        player.load_and_play("a.mp3");
        player.load_and_play("b.mp3");
        assert_eq!(sink(&player).delivered, vec![Err(PlayError::Aborted)]);
        assert_eq!(logged_errors(), vec!["error playing audio: aborted"]);

        sink_mut(&mut player).finish_loading();
        assert_eq!(sink(&player).delivered, vec![Err(PlayError::Aborted), Ok(())]);
        assert_eq!(player.duration(), 100.0);
    }

    #[test]
    fn test_start_failure_is_isolated() {
        let mut scripted = ScriptedSink::with_durations(&[("good.mp3", 60.0)]);
        scripted.fail_start = true;
        let mut player = PlaybackController::with_sink(scripted);

        player.load_and_play("broken.mp3");
        assert_eq!(sink(&player).delivered, vec![Err(PlayError::Decode)]);
        assert!(player.paused());

        player.seek(12.0);
        assert_eq!(player.current_time(), 12.0);

        sink_mut(&mut player).fail_start = false;
        player.load_and_play("good.mp3");
        assert!(!player.paused());
        assert_eq!(player.duration(), 60.0);
    }

    #[test]
    fn test_start_failure_is_logged() {
        let mut scripted = ScriptedSink::new().unwrap();
        scripted.fail_start = true;
        let mut player = PlaybackController::with_sink(scripted);
        capture_logs();

        player.load_and_play("broken.mp3");
        assert_eq!(logged_errors(), vec!["error playing audio: decode error"]);
    }

    #[test]
    fn test_rejected_source_is_logged() {
        let mut player = playing("a.mp3", 100.0, 40.0);
        player.pause();
        assert_eq!(sink(&player).plays, 1);

        sink_mut(&mut player).fail_source = true;
        capture_logs();
        player.load_and_play("b.mp3");

        assert_eq!(logged_errors(), vec!["error playing audio: source rejected"]);
        // the old source must not start again in place of the rejected one
        assert_eq!(sink(&player).plays, 1);
        assert!(player.paused());
        assert_eq!(player.source().as_deref(), Some("a.mp3"));
        assert_eq!(player.current_time(), 40.0);
    }

    #[test]
    fn test_rejected_commands_are_swallowed() {
        let mut player = playing("song.mp3", 100.0, 20.0);
        sink_mut(&mut player).reject_commands = true;

        player.seek(50.0);
        player.skip_forward(None);
        player.skip_backward(None);
        player.pause();
        player.stop();
        assert_eq!(player.current_time(), 20.0);
        assert!(!player.paused());
    }
}
