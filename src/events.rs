use crate::command::Command;
use crate::config::Config;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::{thread, time::Duration};

#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Command(Command),
    Terminal(CrosstermEvent),
}

/// Transforms a key press into the corresponding command, if there is one.
pub fn transform_key(key_event: KeyEvent) -> Event {
    use crossterm::event::Event::Key;
    match Config::global().keybindings.get_from_event(key_event) {
        Some(cmd) if cmd != Command::Nop && key_event.kind == KeyEventKind::Press => {
            Event::Command(cmd)
        }
        _ => Event::Terminal(Key(key_event)),
    }
}

/// Channel creates an unbounded channel and spawns two event emitters: one for terminal input,
/// another for ticks that happen every `tick`.
pub struct Channel {
    pub tx: Sender<Event>,
    pub rx: Receiver<Event>,
}

impl Channel {
    pub fn new(tick: Duration) -> Self {
        let (tx, rx) = unbounded();
        spawn_terminal_event_getter(tx.clone());
        spawn_ticks(tx.clone(), tick);
        Self { tx, rx }
    }
}

fn spawn_terminal_event_getter(tx: Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        let event = match crossterm::event::read() {
            Ok(CrosstermEvent::Key(key)) => transform_key(key),
            Ok(other) => Event::Terminal(other),
            Err(e) => {
                log::warn!("couldn't read terminal event: {}", e);
                return;
            }
        };

        if tx.send(event).is_err() {
            return;
        }
    })
}

fn spawn_ticks(tx: Sender<Event>, tick: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(tick);

        // Stop ticking once the receiver has been dropped
        if tx.send(Event::Tick).is_err() {
            return;
        }
    })
}
