use argh::FromArgs;
use crossterm::terminal::{self, ClearType};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tonearm::command::Command;
use tonearm::config::{Config, OptionalConfig};
use tonearm::events::{Channel, Event};
use tonearm::player::DefaultSink;
use tonearm::{PlaybackController, Result};

type Player = PlaybackController<DefaultSink>;

#[derive(FromArgs)]
/// Play one audio file or URL from the terminal
struct Args {
    #[argh(option, short = 'c')]
    /// the path to an alternative config file. If not present, the config is loaded from
    /// $CONFIG_DIR/tonearm.yaml, where $CONFIG_DIR is $HOME/.config on Linux,
    /// $HOME/Library/Application Support on macOS, and %appdata% on Windows.
    config: Option<String>,

    #[argh(positional)]
    /// the path or URL to play
    source: String,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args: Args = argh::from_env();
    Config::set_global({
        let opt_conf = OptionalConfig::from_path(
            args.config
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_path),
        )?;

        Config::default().merge(opt_conf)
    })?;

    let mut player = Player::new();
    player.load_and_play(&args.source);

    terminal::enable_raw_mode()?;
    let result = run(&mut player);
    terminal::disable_raw_mode()?;
    println!();
    result
}

fn run(player: &mut Player) -> Result<()> {
    let config = Config::global();
    let channel = Channel::new(Duration::from_millis(config.tick_millis));

    print_status(player)?;
    for event in channel.rx.iter() {
        match event {
            Event::Command(Command::Quit) => break,
            Event::Command(cmd) => {
                handle_command(player, cmd, config.skip_seconds);
                print_status(player)?;
            }
            Event::Tick => print_status(player)?,
            Event::Terminal(_) => {}
        }
    }
    Ok(())
}

fn handle_command(player: &mut Player, cmd: Command, skip_seconds: f64) {
    match cmd {
        Command::Nop | Command::Quit => {}
        Command::TogglePause if player.paused() => player.resume(),
        Command::TogglePause => player.pause(),
        Command::Stop => player.stop(),
        Command::SkipForward => player.skip_forward(Some(skip_seconds)),
        Command::SkipBackward => player.skip_backward(Some(skip_seconds)),
        Command::SeekStart => player.seek(0.0),
    }
}

fn print_status(player: &Player) -> Result<()> {
    let mut out = io::stdout();
    let state = if player.paused() { "paused " } else { "playing" };
    write!(
        out,
        "\r{} {} / {}",
        state,
        format_time(player.current_time()),
        format_time(player.duration())
    )?;
    crossterm::execute!(out, terminal::Clear(ClearType::UntilNewLine))?;
    out.flush()?;
    Ok(())
}

fn format_time(seconds: f64) -> String {
    let secs = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
