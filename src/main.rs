use std::env;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use vidctl::display::{format_duration, TransportDisplay};
use vidctl::playback::{PlaybackProgress, SeekDirection};
use vidctl::source::ClockSource;
use vidctl::{Config, PlaybackService};

const DEFAULT_DURATION_SECS: f64 = 20.0;

/// User intent parsed from one line of stdin
#[derive(Debug, PartialEq)]
enum Input {
    PlayPause,
    Scrub(f64),
    ScrubRatio(f64),
    Relative(SeekDirection, Option<f64>),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;
    let argument = parts.next();

    match command {
        "p" => Some(Input::PlayPause),
        "q" => Some(Input::Quit),
        "s" => {
            let argument = argument?;
            match argument.strip_suffix('%') {
                Some(percent) => Some(Input::ScrubRatio(percent.parse::<f64>().ok()? / 100.0)),
                None => Some(Input::Scrub(argument.parse().ok()?)),
            }
        }
        "f" | "b" => {
            let amount = match argument {
                Some(raw) => Some(raw.parse().ok()?),
                None => None,
            };
            let direction = if command == "f" {
                SeekDirection::Forward
            } else {
                SeekDirection::Backward
            };
            Some(Input::Relative(direction, amount))
        }
        _ => None,
    }
}

/// Parse a `--duration` value. Rejects non-positive values and ones too large
/// to represent as a `Duration`.
fn parse_duration_arg(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.parse().ok()?;
    if secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

fn render(display: &TransportDisplay) {
    const WIDTH: usize = 30;
    let filled = (display.ratio() * WIDTH as f64).round() as usize;
    let bar: String = "#".repeat(filled) + &"-".repeat(WIDTH - filled.min(WIDTH));

    let mut stdout = std::io::stdout();
    let _ = write!(
        stdout,
        "\r{:?} [{}] {} / {}   ",
        display.button(),
        bar,
        display.elapsed_label,
        display.duration_label
    );
    let _ = stdout.flush();
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <url> [--duration <seconds>]", program);
    eprintln!();
    eprintln!("Commands (one per line):");
    eprintln!("  p            play/pause");
    eprintln!("  s <secs|N%>  scrub to a position");
    eprintln!("  f [secs]     seek forward");
    eprintln!("  b [secs]     seek backward");
    eprintln!("  q            quit");
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let mut url: Option<String> = None;
    let mut duration = Duration::from_secs_f64(DEFAULT_DURATION_SECS);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--duration" => {
                match args.get(i + 1).and_then(|raw| parse_duration_arg(raw)) {
                    Some(parsed) => duration = parsed,
                    _ => {
                        error!("--duration requires a positive number of seconds");
                        print_usage(&args[0]);
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            arg if url.is_none() && !arg.starts_with("--") => {
                url = Some(arg.to_string());
                i += 1;
            }
            _ => {
                error!("Unknown argument: {}", args[i]);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    let Some(url) = url else {
        print_usage(&args[0]);
        std::process::exit(1);
    };

    let config = Config::load();
    let seek_step = config.seek_step;
    info!("Simulating {} with duration {}", url, format_duration(duration));

    let source = Arc::new(ClockSource::new().with_asset(url.clone(), duration));
    let playback = PlaybackService::start(config, source, tokio::runtime::Handle::current());
    let mut progress_rx = playback.subscribe_progress();

    playback.load(url);

    let mut display = TransportDisplay::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(progress) = progress_rx.recv() => {
                if let PlaybackProgress::LoadFailed { error } = &progress {
                    error!("{}", error);
                }
                display.apply(&progress);
                render(&display);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                };

                match parse_input(&line) {
                    Some(Input::PlayPause) => playback.play_pause(),
                    Some(Input::Scrub(secs)) => playback.seek(secs),
                    Some(Input::ScrubRatio(ratio)) => playback.seek(display.scrub_target(ratio)),
                    Some(Input::Relative(direction, amount)) => {
                        playback.seek_relative(direction, amount.unwrap_or(seek_step))
                    }
                    Some(Input::Quit) => break,
                    None => error!("Unrecognized command: {:?}", line.trim()),
                }
            }
        }
    }

    playback.shutdown().await;
    println!();
}
