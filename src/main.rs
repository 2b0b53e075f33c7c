// src/main.rs

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use micfx::capture::{CaptureBackend, CpalCapture, SyntheticCapture};
use micfx::controller::RecorderController;
use micfx::{parse_amount, AppConfig, Session};

#[derive(Parser, Debug)]
#[command(version, about = "Microphone recorder with live effects and a spectrum view")]
struct Args {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the recording is saved into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Use a generated test tone instead of the microphone
    #[arg(long)]
    synthetic: bool,

    /// Initial distortion amount (non-numeric falls back to 50)
    #[arg(long)]
    distortion: Option<String>,

    /// Initial pitch (gain multiplier)
    #[arg(long)]
    pitch: Option<f32>,

    /// Visualizer frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Record for this many seconds without the terminal UI, then save and exit
    #[arg(long)]
    headless: Option<f64>,
}

const LOG_FILE_NAME: &str = "micfx.log";

/// Headless runs log to stderr. The TUI shares that TTY with the canvas, so it
/// logs to a file in the output directory instead.
fn init_logging(headless: bool, output_dir: &Path) -> Result<(), anyhow::Error> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if !headless {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;
        let path = output_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_disk(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(p) = args.pitch {
        config.pitch = p;
    }
    if let Some(fps) = args.fps {
        config.fps = fps.max(1);
    }
    init_logging(args.headless.is_some(), &config.output_dir)?;
    let distortion = match args.distortion.as_deref() {
        Some(text) => parse_amount(text),
        None => Some(config.distortion),
    };

    let backend: Box<dyn CaptureBackend> = if args.synthetic {
        Box::new(SyntheticCapture::default())
    } else {
        Box::new(CpalCapture)
    };

    let mut session = Session::new(backend, config);
    session.set_distortion(distortion);

    match args.headless {
        Some(secs) => run_headless(session, secs),
        None => run_tui(session),
    }
}

fn run_headless(mut session: Session, secs: f64) -> Result<(), anyhow::Error> {
    session.start().context("starting session")?;
    thread::sleep(Duration::from_secs_f64(secs.max(0.0)));
    session.stop();
    session.finish_stop();

    match session.save()? {
        Some(path) => log::info!("Saved {}", path.display()),
        None => log::warn!("No recording was produced"),
    }
    Ok(())
}

fn run_tui(session: Session) -> Result<(), anyhow::Error> {
    let frame = Duration::from_millis(1000 / session.config().fps.max(1) as u64);
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    // Leave two lines for the status bar.
    let mut ui = RecorderController::new(session, cols as usize, rows.saturating_sub(2) as usize);

    enable_raw_mode()?;
    let result = event_loop(&mut ui, frame);
    disable_raw_mode()?;

    // Finalize anything still in flight so the process exits cleanly.
    ui.session.stop();
    ui.session.finish_stop();

    println!("\nExiting.");
    result
}

fn event_loop(ui: &mut RecorderController, frame: Duration) -> Result<(), anyhow::Error> {
    ui.run_tick()?;
    loop {
        if event::poll(frame)? {
            if let Event::Key(ev) = event::read()? {
                if ev.kind == KeyEventKind::Press {
                    if ui.should_quit(ev.code, ev.modifiers) {
                        return Ok(());
                    }
                    ui.handle_key(ev.code);
                }
            }
        }
        ui.run_tick()?;
    }
}
