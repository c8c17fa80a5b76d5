#![forbid(unsafe_code)]

//! Fireframe terminal binary entry point.

mod cli;
mod input;
mod present;
mod session;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event;
use tracing_subscriber::EnvFilter;

use fireframe_core::entity::EntityTable;
use fireframe_core::palette::Palette;
use fireframe_core::{SceneConfig, SceneController};

use cli::{Action, Opts};
use input::{Command, InputMapper, KEY_BINDINGS};
use session::TerminalSession;

/// Input poll timeout; bounds command latency while idle.
const INPUT_POLL: Duration = Duration::from_millis(5);

/// Install a file log sink. Without a file, nothing is installed so the
/// alternate screen stays clean.
fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn list(config: &SceneConfig) {
    println!("Palettes:");
    for p in Palette::builtins() {
        println!("  {}", p.name());
    }
    println!("Shapes:");
    for name in EntityTable::with_external(&config.mesh_files, 1.0).names() {
        println!("  {name}");
    }
}

fn run(mut opts: Opts) -> io::Result<()> {
    for (keys, what) in KEY_BINDINGS {
        tracing::info!("{keys:>16} : {what}");
    }

    let session = TerminalSession::enter()?;
    let (cols, rows) = session.size()?;
    let (tw, th) = present::target_size(cols, rows);
    opts.scene.width = opts.width.unwrap_or(tw);
    opts.scene.height = opts.height.unwrap_or(th);
    let explicit_size = opts.width.is_some() || opts.height.is_some();

    let mut scene = SceneController::new(&opts.scene);
    let (frame_tx, frame_rx) = mpsc::sync_channel::<()>(1);
    let title = Arc::new(Mutex::new(String::new()));
    let title_sink = Arc::clone(&title);
    scene.start(
        None,
        Box::new(move || {
            // Coalesce: a pending notification already covers this frame.
            let _ = frame_tx.try_send(());
        }),
        Arc::new(move |t: &str| {
            if let Ok(mut slot) = title_sink.lock() {
                t.clone_into(&mut *slot);
            }
        }),
    )?;

    let target = scene.target();
    let mut mapper = InputMapper::new();
    let mut grid = (usize::from(cols), usize::from(rows.saturating_sub(1)));
    let mut out = BufWriter::new(io::stdout());

    let result = loop {
        let mut quit = false;
        while event::poll(INPUT_POLL)? {
            match mapper.map(&event::read()?) {
                Some(Command::Quit) => {
                    quit = true;
                    break;
                }
                Some(Command::Resize { cols, rows }) => {
                    grid = (usize::from(cols), usize::from(rows.saturating_sub(1)));
                    if !explicit_size {
                        let (w, h) = present::target_size(cols, rows);
                        scene.resize(w, h);
                    }
                }
                Some(cmd) => cmd.apply(&scene),
                None => {}
            }
        }
        if quit {
            break Ok(());
        }

        match frame_rx.try_recv() {
            Ok(()) => {
                let cells = present::compose(&target.lock(), grid.0, grid.1);
                let status = title.lock().map(|t| t.clone()).unwrap_or_default();
                present::present(&mut out, &cells, grid.0, &status)?;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break Ok(()),
        }
    };

    scene.stop();
    drop(session);
    result
}

fn main() {
    let action = match Opts::parse() {
        Ok(action) => action,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(2);
        }
    };

    match action {
        Action::Help => println!("{}", cli::HELP_TEXT),
        Action::Version => println!("fireframe {}", cli::VERSION),
        Action::List(opts) => list(&opts.scene),
        Action::Run(opts) => {
            if let Some(path) = &opts.log_file
                && let Err(err) = init_logging(path)
            {
                eprintln!("Cannot open log file {}: {err}", path.display());
                std::process::exit(1);
            }
            if let Err(err) = run(opts) {
                eprintln!("fireframe: {err}");
                std::process::exit(1);
            }
        }
    }
}
