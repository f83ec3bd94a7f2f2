//! Scrawl entrypoint: bootstrap, the cooperative event loop, teardown.

use anyhow::{Context, Result};
use clap::Parser;
use core_config::load_from;
use core_input::translate;
use core_render::{build_plan, emit};
use core_script::{ScriptHost, SharedEditor};
use core_state::{EditorOptions, EditorState};
use core_terminal::{CrosstermBackend, Frame};
use scrawl::dispatch::{DispatchState, dispatch};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Idle poll quantum: expired polls re-check terminal geometry and redraw.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "scrawl", version, about = "Scriptable terminal editor")]
struct Args {
    /// File to open at startup; a missing path becomes a new buffer.
    path: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `scrawl.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", "scrawl.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => {
            // A global subscriber is already installed (tests); drop the
            // guard so the writer shuts down.
            None
        }
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn bootstrap_state(args: &Args) -> Result<EditorState> {
    let config = load_from(args.config.clone())?;
    let mut state = EditorState::new(EditorOptions::from(&config));

    if let Some(path) = &args.path {
        let mut open_failed = false;
        {
            let EditorState {
                buffers, registry, ..
            } = &mut state;
            if let Err(e) = buffers[0].open(path, registry) {
                info!(target: "io", path = %path.display(), error = %e, "open_failed_new_file");
                buffers[0].set_filename(Some(path.clone()));
                open_failed = true;
            }
        }
        if open_failed {
            state.set_status(format!("new file: {}", path.display()));
        }
    }
    Ok(state)
}

fn event_loop(shared: &SharedEditor, host: &ScriptHost) -> Result<()> {
    let mut ds = DispatchState::new();
    loop {
        if !shared.borrow().running {
            break;
        }
        let term = crossterm::terminal::size().unwrap_or((80, 24));

        // Plan under the borrow, emit without it so script hooks can call
        // back into the editor API.
        let plan = {
            let mut ed = shared.borrow_mut();
            build_plan(&mut ed, term)
        };
        let mut frame = Frame::new();
        emit(&plan, host, &mut frame);
        frame.flush()?;

        if crossterm::event::poll(READ_TIMEOUT)? {
            let raw = crossterm::event::read()?;
            if let Some(event) = translate(raw) {
                dispatch(shared, host, &mut ds, event, term);
            }
        }
    }
    Ok(())
}

fn run() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let state = bootstrap_state(&args)?;
    let shared: SharedEditor = Rc::new(RefCell::new(state));

    let host = ScriptHost::new(shared.clone()).context("interpreter bring-up")?;
    let loaded = host.load_init_scripts();
    info!(target: "runtime", init_scripts = loaded, "bootstrap_complete");

    let mut backend = CrosstermBackend::new();
    let guard = backend.enter_guard().context("terminal raw mode")?;
    let result = event_loop(&shared, &host);
    drop(guard);
    result
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(target: "runtime", error = %format!("{e:#}"), "fatal");
            eprintln!("scrawl: {e:#}");
            ExitCode::FAILURE
        }
    }
}
