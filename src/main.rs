// (C) 2025 - Enzo Lombardi

//! Binary entry point: CLI parsing, TTY check, logger and signal setup,
//! then hand-off to the application shell.

use std::io::{IsTerminal, stderr, stdin, stdout};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;

use termsplash::app::{AppOptions, Application};
use termsplash::config::ConfigStore;
use termsplash::core::theme::ThemeSet;
use termsplash::engine::{MAX_FPS, MIN_FPS};
use termsplash::patterns::PatternRegistry;
use termsplash::terminal::TerminalRenderer;

/// Quality tiers mapping to target frame rates.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    fn fps(self) -> u32 {
        match self {
            Quality::Low => 15,
            Quality::Medium => 30,
            Quality::High => 60,
        }
    }
}

#[derive(Parser)]
#[command(name = "termsplash", version, about = "Full-screen terminal animation engine")]
struct Cli {
    /// Pattern to start with (case-insensitive name)
    #[arg(short, long)]
    pattern: Option<String>,

    /// Quality tier (maps to 15/30/60 fps)
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// Target frames per second (10-60; overrides --quality)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Theme to start with (case-insensitive name)
    #[arg(short, long)]
    theme: Option<String>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,
}

fn main() -> ExitCode {
    // --help/--version have already printed and exited here; everything
    // below needs an interactive terminal.
    let cli = Cli::parse();

    if !stdout().is_terminal() || !stdin().is_terminal() {
        use std::io::Write;
        let _ = writeln!(
            stderr(),
            "termsplash: standard input/output must be an interactive terminal\n\
             (run it directly in a terminal; see --help for options)"
        );
        return ExitCode::FAILURE;
    }

    init_logging();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            use std::io::Write;
            let _ = writeln!(stderr(), "termsplash: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// File logging, enabled by pointing TERMSPLASH_LOG at a path. Never
/// logs to stdout; the alternate screen owns it.
fn init_logging() {
    let Ok(path) = std::env::var("TERMSPLASH_LOG") else {
        return;
    };
    if let Ok(file) = std::fs::File::create(&path) {
        let _ = simplelog::WriteLogger::init(
            simplelog::LevelFilter::Debug,
            simplelog::Config::default(),
            file,
        );
    }
}

fn run(cli: Cli) -> termsplash::core::error::Result<()> {
    let registry = PatternRegistry::builtin();
    let themes = ThemeSet::builtin();

    // Validate CLI selections before touching the terminal
    if let Some(name) = &cli.pattern {
        if registry.resolve(name).is_none() {
            return Err(invalid(format!(
                "unknown pattern '{}' (available: {})",
                name,
                registry.names().join(", ")
            )));
        }
    }
    if let Some(name) = &cli.theme {
        if themes.resolve(name).is_none() {
            return Err(invalid(format!(
                "unknown theme '{}' (available: {})",
                name,
                themes.names().join(", ")
            )));
        }
    }
    if let Some(fps) = cli.fps {
        if !(MIN_FPS..=MAX_FPS).contains(&fps) {
            return Err(invalid(format!("fps must be {}-{}", MIN_FPS, MAX_FPS)));
        }
    }

    let config = match ConfigStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            log::warn!("config store unavailable: {}", e);
            None
        }
    };

    // CLI beats saved snapshot beats defaults
    let snapshot = config.as_ref().map(|c| c.config().clone()).unwrap_or_default();
    let pattern = cli.pattern.or(snapshot.pattern);
    let theme = cli.theme.or(snapshot.theme);
    let fps = cli
        .fps
        .or_else(|| cli.quality.map(Quality::fps))
        .or(snapshot.fps)
        .unwrap_or(30)
        .clamp(MIN_FPS, MAX_FPS);
    let mouse = !cli.no_mouse && snapshot.mouse.unwrap_or(true);

    // Saved names may refer to removed patterns/themes; fall back
    // silently rather than refusing to start.
    let pattern = pattern.filter(|name| registry.resolve(name).is_some());
    let theme = theme.filter(|name| themes.resolve(name).is_some());

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        let _ = signal_hook::flag::register(signal, shutdown.clone());
    }

    let renderer = TerminalRenderer::init(mouse)?;
    let mut app = Application::new(
        renderer,
        AppOptions {
            pattern,
            theme,
            fps,
            mouse,
            config,
        },
    )?;
    app.run(&shutdown)
}

fn invalid(msg: String) -> termsplash::core::error::SplashError {
    termsplash::core::error::SplashError::invalid_input(msg)
}
