use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use skyline::animation::ClockExit;
use skyline::app::App;
use skyline::config::Config;
use skyline::error::OnboardError;
use skyline::logging;
use skyline::render::{Surface, TerminalRenderer};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    version,
    about = "A procedural night skyline animated in your terminal",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "N", help = "Seed the layout generator for a reproducible skyline")]
    seed: Option<u64>,

    #[arg(long, value_name = "FPS", help = "Frames per second (1 to 240)")]
    fps: Option<u32>,

    #[arg(long, value_name = "N", help = "Drop every n-th frame (0 or 1 = never)")]
    frame_skip: Option<u32>,

    #[arg(short, long, value_name = "N", help = "Number of drifting decorations")]
    density: Option<i64>,

    #[arg(long, value_name = "PATH", help = "Foreground sprite image")]
    sprite: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Image used for the drifting decorations")]
    decor: Option<PathBuf>,

    #[arg(long, help = "Start with the foreground sprite hidden")]
    no_sprite: bool,

    #[arg(long, help = "Run the interactive setup wizard")]
    setup: bool,

    #[arg(long, value_name = "SHELL", help = "Print shell completions and exit")]
    completions: Option<Shell>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(fps) = self.fps {
            config.clock.fps = fps;
        }
        if let Some(skip) = self.frame_skip {
            config.clock.frame_skip = skip;
        }
        if let Some(density) = self.density {
            config.decor.density = density;
        }
        if let Some(ref path) = self.sprite {
            config.sprite.path = Some(path.clone());
        }
        if let Some(ref path) = self.decor {
            config.decor.path = Some(path.clone());
        }
        if self.no_sprite {
            config.sprite.show = false;
        }
    }
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::execute!(
            io::stdout(),
            crossterm::event::DisableMouseCapture,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
            crossterm::style::ResetColor
        );
        let _ = crossterm::terminal::disable_raw_mode();
        default_hook(info);
    }));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "skyline", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    if cli.setup {
        return match skyline::onboard::run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(OnboardError::Cancelled) => {
                eprintln!("Setup cancelled, nothing was saved.");
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("Setup failed: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config ({}): {}", e.kind(), e);
            eprintln!("\nContinuing with the default scene.");
            eprintln!("\nTo customize, edit or create a config file at:");
            eprintln!("  $XDG_CONFIG_HOME/skyline/config.toml");
            eprintln!("  or ~/.config/skyline/config.toml");
            eprintln!("\nor run `skyline --setup`.");
            eprintln!();
            Config::default()
        }
    };

    cli.apply(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = logging::log_path() {
        if !config.silent {
            eprintln!("Session log: {}", path.display());
        }
        logging::init(path);
    }

    match run(config, cli.seed).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, seed: Option<u64>) -> Result<(), String> {
    let mut renderer = TerminalRenderer::new()
        .map_err(|e| format!("Could not open the terminal: {}", e))?;
    install_panic_hook();
    renderer
        .init()
        .map_err(|e| format!("Could not prepare the terminal: {}", e))?;

    let mut app = App::new(config, renderer.pixel_size(), seed);
    app.load_sprites();

    let exit = tokio::select! {
        exit = app.run(&mut renderer) => exit,
        _ = tokio::signal::ctrl_c() => ClockExit::Stopped,
    };

    renderer
        .cleanup()
        .map_err(|e| format!("Could not restore the terminal: {}", e))?;

    match exit {
        ClockExit::SurfaceLost(e) => Err(e.user_friendly_message()),
        ClockExit::Stopped | ClockExit::SourceEnded => Ok(()),
    }
}
