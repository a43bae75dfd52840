use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use spell_race::{
    app_dirs::AppDirs,
    assets::{available_colors, SpriteSet},
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner, SyntheticRelease},
    speech::speaker_for,
    words::WordList,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// typing race in the terminal: spell the word, move the dino
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A typing race for early spellers. Each word typed correctly walks the dinosaur a step towards the gate; a wrong letter makes it kick. Words are read aloud through an external speech command when one is available."
)]
pub struct Cli {
    /// file with one word per line to draw targets from (default: built-in list)
    #[clap(short = 'w', long)]
    words: Option<PathBuf>,

    /// sprite color of the dinosaur
    #[clap(short = 'c', long)]
    color: Option<String>,

    /// do not read words aloud
    #[clap(short = 'm', long)]
    mute: bool,

    /// text-to-speech command, the word is passed as the last argument
    #[clap(long)]
    speech_command: Option<String>,

    /// seed for word choice and the victory dance
    #[clap(long)]
    seed: Option<u64>,

    /// frames per second of the game clock
    #[clap(long)]
    fps: Option<u32>,

    /// config file to read instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// print the available sprite colors and exit
    #[clap(long)]
    list_colors: bool,
}

impl Cli {
    /// Command line values win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(words) = &self.words {
            config.words_file = Some(words.clone());
        }
        if let Some(color) = &self.color {
            config.color = color.clone();
        }
        if let Some(command) = &self.speech_command {
            config.speech_command = Some(command.clone());
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // stderr belongs to the terminal UI, so only ever log to the file
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_colors {
        for color in available_colors() {
            println!("{color}");
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    let mut config = cli.config_store().load();
    cli.apply(&mut config);

    let sprites = match SpriteSet::load(&config.color) {
        Ok(sprites) => sprites,
        Err(err) => {
            let mut cmd = Cli::command();
            let hint = format!("{err} (available: {})", available_colors().join(", "));
            cmd.error(ErrorKind::InvalidValue, hint).exit();
        }
    };
    let words = match WordList::load(config.words_file.as_deref()) {
        Ok(words) => words,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    };
    let speaker = speaker_for(config.speech_command.as_deref(), cli.mute);

    info!(
        color = %config.color,
        words = words.len(),
        fps = config.fps(),
        "starting race"
    );
    let mut game = Game::new(&config, sprites, words, speaker);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    } else {
        warn!("terminal does not report key releases, emulating them");
    }
    let release = (!release_events)
        .then(|| SyntheticRelease::new(config.secs_to_frames(config.key_hold_secs)));

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = run_game(&mut terminal, &mut game, release);

    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn run_game<B: Backend>(
    terminal: &mut Terminal<B>,
    game: &mut Game,
    mut release: Option<SyntheticRelease>,
) -> Result<(), Box<dyn Error>> {
    let ticker = FixedTicker::from_fps(game.timings().fps);
    let mut runner = Runner::new(CrosstermEventSource::new(), ticker);

    terminal.draw(|f| f.render_widget(&*game, f.area()))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                game.on_frame();
                let frame = game.session().frame_number;
                if release.as_mut().is_some_and(|r| r.poll(frame)) {
                    game.on_key_up();
                }
                terminal.draw(|f| f.render_widget(&*game, f.area()))?;
            }
            GameEvent::KeyDown(c) => {
                game.on_key_down(c);
                if let Some(r) = release.as_mut() {
                    r.arm(game.session().frame_number);
                }
            }
            GameEvent::KeyUp => game.on_key_up(),
            GameEvent::Restart => {
                game.restart();
                if let Some(r) = release.as_mut() {
                    r.disarm();
                }
            }
            GameEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*game, f.area()))?;
            }
            GameEvent::Quit => break,
        }
    }

    info!(
        elapsed_secs = game.session().elapsed_secs,
        "leaving race"
    );
    Ok(())
}
