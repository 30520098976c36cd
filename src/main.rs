pub mod ui;

use bennections::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, Identity},
    controller::{GuessOutcome, Rejection, RoundController},
    history::{ResultEntry, ResultsLog},
    puzzle::{PuzzleBook, PuzzleDay, GROUP_SIZE},
    runtime::{CrosstermEventSource, EventSource, GameEvent, Runner, Scheduler},
    store::{ensure_profile, set_nickname, ScoreRecord, ScoreStore, SqliteStore, UserProfile},
    timer::{Clock, SystemClock},
    util::{first_name, long_date, parse_date, today},
};
use chrono::NaiveDate;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "BENNECTIONS_LOG";

/// daily word-grouping puzzle for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Sort sixteen words into four groups of four. Four mistakes and the round is over; finish fast with few mistakes for a better medal."
)]
pub struct Cli {
    /// puzzle date to play (YYYY-MM-DD), defaults to today
    #[clap(short = 'd', long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// read puzzles from this JSON file instead of the bundled set
    #[clap(long)]
    puzzle_file: Option<PathBuf>,

    /// set (and remember) the nickname shown on the leaderboard
    #[clap(short = 'n', long)]
    nickname: Option<String>,

    /// play without recording scores or medals
    #[clap(long)]
    guest: bool,

    /// print the day's leaderboard and exit
    #[clap(long)]
    leaderboard: bool,

    /// number of leaderboard entries to show
    #[clap(long)]
    limit: Option<usize>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| format!("expected YYYY-MM-DD ({e})"))
}

/// Per-run knobs, from config with CLI overrides applied
#[derive(Debug, Clone)]
pub struct Settings {
    pub guest: bool,
    pub leaderboard_limit: usize,
    pub resolve_delay: Duration,
    pub message_clear: Duration,
    pub lose_face: Duration,
    pub reveal_stagger: Duration,
}

impl Settings {
    fn new(cli: &Cli, config: &Config) -> Self {
        Self {
            guest: cli.guest,
            leaderboard_limit: cli.limit.unwrap_or(config.leaderboard_limit),
            resolve_delay: Duration::from_millis(config.resolve_delay_ms),
            message_clear: Duration::from_millis(config.message_clear_ms),
            lose_face: Duration::from_millis(config.lose_face_ms),
            reveal_stagger: Duration::from_millis(config.reveal_stagger_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Start,
    Playing,
    Won,
    Lost,
}

/// Deferred UI steps
#[derive(Debug, Clone, Copy, PartialEq)]
enum Followup {
    Unlock,
    ClearMessage,
    Reveal(usize),
}

pub struct App<C: Clock + Clone + 'static> {
    settings: Settings,
    identity: Identity,
    puzzle: PuzzleDay,
    store: Box<dyn ScoreStore>,
    results_log: ResultsLog,
    clock: C,
    rng: StdRng,
    scheduler: Scheduler<Followup>,

    pub state: AppState,
    controller: Option<RoundController>,
    profile: Option<UserProfile>,
    /// `None` when the store could not be read
    leaderboard: Option<Vec<ScoreRecord>>,
    cursor: usize,
    message: Option<String>,
    /// How many unsolved groups a lost round has uncovered so far
    revealed: usize,
}

impl<C: Clock + Clone + 'static> App<C> {
    pub fn new(
        settings: Settings,
        identity: Identity,
        puzzle: PuzzleDay,
        store: Box<dyn ScoreStore>,
        results_log: ResultsLog,
        clock: C,
        rng: StdRng,
    ) -> Self {
        let scheduler = Scheduler::new(Box::new(clock.clone()));
        let mut app = Self {
            settings,
            identity,
            puzzle,
            store,
            results_log,
            clock,
            rng,
            scheduler,
            state: AppState::Start,
            controller: None,
            profile: None,
            leaderboard: None,
            cursor: 0,
            message: None,
            revealed: 0,
        };
        app.refresh_start_screen();
        app
    }

    pub fn controller(&self) -> Option<&RoundController> {
        self.controller.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn nickname(&self) -> String {
        match &self.profile {
            Some(p) => p.nickname.clone(),
            None => first_name(&self.identity.display_name),
        }
    }

    fn refresh_start_screen(&mut self) {
        let date = self.puzzle.date();
        self.leaderboard = match self
            .store
            .query_top_scores(date, self.settings.leaderboard_limit)
        {
            Ok(scores) => Some(scores),
            Err(e) => {
                warn!("could not load leaderboard for {date}: {e}");
                None
            }
        };
        if !self.settings.guest {
            match self.store.get_user_profile(&self.identity.uid) {
                Ok(profile) => self.profile = profile,
                Err(e) => warn!("could not load profile: {e}"),
            }
        }
    }

    fn begin_round(&mut self) {
        self.scheduler.clear();
        self.controller = Some(RoundController::start(
            self.puzzle.clone(),
            Box::new(self.clock.clone()),
            &mut self.rng,
        ));
        self.cursor = 0;
        self.message = None;
        self.revealed = 0;
        self.state = AppState::Playing;
    }

    /// Returns true when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        match self.state {
            AppState::Start => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.begin_round(),
                KeyCode::Esc | KeyCode::Char('q') => return true,
                _ => {}
            },
            AppState::Playing => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Left => self.move_cursor(-1, 0),
                KeyCode::Right => self.move_cursor(1, 0),
                KeyCode::Up => self.move_cursor(0, -1),
                KeyCode::Down => self.move_cursor(0, 1),
                KeyCode::Char(' ') => self.toggle_at_cursor(),
                KeyCode::Enter => self.submit(),
                KeyCode::Char('d') => {
                    if let Some(c) = self.controller.as_mut() {
                        if let Err(r) = c.deselect_all() {
                            self.on_rejection(r);
                        }
                    }
                }
                KeyCode::Char('s') => {
                    if let Some(c) = self.controller.as_mut() {
                        if let Err(r) = c.shuffle_board(&mut self.rng) {
                            self.on_rejection(r);
                        }
                    }
                }
                _ => {}
            },
            AppState::Won | AppState::Lost => match key.code {
                KeyCode::Enter => {
                    self.scheduler.clear();
                    self.refresh_start_screen();
                    self.state = AppState::Start;
                }
                KeyCode::Esc | KeyCode::Char('q') => return true,
                _ => {}
            },
        }
        false
    }

    pub fn on_tick(&mut self) {
        for followup in self.scheduler.due() {
            match followup {
                Followup::Unlock => {
                    if let Some(c) = self.controller.as_mut() {
                        c.finish_resolution();
                    }
                }
                Followup::ClearMessage => self.message = None,
                Followup::Reveal(i) => self.revealed = self.revealed.max(i + 1),
            }
        }
    }

    fn board_len(&self) -> usize {
        self.controller
            .as_ref()
            .map_or(0, |c| c.state().board().len())
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let len = self.board_len();
        if len == 0 {
            return;
        }
        let cols = GROUP_SIZE as i32;
        let rows = (len as i32 + cols - 1) / cols;
        let col = (self.cursor as i32 % cols + dx).clamp(0, cols - 1);
        let row = (self.cursor as i32 / cols + dy).clamp(0, rows - 1);
        let target = (row * cols + col) as usize;
        if target < len {
            self.cursor = target;
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.board_len().saturating_sub(1));
    }

    fn toggle_at_cursor(&mut self) {
        let Some(c) = self.controller.as_mut() else {
            return;
        };
        let Some(word) = c.state().board().get(self.cursor).cloned() else {
            return;
        };
        if let Err(r) = c.toggle_select(&word) {
            self.on_rejection(r);
        }
    }

    fn submit(&mut self) {
        let Some(c) = self.controller.as_mut() else {
            return;
        };
        match c.submit_guess() {
            Ok(outcome) => self.on_outcome(outcome),
            Err(r) => self.on_rejection(r),
        }
    }

    fn on_rejection(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::SelectionIncomplete => self.flash("Select four words"),
            other => debug!("ignored command: {other}"),
        }
    }

    fn flash(&mut self, text: &str) {
        self.message = Some(text.to_string());
        self.scheduler.cancel(|f| *f == Followup::ClearMessage);
        self.scheduler
            .schedule(self.settings.message_clear, Followup::ClearMessage);
    }

    fn schedule_unlock(&mut self) {
        self.scheduler
            .schedule(self.settings.resolve_delay, Followup::Unlock);
    }

    fn on_outcome(&mut self, outcome: GuessOutcome) {
        match outcome {
            GuessOutcome::DuplicateGuess => self.flash("Already guessed!"),
            GuessOutcome::Correct { .. } => {
                self.message = None;
                self.clamp_cursor();
                self.schedule_unlock();
            }
            GuessOutcome::NearMiss => {
                self.flash("One away!");
                self.schedule_unlock();
            }
            GuessOutcome::Incorrect => {
                self.flash("Incorrect");
                self.schedule_unlock();
            }
            GuessOutcome::RoundWon { .. } => {
                self.message = None;
                self.cursor = 0;
                self.record_finish();
                self.state = AppState::Won;
            }
            GuessOutcome::RoundLost { .. } => {
                self.scheduler.cancel(|f| *f == Followup::ClearMessage);
                self.message = Some("Game Over!".to_string());
                self.record_finish();
                let remaining = self
                    .controller
                    .as_ref()
                    .map_or(0, |c| c.remaining_groups().len());
                for i in 0..remaining {
                    let after = self.settings.lose_face + self.settings.reveal_stagger * i as u32;
                    self.scheduler.schedule(after, Followup::Reveal(i));
                }
                self.state = AppState::Lost;
            }
        }
    }

    /// Log the round and, for a signed-in win, post the score and medal.
    /// Failures here are logged and never touch the finished round.
    fn record_finish(&mut self) {
        let Some(c) = &self.controller else {
            return;
        };
        let date = c.puzzle().date();

        if let Some(entry) = ResultEntry::from_state(date, c.state()) {
            if let Err(e) = self.results_log.append(&entry) {
                warn!("could not append results log: {e}");
            }
        }

        if self.settings.guest {
            info!("guest round, nothing recorded");
            return;
        }
        let (Some(medal), Some(secs)) = (c.medal(), c.state().elapsed_seconds()) else {
            return;
        };

        let record = ScoreRecord::new(
            &self.identity.uid,
            &self.nickname(),
            secs,
            c.state().mistakes_made(),
            date,
            medal,
        );
        if let Err(e) = self.store.submit_score(&record) {
            warn!("could not submit score: {e}");
        }
        match self.store.increment_medal_count(&self.identity.uid, medal) {
            Ok(counts) => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.medals = counts;
                }
            }
            Err(e) => warn!("could not update medal count: {e}"),
        }
    }
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or(LOG_ENV, "info");
    let mut builder = env_logger::Builder::from_env(env);

    let file = AppDirs::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    match file {
        Some(f) => {
            builder.target(env_logger::Target::Pipe(Box::new(f)));
        }
        // a TUI owns the terminal, so no file means no logging
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn print_leaderboard<W: Write>(
    out: &mut W,
    store: &dyn ScoreStore,
    date: NaiveDate,
    limit: usize,
) -> Result<(), Box<dyn Error>> {
    let scores = store.query_top_scores(date, limit)?;
    writeln!(out, "Leaderboard for {}", long_date(date))?;
    if scores.is_empty() {
        writeln!(out, "No scores yet today. Be the first!")?;
        return Ok(());
    }
    writeln!(out, "{:>3}  {:<20} {:>6} {:>9}  Medal", "#", "Name", "Time", "Mistakes")?;
    for (i, s) in scores.iter().enumerate() {
        writeln!(
            out,
            "{:>3}  {:<20} {:>6} {:>9}  {}",
            i + 1,
            s.nickname,
            s.time_string,
            s.mistakes,
            s.medal.label()
        )?;
    }
    Ok(())
}

fn load_puzzle(cli: &Cli, config: &Config, date: NaiveDate) -> Result<PuzzleDay, Box<dyn Error>> {
    let book = match cli.puzzle_file.as_ref().or(config.puzzle_file.as_ref()) {
        Some(path) => PuzzleBook::from_path(path)?,
        None => PuzzleBook::bundled()?,
    };
    Ok(book.puzzle_for(date)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    let (uid, mut dirty) = config.ensure_player_id(&mut rand::thread_rng());
    if let Some(nickname) = &cli.nickname {
        config.nickname = Some(nickname.trim().to_string());
        dirty = true;
    }
    if dirty {
        if let Err(e) = config_store.save(&config) {
            warn!("could not save config: {e}");
        }
    }
    let identity = config.identity(uid);
    let settings = Settings::new(&cli, &config);
    let date = cli.date.unwrap_or_else(today);

    let store = match SqliteStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, format!("cannot open score store: {e}"))
                .exit();
        }
    };

    if !settings.guest {
        let result = match &cli.nickname {
            Some(nickname) => set_nickname(&store, &identity, nickname),
            None => ensure_profile(&store, &identity),
        };
        if let Err(e) = result {
            warn!("could not prepare profile: {e}");
        }
    }

    if cli.leaderboard {
        let mut stdout = io::stdout();
        return print_leaderboard(&mut stdout, &store, date, settings.leaderboard_limit);
    }

    let puzzle = match load_puzzle(&cli, &config, date) {
        Ok(p) => p,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        settings,
        identity,
        puzzle,
        Box::new(store),
        ResultsLog::new(),
        SystemClock::new(),
        StdRng::from_entropy(),
    );
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, C: Clock + Clone + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bennections::{
        medal::Medal,
        puzzle::GroupSpec,
        round::RoundStatus,
        runtime::ChannelEventSource,
        timer::ManualClock,
    };
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn settings(guest: bool) -> Settings {
        Settings {
            guest,
            leaderboard_limit: 20,
            resolve_delay: Duration::from_millis(700),
            message_clear: Duration::from_millis(1800),
            lose_face: Duration::from_millis(1800),
            reveal_stagger: Duration::from_millis(250),
        }
    }

    fn puzzle() -> PuzzleDay {
        PuzzleDay::new(
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            vec![
                GroupSpec::new("Rivers", 1, ["NILE", "AMAZON", "DANUBE", "THAMES"]),
                GroupSpec::new("Coffee", 2, ["LATTE", "MOCHA", "CORTADO", "AMERICANO"]),
                GroupSpec::new("Languages", 3, ["RUST", "PYTHON", "GO", "RUBY"]),
                GroupSpec::new("Gems", 4, ["OPAL", "JADE", "TOPAZ", "GARNET"]),
            ],
        )
        .unwrap()
    }

    struct Harness {
        app: App<ManualClock>,
        clock: ManualClock,
        _dir: TempDir,
    }

    fn harness(guest: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("scores.db")).unwrap();
        let identity = Identity {
            uid: "player1".into(),
            display_name: "Ada Lovelace".into(),
            email: None,
        };
        if !guest {
            ensure_profile(&store, &identity).unwrap();
        }
        let clock = ManualClock::new();
        let app = App::new(
            settings(guest),
            identity,
            puzzle(),
            Box::new(store),
            ResultsLog::with_path(dir.path().join("results.csv")),
            clock.clone(),
            StdRng::seed_from_u64(11),
        );
        Harness {
            app,
            clock,
            _dir: dir,
        }
    }

    /// Select `words` by walking the cursor to each one, then press Enter.
    fn play_guess(app: &mut App<ManualClock>, words: &[&str]) {
        app.on_key(key(KeyCode::Char('d')));
        for w in words {
            let idx = app
                .controller()
                .unwrap()
                .state()
                .board()
                .iter()
                .position(|b| b == w)
                .unwrap();
            app.cursor = idx;
            app.on_key(key(KeyCode::Char(' ')));
        }
        app.on_key(key(KeyCode::Enter));
    }

    fn settle(h: &mut Harness) {
        h.clock.advance(Duration::from_millis(700));
        h.app.on_tick();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["bennections"]);
        assert_eq!(cli.date, None);
        assert_eq!(cli.puzzle_file, None);
        assert_eq!(cli.nickname, None);
        assert!(!cli.guest);
        assert!(!cli.leaderboard);
        assert_eq!(cli.limit, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "bennections",
            "-d",
            "2026-10-13",
            "--puzzle-file",
            "p.json",
            "-n",
            "Ada",
            "--guest",
            "--leaderboard",
            "--limit",
            "5",
        ]);
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2026, 10, 13));
        assert_eq!(cli.puzzle_file, Some(PathBuf::from("p.json")));
        assert_eq!(cli.nickname.as_deref(), Some("Ada"));
        assert!(cli.guest);
        assert!(cli.leaderboard);
        assert_eq!(cli.limit, Some(5));
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["bennections", "--date", "14/10/2026"]).is_err());
    }

    #[test]
    fn test_settings_limit_override() {
        let config = Config::default();
        let cli = Cli::parse_from(["bennections"]);
        assert_eq!(Settings::new(&cli, &config).leaderboard_limit, 20);
        let cli = Cli::parse_from(["bennections", "--limit", "3"]);
        let s = Settings::new(&cli, &config);
        assert_eq!(s.leaderboard_limit, 3);
        assert_eq!(s.resolve_delay, Duration::from_millis(700));
        assert_eq!(s.lose_face, Duration::from_millis(1800));
    }

    #[test]
    fn test_start_screen_enter_begins_round() {
        let mut h = harness(false);
        assert_eq!(h.app.state, AppState::Start);
        assert!(h.app.controller().is_none());
        assert!(!h.app.on_key(key(KeyCode::Enter)));
        assert_eq!(h.app.state, AppState::Playing);
        assert_eq!(h.app.controller().unwrap().state().board().len(), 16);
    }

    #[test]
    fn test_escape_quits() {
        let mut h = harness(false);
        assert!(h.app.on_key(key(KeyCode::Esc)));
        assert!(h
            .app
            .on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_cursor_stays_on_grid() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        h.app.on_key(key(KeyCode::Left));
        h.app.on_key(key(KeyCode::Up));
        assert_eq!(h.app.cursor(), 0);
        for _ in 0..10 {
            h.app.on_key(key(KeyCode::Right));
            h.app.on_key(key(KeyCode::Down));
        }
        assert_eq!(h.app.cursor(), 15);
        h.app.on_key(key(KeyCode::Left));
        assert_eq!(h.app.cursor(), 14);
    }

    #[test]
    fn test_incomplete_submit_flashes_message() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        h.app.on_key(key(KeyCode::Char(' ')));
        h.app.on_key(key(KeyCode::Enter));
        assert_eq!(h.app.message(), Some("Select four words"));
        assert_eq!(h.app.controller().unwrap().state().mistakes_made(), 0);

        h.clock.advance(Duration::from_millis(1800));
        h.app.on_tick();
        assert_eq!(h.app.message(), None);
    }

    #[test]
    fn test_lock_released_after_delay() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        play_guess(&mut h.app, &["NILE", "AMAZON", "DANUBE", "RUST"]);
        assert_eq!(h.app.message(), Some("One away!"));
        assert!(h.app.controller().unwrap().is_resolving());

        h.clock.advance(Duration::from_millis(300));
        h.app.on_tick();
        assert!(h.app.controller().unwrap().is_resolving());
        h.clock.advance(Duration::from_millis(400));
        h.app.on_tick();
        assert!(!h.app.controller().unwrap().is_resolving());
    }

    #[test]
    fn test_duplicate_guess_message() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        play_guess(&mut h.app, &["NILE", "LATTE", "RUST", "OPAL"]);
        assert_eq!(h.app.message(), Some("Incorrect"));
        settle(&mut h);
        play_guess(&mut h.app, &["OPAL", "RUST", "LATTE", "NILE"]);
        assert_eq!(h.app.message(), Some("Already guessed!"));
        assert_eq!(h.app.controller().unwrap().state().mistakes_made(), 1);
    }

    #[test]
    fn test_win_records_score_and_medal() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        h.clock.advance_secs(42);
        for words in [
            ["NILE", "AMAZON", "DANUBE", "THAMES"],
            ["LATTE", "MOCHA", "CORTADO", "AMERICANO"],
            ["RUST", "PYTHON", "GO", "RUBY"],
            ["OPAL", "JADE", "TOPAZ", "GARNET"],
        ] {
            play_guess(&mut h.app, &words);
            settle(&mut h);
        }
        assert_eq!(h.app.state, AppState::Won);
        assert_eq!(h.app.controller().unwrap().medal(), Some(Medal::Gold));
        assert_eq!(h.app.profile.as_ref().unwrap().medals.gold, 1);

        let top = h
            .app
            .store
            .query_top_scores(h.app.puzzle.date(), 20)
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].nickname, "Ada");
        // 42s plus three 700ms lock windows
        assert_eq!(top[0].time_string, "00:44");

        let log = h.app.results_log.read_all().unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].won);

        h.app.on_key(key(KeyCode::Enter));
        assert_eq!(h.app.state, AppState::Start);
        assert_eq!(h.app.leaderboard.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_guest_win_records_nothing_remote() {
        let mut h = harness(true);
        h.app.on_key(key(KeyCode::Enter));
        for words in [
            ["NILE", "AMAZON", "DANUBE", "THAMES"],
            ["LATTE", "MOCHA", "CORTADO", "AMERICANO"],
            ["RUST", "PYTHON", "GO", "RUBY"],
            ["OPAL", "JADE", "TOPAZ", "GARNET"],
        ] {
            play_guess(&mut h.app, &words);
            settle(&mut h);
        }
        assert_eq!(h.app.state, AppState::Won);
        assert!(h
            .app
            .store
            .query_top_scores(h.app.puzzle.date(), 20)
            .unwrap()
            .is_empty());
        assert_eq!(h.app.results_log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_loss_reveals_groups_in_turn() {
        let mut h = harness(false);
        h.app.on_key(key(KeyCode::Enter));
        play_guess(&mut h.app, &["NILE", "AMAZON", "DANUBE", "THAMES"]);
        settle(&mut h);
        for words in [
            ["LATTE", "RUST", "OPAL", "MOCHA"],
            ["LATTE", "RUST", "OPAL", "PYTHON"],
            ["LATTE", "RUST", "OPAL", "JADE"],
            ["LATTE", "RUST", "OPAL", "GO"],
        ] {
            play_guess(&mut h.app, &words);
            settle(&mut h);
        }
        let c = h.app.controller().unwrap();
        assert_eq!(c.state().status(), RoundStatus::Lost);
        assert_eq!(h.app.state, AppState::Lost);
        assert_eq!(h.app.message(), Some("Game Over!"));
        assert!(c.state().selection().is_empty());
        // nothing revealed during the losing pause
        assert_eq!(h.app.revealed, 0);

        h.clock.advance(Duration::from_millis(1100));
        h.app.on_tick();
        assert_eq!(h.app.revealed, 1);
        h.clock.advance(Duration::from_millis(250));
        h.app.on_tick();
        assert_eq!(h.app.revealed, 2);
        h.clock.advance(Duration::from_secs(5));
        h.app.on_tick();
        assert_eq!(h.app.revealed, 3);
        assert_eq!(h.app.message(), Some("Game Over!"));
        assert!(h.app.store.query_top_scores(h.app.puzzle.date(), 20).unwrap().is_empty());
        assert!(!h.app.results_log.read_all().unwrap()[0].won);
    }

    #[test]
    fn test_print_leaderboard() {
        let store = SqliteStore::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let mut out = Vec::new();
        print_leaderboard(&mut out, &store, date, 20).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Wednesday, October 14, 2026"));
        assert!(text.contains("No scores yet today"));

        store
            .submit_score(&ScoreRecord::new("u", "Grace", 75, 1, date, Medal::Silver))
            .unwrap();
        let mut out = Vec::new();
        print_leaderboard(&mut out, &store, date, 20).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Grace"));
        assert!(text.contains("01:15"));
        assert!(text.contains("Silver"));
    }

    #[test]
    fn test_start_tui_quits_on_escape() {
        let mut h = harness(false);
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Key(key(KeyCode::Enter))).unwrap();
        tx.send(GameEvent::Tick).unwrap();
        tx.send(GameEvent::Key(key(KeyCode::Esc))).unwrap();
        let runner = Runner::new(ChannelEventSource::new(rx), Duration::from_millis(5));

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        start_tui(&mut terminal, &mut h.app, &runner).unwrap();
        assert_eq!(h.app.state, AppState::Playing);
    }
}
