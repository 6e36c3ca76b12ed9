use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use ratatui::DefaultTerminal;

use games::connect4::{self, GameState, Outcome, Side};
use tui::InteractiveApp;

mod games;
mod snapshot;
mod tui;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    // Picked from the OS when missing
    #[arg(long, global = true, help = "Seed for the opponent's moves")]
    seed: Option<u64>,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the snapshot of a fresh game")]
    New,
    #[command(about = "Play one turn against a snapshot and print the next one")]
    Turn {
        // A fresh game when left out
        #[arg(short, long, help = "Previous snapshot, `-` for stdin")]
        state: Option<PathBuf>,
        #[arg(allow_hyphen_values = true, help = "Column typed by the player, 1 to 7")]
        input: String,
    },
    Interactive,
    Simulate {
        #[arg(short)]
        log_file: PathBuf,
        #[arg(short, default_value_t = 100)]
        n_games: usize,
    },
}

// What a single stateless request gets back
#[derive(Debug, serde::Serialize)]
struct TurnResponse {
    outcome: Outcome,
    message: &'static str,
    board: String,
    state: GameState,
}

// One turn in the simulation log. The state is the serialized snapshot after
// the turn.
#[derive(Debug, Clone, serde::Serialize)]
struct PlayLogPly {
    game_id: usize,
    ply_id: i32,
    input: String,
    outcome: Option<Outcome>,
    state: String,
}

type PlayLog = Vec<PlayLogPly>;

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn read_snapshot(path: &Path) -> Result<GameState> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw).context("Failed to read snapshot from stdin")?;
        raw
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?
    };

    snapshot::decode(&raw)
}

fn run_new() -> Result<()> {
    println!("{}", snapshot::encode(&connect4::new_game())?);
    Ok(())
}

fn run_turn(state_file: Option<&Path>, input: &str, rng: &mut StdRng) -> Result<()> {
    let previous = state_file.map(read_snapshot).transpose()?;
    let (state, outcome) = connect4::take_turn(previous, input, rng);
    log::info!("Input {:?} gave {:?}", input, outcome);

    let response = TurnResponse {
        outcome,
        message: outcome.message(),
        board: state.board.to_string(),
        state,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn write_play_log(play_log: &PlayLog, file: &Path) -> Result<()> {
    let file = File::create(file).with_context(|| format!("Failed to create {}", file.display()))?;
    let mut writer = BufWriter::new(file);
    for item in play_log {
        jsonl::write(&mut writer, item).map_err(|err| anyhow!("Failed to write play log: {}", err))?;
    }
    Ok(())
}

fn report(results: &[Option<Side>]) {
    let total_games = results.len();
    let count = |wanted: Option<Side>| results.iter().filter(|&&winner| winner == wanted).count();

    for (name, wanted) in [("Player", Some(Side::Player)), ("Opponent", Some(Side::Opponent)), ("Draw", None)] {
        let n = count(wanted);
        println!("{}: {}/{}, ratio: {}", name, n, total_games, n as f64 / total_games.max(1) as f64);
    }
}

// Both sides pick random columns. The player side still goes through the text
// input, so every game exercises the same path as a real request.
fn simulate_game(game_id: usize, rng: &mut StdRng) -> Result<(Option<Side>, PlayLog)> {
    let mut state = connect4::new_game();
    let mut plies = vec![PlayLogPly {
        game_id,
        ply_id: -1,
        input: "init".to_string(),
        outcome: None,
        state: snapshot::encode(&state)?,
    }];

    let mut ply_id: i32 = 0;
    while let Some(column) = connect4::play_random(&state.board, rng) {
        let input = (column + 1).to_string();
        let (next, outcome) = connect4::take_turn(Some(state), &input, rng);
        state = next;

        plies.push(PlayLogPly {
            game_id,
            ply_id,
            input,
            outcome: Some(outcome),
            state: snapshot::encode(&state)?,
        });
        ply_id += 1;

        if state.is_terminal() {
            break;
        }
    }

    log::info!("Game {} over after {} turns, winner: {:?}", game_id, ply_id, state.winner);
    Ok((state.winner, plies))
}

fn simulate(log_file: &Path, n_games: usize, seed: Option<u64>) -> Result<()> {
    log::info!("Running {} simulations", n_games);

    let games: Vec<(Option<Side>, PlayLog)> = (0..n_games)
        .into_par_iter()
        .map(|game_id| {
            let mut rng = make_rng(seed.map(|seed| seed.wrapping_add(game_id as u64)));
            simulate_game(game_id, &mut rng)
        })
        .collect::<Result<_>>()?;

    let results: Vec<Option<Side>> = games.iter().map(|(winner, _)| *winner).collect();
    report(&results);

    let play_log: PlayLog = games.into_iter().flat_map(|(_, plies)| plies).collect();
    write_play_log(&play_log, log_file)
}

fn interactive_loop(terminal: &mut DefaultTerminal, rng: &mut StdRng) -> Result<()> {
    let mut app = InteractiveApp::new();

    loop {
        terminal.draw(|frame| {
            frame.render_widget(app.clone(), frame.area());
        })?;

        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        match key_event.code {
            KeyCode::Esc => break,
            KeyCode::Char('n') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                app = InteractiveApp::new();
            },
            KeyCode::Enter if app.state.is_terminal() => {
                app = InteractiveApp::new();
            },
            KeyCode::Enter => {
                let (state, outcome) = connect4::take_turn(Some(app.state), &app.input, rng);
                log::debug!("Input {:?} gave {:?}", app.input, outcome);

                if matches!(outcome, Outcome::Continue | Outcome::Won(_) | Outcome::Drawn) {
                    app.turns += 1;
                }
                app.state = state;
                app.last_outcome = Some(outcome);
                app.input.clear();
            },
            KeyCode::Backspace => {
                app.input.pop();
            },
            KeyCode::Char(c) if !app.state.is_terminal() => {
                app.input.push(c);
            },
            _ => {}
        }
    }

    Ok(())
}

fn run_interactive(rng: &mut StdRng) -> Result<()> {
    color_eyre::install().map_err(|err| anyhow!("Failed to install error hooks: {}", err))?;
    let mut terminal = ratatui::init();
    let result = interactive_loop(&mut terminal, rng);
    ratatui::restore();
    result
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = make_rng(args.seed);

    match args.commands {
        Commands::New => run_new(),
        Commands::Turn { state, input } => run_turn(state.as_deref(), &input, &mut rng),
        Commands::Interactive => run_interactive(&mut rng),
        Commands::Simulate { log_file, n_games } => simulate(&log_file, n_games, args.seed),
    }
}
