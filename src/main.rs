//! OPTCG Forge - command line front end
//!
//! Validates card data, replays recorded action logs and prints the
//! sanitized view a client would receive.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use optcg_forge::{
    core::PlayerId,
    game::{
        compute_state_hash, format_hash, Action, GameEngine, GameSnapshot, GameState, GameView,
        RulesConfig, VerbosityLevel,
    },
    history,
    loader::{CardDatabase, DeckLoader, GameInitializer},
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "optcg")]
#[command(about = "OPTCG Forge - deterministic trading card game rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a card directory (or file) and report problems
    Validate {
        /// Card JSON file or directory of JSON files
        cards: PathBuf,

        /// Reject cards with unknown keywords
        #[arg(long)]
        strict: bool,
    },

    /// Replay an action log and print every outcome
    Replay {
        /// Card JSON file or directory
        #[arg(long)]
        cards: PathBuf,

        /// Deck list for player 1 (ignored with --from)
        #[arg(long, required_unless_present = "from")]
        deck1: Option<PathBuf>,

        /// Deck list for player 2 (ignored with --from)
        #[arg(long, required_unless_present = "from")]
        deck2: Option<PathBuf>,

        /// JSON array of actions to apply
        #[arg(long)]
        actions: PathBuf,

        /// Shuffle seed for a fresh game
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Start from a saved snapshot instead of fresh decks
        #[arg(long, value_name = "SNAPSHOT")]
        from: Option<PathBuf>,

        /// Rules configuration JSON (defaults otherwise)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Save the final state as a snapshot
        #[arg(long, value_name = "FILE")]
        snapshot: Option<PathBuf>,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityLevel,
    },

    /// Print one player's view of a snapshot as JSON
    View {
        /// Snapshot file
        #[arg(long)]
        snapshot: PathBuf,

        /// Viewing player index (0 or 1)
        #[arg(long, default_value_t = 0)]
        player: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { cards, strict } => run_validate(&cards, strict),
        Commands::Replay {
            cards,
            deck1,
            deck2,
            actions,
            seed,
            from,
            rules,
            snapshot,
            verbosity,
        } => {
            let config = match rules {
                Some(path) => RulesConfig::load_from_file(&path)
                    .with_context(|| format!("reading rules from {}", path.display()))?,
                None => RulesConfig::default(),
            };
            let db = CardDatabase::load_from_path(&cards, config.strict_keywords)
                .with_context(|| format!("loading cards from {}", cards.display()))?;

            let initial = match (from, deck1, deck2) {
                (Some(path), _, _) => {
                    let snapshot = GameSnapshot::load_from_file(&path)
                        .with_context(|| format!("loading snapshot {}", path.display()))?;
                    snapshot.game_state
                }
                (None, Some(deck1), Some(deck2)) => {
                    let deck1 = DeckLoader::load_from_file(&deck1)?;
                    let deck2 = DeckLoader::load_from_file(&deck2)?;
                    GameInitializer::with_config(&db, config)
                        .init_game("Player 1", &deck1, "Player 2", &deck2, seed)?
                }
                _ => bail!("either --from or both --deck1 and --deck2 are required"),
            };

            run_replay(&db, initial, &actions, verbosity, snapshot.as_deref(), seed)
        }
        Commands::View { snapshot, player } => {
            let snapshot = GameSnapshot::load_from_file(&snapshot)?;
            let view = GameView::for_player(&snapshot.game_state, PlayerId::new(player))?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
    }
}

fn run_validate(path: &Path, strict: bool) -> anyhow::Result<()> {
    let db = CardDatabase::load_from_path(path, strict)
        .with_context(|| format!("loading cards from {}", path.display()))?;

    println!("Loaded {} cards", db.len());
    let unknown = db.unknown_keywords();
    for (card, keywords) in &unknown {
        println!("  {card}: {}", keywords.join(", "));
    }
    if !unknown.is_empty() {
        println!("{} cards use keywords the engine does not know", unknown.len());
    }
    Ok(())
}

fn run_replay(
    db: &CardDatabase,
    mut initial: GameState,
    actions_path: &Path,
    verbosity: VerbosityLevel,
    save: Option<&Path>,
    seed: u64,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(actions_path)
        .with_context(|| format!("reading actions from {}", actions_path.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&json)?;
    initial.logger.set_verbosity(verbosity);

    let engine = GameEngine::new(db);
    let (state, outcomes) = history::replay(&engine, initial, &actions);

    for (i, (action, outcome)) in actions.iter().zip(&outcomes).enumerate() {
        println!(
            "{:>4} player {} {:<22} {}",
            i + 1,
            action.player,
            action.kind.name(),
            serde_json::to_string(outcome)?
        );
    }
    let rejected = outcomes.iter().filter(|o| !o.is_accepted()).count();
    println!(
        "turn {} phase {}  ({} actions, {} rejected)",
        state.turn,
        state.phase,
        outcomes.len(),
        rejected
    );
    if let Some(winner) = state.winner {
        println!("winner: player {winner}");
    }
    println!("state hash {}", format_hash(compute_state_hash(&state)));

    if let Some(path) = save {
        GameSnapshot::new(state, Some(seed)).save_to_file(path)?;
        println!("snapshot saved to {}", path.display());
    }
    Ok(())
}
