use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info};

use isolation::board::Board;
use isolation::config::{Config, HeuristicKind, SearchVariant};
use isolation::matches::{self, Contender, MatchSettings};
use isolation::{Agent, Error, Result};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON file with engine settings; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    search: Option<SearchVariant>,
    #[arg(long, global = true)]
    heuristic: Option<HeuristicKind>,
    #[arg(long, global = true)]
    area_depth: Option<usize>,
    #[arg(long, global = true)]
    area_cap: Option<usize>,
    #[arg(long, global = true)]
    max_depth: Option<usize>,
    /// Milliseconds per move
    #[arg(long, global = true, default_value_t = 150)]
    time_limit: u64,
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play two agents against each other, alternating who moves first
    Play {
        #[arg(long, default_value = "alphabeta:area")]
        agent: String,
        #[arg(long, default_value = "alphabeta:liberties")]
        opponent: String,
        #[arg(long, default_value_t = 10)]
        rounds: usize,
        /// Summarize every N games
        #[arg(long, default_value_t = 10)]
        frequency: usize,
        /// Write every game to this JSON file
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Pick a move for the side to move in a saved position
    Analyze {
        position: PathBuf,
    },
}

impl Args {
    fn base_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(search) = self.search {
            config.search = search;
        }
        if let Some(heuristic) = self.heuristic {
            config.heuristic = heuristic;
        }
        if let Some(depth) = self.area_depth {
            config.area_depth = depth;
        }
        if let Some(cap) = self.area_cap {
            config.area_cap = cap;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let level = if args.verbose { log::Level::Debug } else { log::Level::Info };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("failed to initialize logger: {}", e);
    }

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let base = args.base_config()?;
    let time_limit = Duration::from_millis(args.time_limit);

    match &args.command {
        Command::Play { agent, opponent, rounds, frequency, record } => {
            let contenders = [Contender::parse(agent, &base)?, Contender::parse(opponent, &base)?];
            let settings = MatchSettings { rounds: *rounds, time_limit, frequency: *frequency };
            let (stats, records) = matches::play_match(contenders, &settings).await?;
            info!("{} won {} of {} games", stats.contender(), stats.wins(), stats.games());
            if let Some(path) = record {
                matches::write_records(path, &records)?;
                info!("Wrote {} games to {}", records.len(), path.display());
            }
        }
        Command::Analyze { position } => {
            let json = std::fs::read_to_string(position).map_err(|source| Error::Io {
                operation: format!("read position {}", position.display()),
                source,
            })?;
            let board: Board = serde_json::from_str(&json)?;
            println!("{}", board);

            let agent = Arc::new(Mutex::new(Agent::new(base)?));
            let decision = matches::timed_decision(agent, board, time_limit).await?;
            let action = decision.action.ok_or(Error::NoLegalMoves)?;
            info!("depth {} score {:?} nodes {}", decision.report.depth, decision.report.score, decision.report.nodes);
            println!("{}", serde_json::to_string(&action)?);
        }
    }
    Ok(())
}
