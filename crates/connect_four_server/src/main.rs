//! Connect Four - command-line front end
//!
//! Runs games against the in-memory service: AI-only simulations or a
//! human playing over stdin.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use connect_four::{Game, GameId, GameSnapshot, GameState, PlayerId, PlayerKind};
use connect_four_server::{GameService, MemoryStore, ServerConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?.with_seed(cli.seed);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log())),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut service = GameService::new(MemoryStore::new());
    if let Some(seed) = config.seed() {
        service = service.with_seed(*seed);
    }

    match cli.command {
        Command::Simulate { players, json } => run_simulation(&service, &config, players, json).await,
        Command::Play { name, opponents } => run_interactive(&service, &config, name, opponents).await,
    }
}

/// Plays an AI-only game to completion and prints every turn.
#[instrument(skip(service, config))]
async fn run_simulation(
    service: &GameService<MemoryStore>,
    config: &ServerConfig,
    players: usize,
    json: bool,
) -> Result<()> {
    if players < connect_four::MIN_PLAYERS {
        bail!("a game needs at least {} players", connect_four::MIN_PLAYERS);
    }

    let game = service.create_game(*config.width(), *config.height()).await?;
    let mut ids = Vec::with_capacity(players);
    for n in 1..=players {
        let player = service
            .create_player(format!("Bot {n}"), None, PlayerKind::Ai)
            .await?;
        ids.push(player.id().clone());
    }
    service.add_players(game.id(), &ids).await?;

    // AI players move inside start() until the game ends.
    let snapshot = service.start(game.id()).await?;
    info!(turns = snapshot.turns().len(), state = %snapshot.state(), "Simulation finished");

    let finished = Game::from_snapshot(snapshot.clone())?;
    for turn in snapshot.turns() {
        println!(
            "#{:<3} {} ({}) -> {}",
            turn.sequence_id(),
            turn.player_id(),
            finished.symbol_for(turn.player_id()),
            turn.location()
        );
    }
    println!();
    print!("{}", finished.render());
    println!("{}", outcome_line(&snapshot));

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

/// Lets a human play against AI opponents, one column per stdin line.
#[instrument(skip(service, config))]
async fn run_interactive(
    service: &GameService<MemoryStore>,
    config: &ServerConfig,
    name: String,
    opponents: usize,
) -> Result<()> {
    if opponents == 0 {
        bail!("play needs at least one opponent");
    }

    let game = service.create_game(*config.width(), *config.height()).await?;
    let human = service.create_player(&name, None, PlayerKind::Human).await?;
    let mut ids = vec![human.id().clone()];
    for n in 1..=opponents {
        let bot = service
            .create_player(format!("Bot {n}"), None, PlayerKind::Ai)
            .await?;
        ids.push(bot.id().clone());
    }
    service.add_players(game.id(), &ids).await?;
    service.start(game.id()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let snapshot = service.get_with_turns(game.id()).await?;
        print!("{}", Game::from_snapshot(snapshot.clone())?.render());
        if snapshot.state().is_finished() {
            println!("{}", outcome_line(&snapshot));
            return Ok(());
        }

        println!("{}, pick a column (0-{}):", name, config.width() - 1);
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            info!("Input closed, leaving game");
            return Ok(());
        };
        let Ok(column) = line.trim().parse::<usize>() else {
            println!("'{}' is not a column number", line.trim());
            continue;
        };

        if let Err(err) = play_turn(service, game.id(), human.id(), column).await {
            warn!(error = %err, "Move rejected");
            println!("{err}");
        }
    }
}

async fn play_turn(
    service: &GameService<MemoryStore>,
    game_id: &GameId,
    player_id: &PlayerId,
    column: usize,
) -> Result<()> {
    let outcome = service.drop_piece(game_id, player_id, column).await?;
    for turn in outcome.turns().iter().skip(1) {
        println!("{} dropped into column {}", turn.player_id(), turn.location().col);
    }
    Ok(())
}

fn outcome_line(snapshot: &GameSnapshot) -> String {
    match snapshot.state() {
        GameState::Won => match (snapshot.winner(), snapshot.winning_line()) {
            (Some(winner), Some(line)) => format!("{winner} wins with {line}"),
            _ => "game won".to_string(),
        },
        GameState::Tied => "tie game".to_string(),
        state => format!("game is {state}"),
    }
}
