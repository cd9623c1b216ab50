//! Table simulator - plays one game with scripted bots through the registry
//! and prints every published event as a JSON line.
//!
//! Usage: cargo run -p xidach-table --bin xidach-sim -- --players 3 --seed 42

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use xidach_engine::hand::Decision;
use xidach_engine::resolver::PLAYER_MIN_SCORE;
use xidach_engine::scoring::FIVE_CARD_HAND;
use xidach_table::settings;
use xidach_table::{
    ActorId, ChannelKey, EventSubscription, SessionRegistry, SessionState, TableAction,
    TableRequest,
};

const SIM_CHANNEL: ChannelKey = 1;
const FIRST_BOT: ActorId = 1000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play one Xì Dách table with scripted bots")]
struct Args {
    /// Number of bot players (1-5)
    #[arg(short, long, default_value_t = 3)]
    players: usize,

    /// Shuffle seed; overrides the settings file and XIDACH_SEED
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML settings file; otherwise XIDACH_CONFIG is used if set
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bots keep hitting while their score is below this
    #[arg(long, default_value_t = PLAYER_MIN_SCORE)]
    hit_below: u32,

    /// Emit logs as JSON instead of plain text
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let resolved = match &args.config {
        Some(path) => settings::load_from_file(path)?,
        None => settings::load_with_sources()?,
    };
    let mut settings = resolved.settings;
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if args.players == 0 || args.players > settings.max_participants {
        return Err(format!(
            "--players must be between 1 and {}",
            settings.max_participants
        )
        .into());
    }

    xidach_table::init_logging(&settings.log_filter, args.json_logs)?;
    tracing::info!(
        players = args.players,
        seed = ?settings.seed,
        seed_source = ?resolved.sources.seed,
        hit_below = args.hit_below,
        "starting simulation"
    );

    let registry = SessionRegistry::new(settings);
    let mut events = registry.event_bus().subscribe(SIM_CHANNEL);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let bots: Vec<ActorId> = (0..args.players as u64).map(|i| FIRST_BOT + i).collect();
    let mut send = |caller: ActorId, action: TableAction| -> Result<(), Box<dyn std::error::Error>> {
        // rejections are published too, so the error itself is only logged
        if let Err(err) = registry.handle(TableRequest::new(SIM_CHANNEL, caller, action)) {
            tracing::warn!(actor = caller, error = %err, "bot request rejected");
        }
        print_events(&mut out, &mut events)
    };

    send(bots[0], TableAction::NewGame)?;
    for &bot in &bots {
        send(bot, TableAction::Join)?;
    }
    for &bot in &bots {
        send(bot, TableAction::StartVote)?;
    }

    let session = registry
        .lookup(SIM_CHANNEL)
        .ok_or("simulation table disappeared")?;
    let Some(game_id) = session.game_id()? else {
        return Err("game was not dealt".into());
    };

    for &bot in &bots {
        if session.state()? != SessionState::PlayerTurns {
            break;
        }
        send(bot, TableAction::Draw { actor: bot, game_id })?;
        loop {
            let snapshot = session.snapshot()?;
            let Some(hand) = snapshot.hand(bot) else { break };
            if hand.decision == Decision::Stood {
                break;
            }
            if hand.score < args.hit_below && hand.cards.len() < FIVE_CARD_HAND {
                send(bot, TableAction::Hit { actor: bot, game_id })?;
            } else {
                send(bot, TableAction::Stand { actor: bot, game_id })?;
                break;
            }
        }
    }

    let snapshot = session.snapshot()?;
    tracing::info!(
        state = snapshot.state.as_str(),
        winner = ?snapshot.settlement.as_ref().and_then(|s| s.winner),
        "simulation finished"
    );
    Ok(())
}

fn print_events(
    out: &mut impl Write,
    events: &mut EventSubscription,
) -> Result<(), Box<dyn std::error::Error>> {
    for event in events.drain() {
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(())
}
