use anyhow::Context;
use dotenvy::dotenv;
use env_logger::Builder;
use log::LevelFilter;
use structopt::StructOpt;
use tokio::io::BufReader;

use mafia::models::{Audience, GameConfig, Narration, Narrator, Opt};
use mafia::services::{play, GameSetup};

fn init_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

fn visible(narration: &Narration, human: Option<usize>, human_in_faction: bool) -> bool {
    match narration.audience {
        Audience::Public => true,
        Audience::Private(seat) => Some(seat) == human,
        Audience::Faction => human_in_faction,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenv() {
        log::debug!("no .env file loaded: {}", e);
    }
    init_logger();

    let opt = Opt::from_args();
    let config = opt.apply(GameConfig::from_env().context("reading configuration")?);
    let mut setup = GameSetup::from_config(&config).context("refusing to start the game")?;

    let (narrator, mut rx) = Narrator::channel();
    let human = if config.human_seat {
        setup.install_console(BufReader::new(tokio::io::stdin()), &narrator)
    } else {
        None
    };

    let human_in_faction = human.map_or(false, |seat| setup.roster().is_faction(seat));
    let json = opt.json;
    let printer = tokio::spawn(async move {
        while let Some(narration) = rx.recv().await {
            if !visible(&narration, human, human_in_faction) {
                continue;
            }
            if json {
                match serde_json::to_string(&narration) {
                    Ok(line) => println!("{}", line),
                    Err(e) => log::warn!("failed to encode narration: {}", e),
                }
            } else {
                println!("{}\n", narration.event);
            }
        }
    });

    let report = play(setup, narrator).await;
    printer.await.context("narration printer failed")?;
    let report = report.context("game aborted")?;
    log::info!(
        "game {} finished on day {}: {}",
        report.game_id,
        report.days,
        report.result
    );
    Ok(())
}
