use std::time::Duration;

use mafia::models::{GameConfig, GameResult, Narrator};
use mafia::services::{game_service, GameSetup};
use mafia::utils::test_setup::setup_test_env;

fn config_for(seed: u64) -> GameConfig {
    GameConfig {
        players: 6 + (seed % 9) as usize,
        divisor: 2 + (seed % 3) as usize,
        open_announcement: seed % 2 == 0,
        flavored_roles: seed % 5 == 0,
        seed: Some(seed),
        round_limit: Some(200),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn thousand_seeded_games_finish() {
    setup_test_env();

    for seed in 0..1000u64 {
        let config = config_for(seed);
        let setup = GameSetup::from_config(&config).unwrap();
        let report = tokio::time::timeout(
            Duration::from_secs(10),
            game_service::play(setup, Narrator::silent()),
        )
        .await
        .unwrap_or_else(|_| panic!("seed {} stalled with {:?}", seed, config))
        .unwrap_or_else(|e| panic!("seed {} failed: {}", seed, e));

        assert_ne!(report.result, GameResult::InProgress, "seed {}", seed);
        assert_eq!(report.roster.len(), config.players);
        assert!(report.days >= 1 && report.days <= 200);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_games_do_not_interfere() {
    setup_test_env();

    let games: Vec<_> = (0..16u64)
        .map(|seed| {
            let setup = GameSetup::from_config(&config_for(seed)).unwrap();
            tokio::spawn(game_service::play(setup, Narrator::silent()))
        })
        .collect();

    for (seed, game) in games.into_iter().enumerate() {
        let report = tokio::time::timeout(Duration::from_secs(10), game)
            .await
            .expect("game stalled")
            .unwrap()
            .unwrap();
        assert!(report.result.is_over(), "seed {}", seed);
    }
}
