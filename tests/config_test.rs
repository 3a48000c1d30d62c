use serial_test::serial;
use std::env;

use mafia::models::{ConfigError, GameConfig};

const KEYS: [&str; 7] = [
    "MAFIA_PLAYERS",
    "MAFIA_DIVISOR",
    "MAFIA_HUMAN_SEAT",
    "MAFIA_OPEN_ANNOUNCEMENT",
    "MAFIA_FLAVORED_ROLES",
    "MAFIA_SEED",
    "MAFIA_ROUND_LIMIT",
];

fn clear_env() {
    for key in KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_without_environment() {
    clear_env();
    assert_eq!(GameConfig::from_env().unwrap(), GameConfig::default());
}

#[test]
#[serial]
fn reads_every_variable() {
    clear_env();
    env::set_var("MAFIA_PLAYERS", "12");
    env::set_var("MAFIA_DIVISOR", "4");
    env::set_var("MAFIA_HUMAN_SEAT", "true");
    env::set_var("MAFIA_OPEN_ANNOUNCEMENT", "true");
    env::set_var("MAFIA_FLAVORED_ROLES", "false");
    env::set_var("MAFIA_SEED", "99");
    env::set_var("MAFIA_ROUND_LIMIT", "30");

    let config = GameConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.players, 12);
    assert_eq!(config.divisor, 4);
    assert_eq!(config.faction_size(), 3);
    assert!(config.human_seat);
    assert!(config.open_announcement);
    assert!(!config.flavored_roles);
    assert_eq!(config.seed, Some(99));
    assert_eq!(config.round_limit, Some(30));
}

#[test]
#[serial]
fn malformed_number_is_rejected() {
    clear_env();
    env::set_var("MAFIA_PLAYERS", "many");
    let err = GameConfig::from_env().unwrap_err();
    clear_env();
    assert_eq!(
        err,
        ConfigError::InvalidValue {
            key: "MAFIA_PLAYERS",
            value: "many".to_string(),
        }
    );
}

#[test]
#[serial]
fn empty_faction_from_environment_fails_validation() {
    clear_env();
    env::set_var("MAFIA_PLAYERS", "7");
    env::set_var("MAFIA_DIVISOR", "8");
    let config = GameConfig::from_env().unwrap();
    clear_env();
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::EmptyFaction {
            players: 7,
            divisor: 8,
        }
    );
}
