use rand::seq::SliceRandom;
use rand::Rng;

use super::config::{ConfigError, GameConfig};
use super::role::{Flavor, Role};

pub const MIN_PLAYERS: usize = 6;
pub const MIN_DIVISOR: usize = 2;

// Flavored tables hand these out before falling back to plain Mafia.
const FLAVORS: [Flavor; 3] = [Flavor::Killer, Flavor::Ninja, Flavor::Bull];

/// Validated role balance of a game: one Doctor, one Seer, one Vigilante,
/// `faction_size` Mafia-aligned seats and Civilians for the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    pub players: usize,
    pub faction_size: usize,
    pub flavored: bool,
}

impl RoleTable {
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        if config.players < MIN_PLAYERS {
            return Err(ConfigError::TooFewPlayers {
                players: config.players,
                minimum: MIN_PLAYERS,
            });
        }
        if config.divisor < MIN_DIVISOR {
            return Err(ConfigError::DivisorTooSmall {
                divisor: config.divisor,
                minimum: MIN_DIVISOR,
            });
        }

        let faction_size = config.faction_size();
        if faction_size == 0 {
            return Err(ConfigError::EmptyFaction {
                players: config.players,
                divisor: config.divisor,
            });
        }

        Ok(Self {
            players: config.players,
            faction_size,
            flavored: config.flavored_roles,
        })
    }

    pub fn civilians(&self) -> usize {
        self.players - 3 - self.faction_size
    }

    /// Role multiset in canonical order, before shuffling.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = Vec::with_capacity(self.players);
        roles.extend([Role::Doctor, Role::Seer, Role::Vigilante]);

        for i in 0..self.faction_size {
            let flavor = match FLAVORS.get(i) {
                Some(flavor) if self.flavored => *flavor,
                _ => Flavor::Mafia,
            };
            roles.push(Role::Mafia(flavor));
        }

        roles.resize(self.players, Role::Civilian);
        roles
    }

    pub fn deal<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Role> {
        let mut roles = self.roles();
        roles.shuffle(rng);
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(players: usize, divisor: usize) -> GameConfig {
        GameConfig {
            players,
            divisor,
            ..Default::default()
        }
    }

    #[test]
    fn rejects_empty_faction() {
        let err = RoleTable::from_config(&config(7, 8)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyFaction {
                players: 7,
                divisor: 8
            }
        );
    }

    #[test]
    fn rejects_small_games() {
        assert!(matches!(
            RoleTable::from_config(&config(5, 2)),
            Err(ConfigError::TooFewPlayers { players: 5, .. })
        ));
        assert!(matches!(
            RoleTable::from_config(&config(6, 1)),
            Err(ConfigError::DivisorTooSmall { divisor: 1, .. })
        ));
    }

    #[test]
    fn flavored_table_hands_out_flavors_first() {
        let mut cfg = config(12, 3);
        cfg.flavored_roles = true;
        let table = RoleTable::from_config(&cfg).unwrap();
        let faction: Vec<Role> = table.roles().into_iter().filter(Role::is_mafia).collect();
        assert_eq!(
            faction,
            vec![
                Role::Mafia(Flavor::Killer),
                Role::Mafia(Flavor::Ninja),
                Role::Mafia(Flavor::Bull),
                Role::Mafia(Flavor::Mafia),
            ]
        );
    }

    #[test]
    fn deal_is_a_permutation() {
        let table = RoleTable::from_config(&config(10, 2)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut dealt = table.deal(&mut rng);
        let mut canonical = table.roles();
        let key = |r: &Role| format!("{:?}", r);
        dealt.sort_by_key(key);
        canonical.sort_by_key(key);
        assert_eq!(dealt, canonical);
        assert_eq!(table.civilians(), 2);
    }
}
