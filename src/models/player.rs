use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::config::ConfigError;
use super::role::Role;

/// Seat number of a participant, stable for the whole game.
pub type Seat = usize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Seat,
    pub role: Role,
}

impl Player {
    pub fn new(id: Seat, role: Role) -> Self {
        Self { id, role }
    }
}

/// Seating chart of a game. Built once from the dealt roles and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Player>,
    doctor: Seat,
    seer: Seat,
    vigilante: Seat,
    faction: BTreeSet<Seat>,
    civilians: BTreeSet<Seat>,
}

impl Roster {
    pub fn new(roles: Vec<Role>) -> Result<Self, ConfigError> {
        let players: Vec<Player> = roles
            .into_iter()
            .enumerate()
            .map(|(id, role)| Player::new(id, role))
            .collect();

        let doctor = single_holder(&players, Role::Doctor, "Doctor")?;
        let seer = single_holder(&players, Role::Seer, "Seer")?;
        let vigilante = single_holder(&players, Role::Vigilante, "Vigilante")?;

        let faction: BTreeSet<Seat> = players
            .iter()
            .filter(|p| p.role.is_mafia())
            .map(|p| p.id)
            .collect();
        if faction.is_empty() {
            return Err(ConfigError::RoleCount {
                role: "Mafia",
                count: 0,
            });
        }

        let civilians = players
            .iter()
            .filter(|p| p.role == Role::Civilian)
            .map(|p| p.id)
            .collect();

        Ok(Self {
            players,
            doctor,
            seer,
            vigilante,
            faction,
            civilians,
        })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn role_of(&self, seat: Seat) -> Option<Role> {
        self.players.get(seat).map(|p| p.role)
    }

    pub fn doctor(&self) -> Seat {
        self.doctor
    }

    pub fn seer(&self) -> Seat {
        self.seer
    }

    pub fn vigilante(&self) -> Seat {
        self.vigilante
    }

    pub fn faction(&self) -> &BTreeSet<Seat> {
        &self.faction
    }

    pub fn civilians(&self) -> &BTreeSet<Seat> {
        &self.civilians
    }

    pub fn is_faction(&self, seat: Seat) -> bool {
        self.faction.contains(&seat)
    }
}

fn single_holder(players: &[Player], role: Role, name: &'static str) -> Result<Seat, ConfigError> {
    let holders: Vec<Seat> = players
        .iter()
        .filter(|p| p.role == role)
        .map(|p| p.id)
        .collect();
    match holders.as_slice() {
        [seat] => Ok(*seat),
        _ => Err(ConfigError::RoleCount {
            role: name,
            count: holders.len(),
        }),
    }
}
