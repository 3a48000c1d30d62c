use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Civilian,
    Doctor,
    Seer,
    Vigilante,
    Mafia(Flavor),
}

/// Flavor labels of the Mafia-aligned faction. They only change how a seat is
/// announced; every flavor plays the same faction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    Mafia,
    Killer,
    Ninja,
    Bull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Town,
    Mafia,
}

impl Role {
    pub fn faction(&self) -> Faction {
        match self {
            Role::Mafia(_) => Faction::Mafia,
            _ => Faction::Town,
        }
    }

    pub fn is_mafia(&self) -> bool {
        self.faction() == Faction::Mafia
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Civilian => write!(f, "Civilian"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Seer => write!(f, "Seer"),
            Role::Vigilante => write!(f, "Vigilante"),
            Role::Mafia(flavor) => write!(f, "{}", flavor),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Mafia => write!(f, "Mafia"),
            Flavor::Killer => write!(f, "Killer"),
            Flavor::Ninja => write!(f, "Ninja"),
            Flavor::Bull => write!(f, "Bull"),
        }
    }
}
