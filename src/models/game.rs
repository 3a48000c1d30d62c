use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::player::Seat;
use crate::state::Liveness;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    Waiting,      // before the first night
    Night,        // night actions
    NightResolve, // reacting to night results
    Day,          // voting
    DayResolve,   // reacting to the elimination
    End,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameResult {
    InProgress,
    TownWin,
    MafiaWin,
    VigilanteWin,
}

impl GameResult {
    pub fn is_over(&self) -> bool {
        *self != GameResult::InProgress
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::InProgress => write!(f, "Game in progress"),
            GameResult::TownWin => write!(f, "Civilian win"),
            GameResult::MafiaWin => write!(f, "Mafia win"),
            GameResult::VigilanteWin => write!(f, "Vigilante win"),
        }
    }
}

/// What the roles asked for during one night.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NightActions {
    pub vigilante: Option<Seat>,
    pub faction: Option<Seat>,
    pub seer: Option<Seat>,
    pub doctor: Option<Seat>,
}

impl NightActions {
    /// Kills first, in role order, then the doctor's save. The save always
    /// leaves its target alive, attacked or not.
    pub fn apply(&self, liveness: &mut Liveness) {
        for target in [self.vigilante, self.faction, self.seer].into_iter().flatten() {
            liveness.set_alive(target, false);
        }
        if let Some(saved) = self.doctor {
            liveness.set_alive(saved, true);
        }
    }

    /// Distinct victims of the night, excluding the saved seat.
    pub fn casualties(&self) -> BTreeSet<Seat> {
        let mut killed: BTreeSet<Seat> = [self.vigilante, self.faction, self.seer]
            .into_iter()
            .flatten()
            .collect();
        if let Some(saved) = self.doctor {
            killed.remove(&saved);
        }
        killed
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum NightReport {
    Attributed(NightActions),
    Anonymous(Vec<Seat>),
}

impl NightReport {
    pub fn new(actions: &NightActions, open_announcement: bool) -> Self {
        if open_announcement {
            NightReport::Attributed(actions.clone())
        } else {
            NightReport::Anonymous(actions.casualties().into_iter().collect())
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    Eliminated(Seat),
    NoElimination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_overrides_same_night_kill() {
        let mut liveness = Liveness::new(6);
        let actions = NightActions {
            vigilante: Some(5),
            faction: Some(5),
            seer: None,
            doctor: Some(5),
        };
        actions.apply(&mut liveness);
        assert!(liveness.is_alive(5));
        assert!(actions.casualties().is_empty());
    }

    #[test]
    fn save_guarantees_even_without_attack() {
        let mut liveness = Liveness::from(vec![true, true, false, true, true, true]);
        let actions = NightActions {
            doctor: Some(2),
            faction: Some(4),
            ..Default::default()
        };
        actions.apply(&mut liveness);
        assert!(liveness.is_alive(2));
        assert!(!liveness.is_alive(4));
    }

    #[test]
    fn anonymous_report_deduplicates() {
        let actions = NightActions {
            vigilante: Some(3),
            faction: Some(3),
            seer: Some(1),
            doctor: Some(0),
        };
        assert_eq!(
            NightReport::new(&actions, false),
            NightReport::Anonymous(vec![1, 3])
        );
    }
}
