use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::player::Seat;

/// Liveness vector of the table. Its length is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liveness(Vec<bool>);

impl Liveness {
    pub fn new(players: usize) -> Self {
        Liveness(vec![true; players])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_alive(&self, seat: Seat) -> bool {
        self.0.get(seat).copied().unwrap_or(false)
    }

    // Only the controller mutates liveness, inside GameState::resolve.
    pub(crate) fn set_alive(&mut self, seat: Seat, alive: bool) {
        if let Some(slot) = self.0.get_mut(seat) {
            *slot = alive;
        }
    }

    pub fn living_count(&self, seats: &BTreeSet<Seat>) -> usize {
        seats.iter().filter(|&&s| self.is_alive(s)).count()
    }

    pub fn living(&self) -> BTreeSet<Seat> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(seat, _)| seat)
            .collect()
    }
}

impl From<Vec<bool>> for Liveness {
    fn from(alive: Vec<bool>) -> Self {
        Liveness(alive)
    }
}

/// Day ballots, one slot per seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLedger(Vec<Option<Seat>>);

impl VoteLedger {
    pub fn new(players: usize) -> Self {
        VoteLedger(vec![None; players])
    }

    pub fn cast(&mut self, voter: Seat, target: Seat) {
        if let Some(slot) = self.0.get_mut(voter) {
            *slot = Some(target);
        }
    }

    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn ballots(&self) -> &[Option<Seat>] {
        &self.0
    }
}

/// State shared between the controller and every participant task.
#[derive(Clone)]
pub struct GameState {
    liveness: Arc<Mutex<Liveness>>,
    ledger: Arc<Mutex<VoteLedger>>,
}

impl GameState {
    pub fn new(players: usize) -> Self {
        GameState {
            liveness: Arc::new(Mutex::new(Liveness::new(players))),
            ledger: Arc::new(Mutex::new(VoteLedger::new(players))),
        }
    }

    pub async fn living(&self) -> BTreeSet<Seat> {
        self.liveness.lock().await.living()
    }

    /// Runs one resolution step with the liveness lock held for its whole
    /// duration, so nobody sees a half-applied result.
    pub(crate) async fn resolve<F, R>(&self, step: F) -> R
    where
        F: FnOnce(&mut Liveness) -> R,
    {
        let mut liveness = self.liveness.lock().await;
        step(&mut liveness)
    }

    pub async fn cast_ballot(&self, voter: Seat, target: Seat) {
        self.ledger.lock().await.cast(voter, target);
    }

    pub async fn ballots(&self) -> Vec<Option<Seat>> {
        self.ledger.lock().await.ballots().to_vec()
    }

    pub(crate) async fn clear_ballots(&self) {
        self.ledger.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_applies_in_one_step() {
        let state = GameState::new(6);
        let live_faction = state
            .resolve(|l| {
                l.set_alive(1, false);
                l.set_alive(4, false);
                l.living_count(&BTreeSet::from([1, 3, 4]))
            })
            .await;
        assert_eq!(live_faction, 1);
        assert_eq!(state.living().await, BTreeSet::from([0, 2, 3, 5]));
    }

    #[tokio::test]
    async fn ledger_resets_between_days() {
        let state = GameState::new(6);
        state.cast_ballot(0, 3).await;
        state.cast_ballot(2, 3).await;
        assert_eq!(state.ballots().await[0], Some(3));
        state.clear_ballots().await;
        assert!(state.ballots().await.iter().all(Option::is_none));
    }

    #[test]
    fn out_of_range_seat_is_dead() {
        let liveness = Liveness::new(3);
        assert!(!liveness.is_alive(7));
    }
}
