use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::game::DayOutcome;
use crate::models::player::Seat;

/// One day's vote count as (count, candidate) pairs, highest count first and
/// higher seat first within a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    entries: Vec<(usize, Seat)>,
}

impl VoteTally {
    /// Counts the ballots of `voters` only; slots of anyone else are ignored.
    pub fn from_ballots(ballots: &[Option<Seat>], voters: &BTreeSet<Seat>) -> Self {
        let mut counts: BTreeMap<Seat, usize> = BTreeMap::new();
        for &voter in voters {
            if let Some(Some(target)) = ballots.get(voter) {
                *counts.entry(*target).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<(usize, Seat)> = counts
            .into_iter()
            .map(|(seat, count)| (count, seat))
            .collect();
        entries.sort_unstable_by(|a, b| b.cmp(a));
        VoteTally { entries }
    }

    pub fn entries(&self) -> &[(usize, Seat)] {
        &self.entries
    }

    /// The top tie group.
    pub fn leaders(&self) -> &[(usize, Seat)] {
        let Some(&(top, _)) = self.entries.first() else {
            return &[];
        };
        let r = self.entries.iter().take_while(|(count, _)| *count == top).count();
        &self.entries[..r]
    }

    /// A clear leader is eliminated. A tie flips a fair coin: heads picks one
    /// of the tied seats uniformly, tails spares everyone.
    pub fn decide<R: Rng + ?Sized>(&self, rng: &mut R) -> DayOutcome {
        match self.leaders() {
            [] => DayOutcome::NoElimination,
            [(_, seat)] => DayOutcome::Eliminated(*seat),
            tied => {
                if rng.gen_bool(0.5) {
                    let (_, seat) = tied[rng.gen_range(0..tied.len())];
                    DayOutcome::Eliminated(seat)
                } else {
                    DayOutcome::NoElimination
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn counts_only_listed_voters() {
        let ballots = vec![Some(3), Some(3), None, Some(1), Some(3), Some(1)];
        let voters = BTreeSet::from([0, 1, 3, 5]);
        let tally = VoteTally::from_ballots(&ballots, &voters);
        assert_eq!(tally.entries(), &[(2, 3), (2, 1)]);
        assert_eq!(tally.leaders().len(), 2);
    }

    #[test]
    fn clear_leader_is_always_eliminated() {
        let ballots = vec![Some(2), Some(2), Some(0), Some(2)];
        let voters = BTreeSet::from([0, 1, 2, 3]);
        let tally = VoteTally::from_ballots(&ballots, &voters);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(tally.decide(&mut rng), DayOutcome::Eliminated(2));
        }
    }

    #[test]
    fn empty_ledger_spares_everyone() {
        let tally = VoteTally::from_ballots(&[None, None], &BTreeSet::from([0, 1]));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(tally.leaders().is_empty());
        assert_eq!(tally.decide(&mut rng), DayOutcome::NoElimination);
    }

    #[test]
    fn two_way_tie_is_a_fair_coin_then_a_fair_pick() {
        let ballots = vec![Some(1), Some(0), Some(0), Some(1)];
        let voters = BTreeSet::from([0, 1, 2, 3]);
        let tally = VoteTally::from_ballots(&ballots, &voters);
        let mut rng = StdRng::seed_from_u64(2024);

        let trials = 20_000;
        let mut spared = 0;
        let mut picked = [0usize; 2];
        for _ in 0..trials {
            match tally.decide(&mut rng) {
                DayOutcome::NoElimination => spared += 1,
                DayOutcome::Eliminated(seat) => picked[seat] += 1,
            }
        }

        let spared_ratio = spared as f64 / trials as f64;
        assert!((spared_ratio - 0.5).abs() < 0.03, "spared ratio {}", spared_ratio);
        let eliminated = (trials - spared) as f64;
        let first_ratio = picked[0] as f64 / eliminated;
        assert!((first_ratio - 0.5).abs() < 0.03, "pick ratio {}", first_ratio);
    }
}
