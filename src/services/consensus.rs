use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::models::player::Seat;

/// Plurality pick over a nomination multiset. Candidates are visited in
/// ascending seat order and the leader only changes on a strictly greater
/// count, so ties go to the lowest seat.
pub fn plurality(nominations: &BTreeMap<Seat, usize>) -> Option<Seat> {
    let mut best: Option<Seat> = None;
    let mut best_count = 0;
    for (&candidate, &count) in nominations {
        if count > best_count {
            best_count = count;
            best = Some(candidate);
        }
    }
    best
}

#[derive(Debug, Default)]
struct Ballot {
    expected: BTreeSet<Seat>,
    submitted: BTreeSet<Seat>,
    deferring: BTreeSet<Seat>,
    nominations: BTreeMap<Seat, usize>,
    resolved: Option<Option<Seat>>,
}

impl Ballot {
    fn complete(&self) -> bool {
        self.expected.is_subset(&self.submitted)
    }

    fn settle(&mut self) {
        if self.resolved.is_none() && self.complete() {
            let target = plurality(&self.nominations);
            debug!(?target, nominations = ?self.nominations, "faction target resolved");
            self.resolved = Some(target);
        }
    }
}

/// The faction's nightly nomination round.
#[derive(Clone, Default)]
pub struct FactionConsensus {
    ballot: Arc<Mutex<Ballot>>,
    changed: Arc<Notify>,
}

impl FactionConsensus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a night's round expecting one nomination from each of `members`.
    pub async fn open(&self, members: BTreeSet<Seat>) {
        let mut ballot = self.ballot.lock().await;
        *ballot = Ballot {
            expected: members,
            ..Default::default()
        };
        ballot.settle();
        drop(ballot);
        self.changed.notify_waiters();
    }

    /// Records `member`'s nomination. `None` arrives without nominating.
    pub async fn nominate(&self, member: Seat, target: Option<Seat>) {
        let mut ballot = self.ballot.lock().await;
        if !ballot.expected.contains(&member) || !ballot.submitted.insert(member) {
            warn!(member, "nomination outside the open round ignored");
            return;
        }
        if let Some(target) = target {
            *ballot.nominations.entry(target).or_insert(0) += 1;
        }
        ballot.settle();
        drop(ballot);
        self.changed.notify_waiters();
    }

    /// Lets a member choose last: returns once every other expected member
    /// has nominated or is deferring too.
    pub async fn await_peers(&self, member: Seat) {
        {
            let mut ballot = self.ballot.lock().await;
            ballot.deferring.insert(member);
        }
        self.changed.notify_waiters();

        loop {
            let notified = self.changed.notified();
            {
                let ballot = self.ballot.lock().await;
                let settled = ballot
                    .expected
                    .iter()
                    .filter(|&&m| m != member)
                    .all(|m| ballot.submitted.contains(m) || ballot.deferring.contains(m));
                if settled {
                    return;
                }
            }
            notified.await;
        }
    }

    pub async fn tally(&self) -> BTreeMap<Seat, usize> {
        self.ballot.lock().await.nominations.clone()
    }

    /// Waits for the round to resolve and returns the agreed target.
    pub async fn target(&self) -> Option<Seat> {
        loop {
            let notified = self.changed.notified();
            if let Some(target) = self.ballot.lock().await.resolved {
                return target;
            }
            notified.await;
        }
    }

    pub async fn clear(&self) {
        *self.ballot.lock().await = Ballot::default();
    }
}
