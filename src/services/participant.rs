use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

use super::consensus::FactionConsensus;
use super::error::EngineError;
use super::rendezvous::{Attendance, RoleLink};
use super::strategy::{Choice, ChoiceKind, DecisionSource, Observation, SeerMove};
use crate::models::game::GamePhase;
use crate::models::player::Seat;
use crate::models::role::Role;
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeerQuery {
    Kill(Seat),
    Check(Seat),
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeerReply {
    Acknowledged,
    Checked { is_mafia: bool },
}

/// Per-role state and the channel the role talks to the controller through.
pub enum RoleKit {
    Civilian,
    Doctor {
        link: RoleLink<Option<Seat>, ()>,
        last_saved: Option<Seat>,
    },
    Seer {
        link: RoleLink<SeerQuery, SeerReply>,
        // confirmed faction members, oldest first
        suspects: VecDeque<Seat>,
        checked: BTreeSet<Seat>,
    },
    Vigilante {
        link: RoleLink<Option<Seat>, ()>,
    },
    Faction {
        consensus: FactionConsensus,
        members: BTreeSet<Seat>,
    },
}

impl RoleKit {
    pub fn seer(link: RoleLink<SeerQuery, SeerReply>) -> Self {
        RoleKit::Seer {
            link,
            suspects: VecDeque::new(),
            checked: BTreeSet::new(),
        }
    }
}

/// One seat at the table, run as its own task.
pub struct Participant {
    seat: Seat,
    role: Role,
    kit: RoleKit,
    source: Box<dyn DecisionSource>,
    state: GameState,
    attendance: Attendance,
}

impl Participant {
    pub fn new(
        seat: Seat,
        role: Role,
        kit: RoleKit,
        source: Box<dyn DecisionSource>,
        state: GameState,
        attendance: Attendance,
    ) -> Self {
        Participant {
            seat,
            role,
            kit,
            source,
            state,
            attendance,
        }
    }

    /// Acts once for every token that awaits this seat and acknowledges it.
    /// Returns when the game ends or the controller goes away.
    pub async fn run(mut self) -> Result<(), EngineError> {
        while let Some(token) = self.attendance.next().await {
            match token.phase {
                GamePhase::End => break,
                _ if !token.awaits(self.seat) => continue,
                GamePhase::Night => self.night_action().await?,
                GamePhase::Day => self.day_vote().await?,
                GamePhase::NightResolve | GamePhase::DayResolve => self.review().await,
                GamePhase::Waiting => {}
            }
            self.attendance.acknowledge(self.seat, &token)?;
        }
        debug!(seat = self.seat, role = %self.role, "participant left the table");
        Ok(())
    }

    // Every living seat but this one.
    fn others(&self, living: &BTreeSet<Seat>) -> BTreeSet<Seat> {
        living.iter().copied().filter(|&s| s != self.seat).collect()
    }

    async fn night_action(&mut self) -> Result<(), EngineError> {
        let living = self.state.living().await;
        let targets: BTreeSet<Seat> = match &self.kit {
            RoleKit::Faction { members, .. } => living.difference(members).copied().collect(),
            _ => self.others(&living),
        };
        let seat = self.seat;

        match &mut self.kit {
            RoleKit::Civilian => {}
            RoleKit::Vigilante { link } => {
                let shot = pick(
                    self.source.as_mut(),
                    Choice::new(ChoiceKind::VigilanteShot, &targets),
                )
                .await?;
                link.ask(shot).await?;
            }
            RoleKit::Doctor { link, last_saved } => {
                let mut candidates = living.clone();
                if let Some(previous) = *last_saved {
                    candidates.remove(&previous);
                }
                let save = pick(
                    self.source.as_mut(),
                    Choice::new(ChoiceKind::DoctorSave, &candidates),
                )
                .await?;
                *last_saved = save;
                link.ask(save).await?;
            }
            RoleKit::Seer {
                link,
                suspects,
                checked,
            } => {
                suspects.retain(|s| living.contains(s));
                // a human may check anybody again; autonomous seers never repeat
                let checkable: BTreeSet<Seat> = if self.source.is_interactive() {
                    targets.clone()
                } else {
                    targets.difference(checked).copied().collect()
                };

                let seer_move = self.source.seer_move().await?;
                let query = match seer_move {
                    SeerMove::Check if !checkable.is_empty() => {
                        let target = self
                            .source
                            .choose(Choice::new(ChoiceKind::SeerCheck, &checkable))
                            .await?;
                        SeerQuery::Check(target)
                    }
                    _ => {
                        let kill = pick(
                            self.source.as_mut(),
                            Choice::new(ChoiceKind::SeerKill, &targets)
                                .preferring(suspects.front().copied()),
                        )
                        .await?;
                        match kill {
                            Some(target) => {
                                suspects.retain(|s| *s != target);
                                SeerQuery::Kill(target)
                            }
                            None => SeerQuery::Pass,
                        }
                    }
                };

                let reply = link.ask(query).await?;
                if let (SeerQuery::Check(target), SeerReply::Checked { is_mafia }) = (query, reply) {
                    debug!(seat, checked = target, is_mafia, "seer check answered");
                    checked.insert(target);
                    if is_mafia {
                        suspects.push_back(target);
                    }
                    self.source
                        .observe(&Observation::Checked { target, is_mafia })
                        .await;
                }
            }
            RoleKit::Faction { consensus, .. } => {
                let nomination = if self.source.is_interactive() {
                    consensus.await_peers(seat).await;
                    let tally = consensus.tally().await;
                    pick(
                        self.source.as_mut(),
                        Choice::new(ChoiceKind::FactionNomination, &targets).with_tally(&tally),
                    )
                    .await?
                } else {
                    pick(
                        self.source.as_mut(),
                        Choice::new(ChoiceKind::FactionNomination, &targets),
                    )
                    .await?
                };
                consensus.nominate(seat, nomination).await;
            }
        }
        Ok(())
    }

    async fn day_vote(&mut self) -> Result<(), EngineError> {
        let living = self.state.living().await;
        let targets = self.others(&living);

        let preferred = match &mut self.kit {
            RoleKit::Seer { suspects, .. } => {
                suspects.retain(|s| living.contains(s));
                suspects.front().copied()
            }
            _ => None,
        };

        let vote = pick(
            self.source.as_mut(),
            Choice::new(ChoiceKind::DayVote, &targets).preferring(preferred),
        )
        .await?;
        if let Some(target) = vote {
            self.state.cast_ballot(self.seat, target).await;
        }
        Ok(())
    }

    async fn review(&mut self) {
        if let RoleKit::Seer { suspects, .. } = &mut self.kit {
            let living = self.state.living().await;
            suspects.retain(|s| living.contains(s));
        }
    }
}

// An empty candidate set means there is nobody to act on.
async fn pick(
    source: &mut dyn DecisionSource,
    choice: Choice<'_>,
) -> Result<Option<Seat>, EngineError> {
    if choice.candidates.is_empty() {
        return Ok(None);
    }
    source.choose(choice).await.map(Some)
}
