//! Synchronization between the controller and the participant tasks.
//!
//! The controller broadcasts a [`PhaseToken`] naming the seats it expects to
//! hear from. Every awaited seat acts once for that token and answers with an
//! [`Ack`] carrying the token's generation; the controller moves on only when
//! the whole awaiting set has answered. Solo roles additionally talk to the
//! controller over a [`RoleLink`]/[`RoleDesk`] pair.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn, Instrument, Span};

use super::error::EngineError;
use crate::models::game::GamePhase;
use crate::models::player::Seat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseToken {
    pub generation: u64,
    pub phase: GamePhase,
    pub day: u32,
    pub awaiting: Arc<BTreeSet<Seat>>,
}

impl PhaseToken {
    fn waiting() -> Self {
        PhaseToken {
            generation: 0,
            phase: GamePhase::Waiting,
            day: 0,
            awaiting: Arc::new(BTreeSet::new()),
        }
    }

    pub fn awaits(&self, seat: Seat) -> bool {
        self.awaiting.contains(&seat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub seat: Seat,
    pub generation: u64,
}

/// Controller side of the phase protocol.
pub struct Conductor {
    phases: watch::Sender<PhaseToken>,
    acks: mpsc::UnboundedReceiver<Ack>,
    generation: u64,
}

/// Participant side of the phase protocol. Clone one per participant.
#[derive(Clone)]
pub struct Attendance {
    phases: watch::Receiver<PhaseToken>,
    acks: mpsc::UnboundedSender<Ack>,
}

pub fn fabric() -> (Conductor, Attendance) {
    let (phase_tx, phase_rx) = watch::channel(PhaseToken::waiting());
    let (ack_tx, ack_rx) = mpsc::unbounded_channel();
    (
        Conductor {
            phases: phase_tx,
            acks: ack_rx,
            generation: 0,
        },
        Attendance {
            phases: phase_rx,
            acks: ack_tx,
        },
    )
}

impl Conductor {
    pub fn broadcast(&mut self, phase: GamePhase, day: u32, awaiting: BTreeSet<Seat>) -> PhaseToken {
        self.generation += 1;
        let token = PhaseToken {
            generation: self.generation,
            phase,
            day,
            awaiting: Arc::new(awaiting),
        };
        debug!(generation = token.generation, phase = ?phase, awaiting = ?token.awaiting, "phase broadcast");
        self.phases.send_replace(token.clone());
        token
    }

    /// Waits until every seat the token awaits has acknowledged it.
    pub async fn gather(&mut self, token: &PhaseToken) -> Result<(), EngineError> {
        let mut missing: BTreeSet<Seat> = token.awaiting.as_ref().clone();

        while !missing.is_empty() {
            match self.acks.recv().await {
                Some(ack) if ack.generation == token.generation => {
                    if !missing.remove(&ack.seat) {
                        warn!(seat = ack.seat, generation = ack.generation, "unexpected acknowledgment");
                    }
                }
                Some(ack) => {
                    warn!(
                        seat = ack.seat,
                        stale = ack.generation,
                        current = token.generation,
                        "stale acknowledgment"
                    );
                }
                None => {
                    return Err(EngineError::AttendanceClosed {
                        generation: token.generation,
                        missing,
                    })
                }
            }
        }
        Ok(())
    }

    pub fn finish(&mut self, day: u32) -> PhaseToken {
        self.broadcast(GamePhase::End, day, BTreeSet::new())
    }
}

impl Attendance {
    /// Blocks until the controller publishes a new token. `None` once the
    /// controller is gone.
    pub async fn next(&mut self) -> Option<PhaseToken> {
        self.phases.changed().await.ok()?;
        let token = self.phases.borrow_and_update().clone();
        Some(token)
    }

    pub fn acknowledge(&self, seat: Seat, token: &PhaseToken) -> Result<(), EngineError> {
        self.acks
            .send(Ack {
                seat,
                generation: token.generation,
            })
            .map_err(|_| EngineError::ControllerGone)
    }
}

type Request<Q, A> = (Q, oneshot::Sender<A>);

/// Participant end of a solo role's question/answer exchange.
pub struct RoleLink<Q, A> {
    role: &'static str,
    tx: mpsc::Sender<Request<Q, A>>,
}

/// Controller end of a solo role's question/answer exchange.
pub struct RoleDesk<Q, A> {
    role: &'static str,
    rx: mpsc::Receiver<Request<Q, A>>,
}

pub fn role_channel<Q, A>(role: &'static str) -> (RoleDesk<Q, A>, RoleLink<Q, A>) {
    let (tx, rx) = mpsc::channel(1);
    (RoleDesk { role, rx }, RoleLink { role, tx })
}

impl<Q, A> RoleLink<Q, A> {
    pub async fn ask(&self, question: Q) -> Result<A, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((question, reply_tx))
            .await
            .map_err(|_| EngineError::HandshakeClosed(self.role))?;
        reply_rx
            .await
            .map_err(|_| EngineError::HandshakeClosed(self.role))
    }
}

impl<Q, A> RoleDesk<Q, A> {
    /// Takes the pending question, replies with `respond`, and returns the
    /// question.
    pub async fn answer<F>(&mut self, respond: F) -> Result<Q, EngineError>
    where
        F: FnOnce(&Q) -> A,
    {
        let (question, reply) = self
            .rx
            .recv()
            .await
            .ok_or(EngineError::HandshakeClosed(self.role))?;
        let answer = respond(&question);
        reply
            .send(answer)
            .map_err(|_| EngineError::HandshakeClosed(self.role))?;
        Ok(question)
    }
}

/// The participant tasks. While the game runs none of them may finish, so
/// every controller wait is raced against their exit.
pub struct Crew {
    tasks: JoinSet<(Seat, Result<(), EngineError>)>,
}

impl Default for Crew {
    fn default() -> Self {
        Self::new()
    }
}

impl Crew {
    pub fn new() -> Self {
        Crew {
            tasks: JoinSet::new(),
        }
    }

    /// Spawns `task` inside the caller's current span.
    pub fn spawn<F>(&mut self, seat: Seat, task: F)
    where
        F: Future<Output = Result<(), EngineError>> + Send + 'static,
    {
        self.tasks
            .spawn(async move { (seat, task.await) }.instrument(Span::current()));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn supervise<T, F>(&mut self, wait: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        tokio::pin!(wait);
        tokio::select! {
            out = &mut wait => out,
            Some(joined) = self.tasks.join_next() => Err(departure(joined)),
        }
    }

    /// Joins every task after the End token went out.
    pub async fn dismiss(mut self) -> Result<(), EngineError> {
        while let Some(joined) = self.tasks.join_next().await {
            let (seat, result) = joined?;
            result.map_err(|source| EngineError::Participant {
                seat,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }
}

fn departure(joined: Result<(Seat, Result<(), EngineError>), JoinError>) -> EngineError {
    match joined {
        Ok((seat, Ok(()))) => EngineError::ParticipantLost(seat),
        Ok((seat, Err(source))) => EngineError::Participant {
            seat,
            source: Box::new(source),
        },
        Err(err) => EngineError::Join(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gather_waits_for_every_awaited_seat() {
        let (mut conductor, attendance) = fabric();
        let mut seats = Vec::new();
        for seat in 0..3 {
            let mut attendance = attendance.clone();
            seats.push(tokio::spawn(async move {
                let token = attendance.next().await.unwrap();
                if token.awaits(seat) {
                    attendance.acknowledge(seat, &token).unwrap();
                }
            }));
        }
        drop(attendance);

        let token = conductor.broadcast(GamePhase::Day, 1, BTreeSet::from([0, 2]));
        tokio::time::timeout(Duration::from_secs(5), conductor.gather(&token))
            .await
            .unwrap()
            .unwrap();
        for seat in seats {
            seat.await.unwrap();
        }
    }

    #[tokio::test]
    async fn gather_reports_missing_seats_when_everyone_left() {
        let (mut conductor, attendance) = fabric();
        drop(attendance);
        let token = conductor.broadcast(GamePhase::Night, 1, BTreeSet::from([4]));
        let err = conductor.gather(&token).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::AttendanceClosed { generation: 1, ref missing } if missing.contains(&4)
        ));
    }

    #[tokio::test]
    async fn handshake_round_trip() {
        let (mut desk, link) = role_channel::<usize, bool>("Seer");
        let asker = tokio::spawn(async move { link.ask(3).await });
        let question = desk.answer(|q| *q == 3).await.unwrap();
        assert_eq!(question, 3);
        assert!(asker.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn supervise_reports_a_departed_participant() {
        let mut crew = Crew::new();
        crew.spawn(2, async { Ok(()) });
        let err = crew
            .supervise(std::future::pending::<Result<(), EngineError>>())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ParticipantLost(2)));
    }

    #[tokio::test]
    async fn crew_tasks_run_inside_the_spawning_span() {
        let _subscriber = tracing::subscriber::set_default(tracing_subscriber::registry());
        let game = tracing::info_span!("game");
        let expected = game.id();
        assert!(expected.is_some());

        let (tx, rx) = oneshot::channel();
        let mut crew = Crew::new();
        game.in_scope(|| {
            crew.spawn(0, async move {
                let _ = tx.send(Span::current().id());
                Ok(())
            })
        });
        assert_eq!(rx.await.unwrap(), expected);
        crew.dismiss().await.unwrap();
    }
}
