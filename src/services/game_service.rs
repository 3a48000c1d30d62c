use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use super::consensus::FactionConsensus;
use super::error::EngineError;
use super::judgement::judge;
use super::participant::{Participant, RoleKit, SeerQuery, SeerReply};
use super::rendezvous::{fabric, role_channel, Conductor, Crew, RoleDesk};
use super::setup::GameSetup;
use super::tally::VoteTally;
use crate::models::game::{DayOutcome, GamePhase, GameResult, NightActions, NightReport};
use crate::models::narration::{Audience, GameEvent, Narrator};
use crate::models::player::{Player, Roster, Seat};
use crate::models::role::Role;
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    pub game_id: Uuid,
    pub result: GameResult,
    /// The day the game ended on.
    pub days: u32,
    pub roster: Vec<Player>,
    pub survivors: BTreeSet<Seat>,
}

/// Runs one game to its end: spawns a task per seat, drives the rounds and
/// narrates them.
pub async fn play(setup: GameSetup, narrator: Narrator) -> Result<GameReport, EngineError> {
    let game_id = Uuid::new_v4();
    let span = tracing::info_span!("game", %game_id);
    async move {
        let master = GameMaster::seat(game_id, setup, narrator)?;
        master.run().await
    }
    .instrument(span)
    .await
}

struct GameMaster {
    game_id: Uuid,
    roster: Roster,
    state: GameState,
    consensus: FactionConsensus,
    conductor: Conductor,
    crew: Crew,
    vigilante: RoleDesk<Option<Seat>, ()>,
    seer: RoleDesk<SeerQuery, SeerReply>,
    doctor: RoleDesk<Option<Seat>, ()>,
    narrator: Narrator,
    rng: StdRng,
    open_announcement: bool,
    round_limit: Option<u32>,
    day: u32,
}

impl GameMaster {
    fn seat(game_id: Uuid, setup: GameSetup, narrator: Narrator) -> Result<Self, EngineError> {
        let GameSetup {
            roster,
            sources,
            rng,
            open_announcement,
            round_limit,
            ..
        } = setup;

        let state = GameState::new(roster.len());
        let consensus = FactionConsensus::new();
        let (conductor, attendance) = fabric();
        let (vigilante, vigilante_link) = role_channel("Vigilante");
        let (seer, seer_link) = role_channel("Seer");
        let (doctor, doctor_link) = role_channel("Doctor");
        let mut vigilante_link = Some(vigilante_link);
        let mut seer_link = Some(seer_link);
        let mut doctor_link = Some(doctor_link);

        let mut crew = Crew::new();
        for (player, source) in roster.players().iter().zip(sources) {
            let kit = match player.role {
                Role::Civilian => RoleKit::Civilian,
                Role::Doctor => RoleKit::Doctor {
                    link: doctor_link.take().ok_or(EngineError::HandshakeClosed("Doctor"))?,
                    last_saved: None,
                },
                Role::Seer => {
                    RoleKit::seer(seer_link.take().ok_or(EngineError::HandshakeClosed("Seer"))?)
                }
                Role::Vigilante => RoleKit::Vigilante {
                    link: vigilante_link
                        .take()
                        .ok_or(EngineError::HandshakeClosed("Vigilante"))?,
                },
                Role::Mafia(_) => RoleKit::Faction {
                    consensus: consensus.clone(),
                    members: roster.faction().clone(),
                },
            };
            let participant = Participant::new(
                player.id,
                player.role,
                kit,
                source,
                state.clone(),
                attendance.clone(),
            );
            crew.spawn(player.id, participant.run());
        }

        Ok(GameMaster {
            game_id,
            roster,
            state,
            consensus,
            conductor,
            crew,
            vigilante,
            seer,
            doctor,
            narrator,
            rng,
            open_announcement,
            round_limit,
            day: 1,
        })
    }

    async fn run(mut self) -> Result<GameReport, EngineError> {
        info!(
            players = self.roster.len(),
            faction = self.roster.faction().len(),
            "game started"
        );

        let result = loop {
            if let Some(limit) = self.round_limit {
                if self.day > limit {
                    self.conductor.finish(self.day);
                    self.crew.dismiss().await?;
                    return Err(EngineError::RoundLimitExceeded(limit));
                }
            }

            self.narrator.public(GameEvent::DayBegins { day: self.day });
            let result = self.night().await?;
            if result.is_over() {
                break result;
            }
            let result = self.day_round().await?;
            if result.is_over() {
                break result;
            }

            self.state.clear_ballots().await;
            self.consensus.clear().await;
            self.day += 1;
        };

        self.conductor.finish(self.day);
        let survivors = self.state.living().await;
        let roster = self.roster.players().to_vec();
        info!(%result, day = self.day, ?survivors, "game over");
        self.narrator.public(GameEvent::GameOver {
            result,
            roster: roster.clone(),
        });
        self.crew.dismiss().await?;

        Ok(GameReport {
            game_id: self.game_id,
            result,
            days: self.day,
            roster,
            survivors,
        })
    }

    async fn night(&mut self) -> Result<GameResult, EngineError> {
        self.narrator.public(GameEvent::NightFalls);

        let living = self.state.living().await;
        let faction: BTreeSet<Seat> = self.roster.faction().intersection(&living).copied().collect();
        self.consensus.open(faction.clone()).await;
        let token = self.conductor.broadcast(GamePhase::Night, self.day, living);

        let mut actions = NightActions::default();
        if token.awaits(self.roster.vigilante()) {
            actions.vigilante = self.crew.supervise(self.vigilante.answer(|_| ())).await?;
        }
        if token.awaits(self.roster.seer()) {
            let roster = &self.roster;
            let query = self
                .crew
                .supervise(self.seer.answer(|query| match query {
                    SeerQuery::Check(target) => SeerReply::Checked {
                        is_mafia: roster.is_faction(*target),
                    },
                    _ => SeerReply::Acknowledged,
                }))
                .await?;
            if let SeerQuery::Kill(target) = query {
                actions.seer = Some(target);
            }
        }
        if !faction.is_empty() {
            let consensus = self.consensus.clone();
            actions.faction = self
                .crew
                .supervise(async move { Ok(consensus.target().await) })
                .await?;
            let tally = self.consensus.tally().await;
            self.narrator.announce(
                Audience::Faction,
                GameEvent::FactionTally(tally.into_iter().collect()),
            );
        }
        if token.awaits(self.roster.doctor()) {
            actions.doctor = self.crew.supervise(self.doctor.answer(|_| ())).await?;
        }
        self.crew.supervise(self.conductor.gather(&token)).await?;

        let roster = &self.roster;
        let result = self
            .state
            .resolve(|liveness| {
                actions.apply(liveness);
                judge(roster, liveness)
            })
            .await;
        debug!(?actions, %result, "night resolved");

        let resolve = self
            .conductor
            .broadcast(GamePhase::NightResolve, self.day, token.awaiting.as_ref().clone());
        self.crew.supervise(self.conductor.gather(&resolve)).await?;

        self.narrator.public(GameEvent::NightResult(NightReport::new(
            &actions,
            self.open_announcement,
        )));
        if !result.is_over() {
            let living = self.state.living().await;
            self.narrator.public(GameEvent::NowLive(living.into_iter().collect()));
        }
        Ok(result)
    }

    async fn day_round(&mut self) -> Result<GameResult, EngineError> {
        self.narrator.public(GameEvent::DayVote);

        let voters = self.state.living().await;
        let token = self.conductor.broadcast(GamePhase::Day, self.day, voters.clone());
        self.crew.supervise(self.conductor.gather(&token)).await?;

        let ballots = self.state.ballots().await;
        self.narrator.public(GameEvent::VoteResult {
            voters: voters.iter().copied().collect(),
            ballots: voters
                .iter()
                .map(|&v| ballots.get(v).copied().flatten())
                .collect(),
        });

        let outcome = VoteTally::from_ballots(&ballots, &voters).decide(&mut self.rng);
        let roster = &self.roster;
        let result = self
            .state
            .resolve(|liveness| {
                if let DayOutcome::Eliminated(seat) = outcome {
                    liveness.set_alive(seat, false);
                }
                judge(roster, liveness)
            })
            .await;
        debug!(?outcome, %result, "day resolved");

        self.narrator.public(GameEvent::Outcome(outcome));
        let living = self.state.living().await;
        self.narrator.public(GameEvent::NowLive(living.into_iter().collect()));

        let resolve = self
            .conductor
            .broadcast(GamePhase::DayResolve, self.day, voters);
        self.crew.supervise(self.conductor.gather(&resolve)).await?;
        Ok(result)
    }
}
