use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use super::game::{DayOutcome, GameResult, NightReport};
use super::player::{Player, Seat};
use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narration {
    pub audience: Audience,
    pub event: GameEvent,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Audience {
    Public,        // everyone at the table
    Faction,       // Mafia-aligned seats only
    Private(Seat), // a single seat, e.g. the human player
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GameEvent {
    DayBegins { day: u32 },
    NightFalls,
    NightResult(NightReport),
    NowLive(Vec<Seat>),
    DayVote,
    VoteResult { voters: Vec<Seat>, ballots: Vec<Option<Seat>> },
    Outcome(DayOutcome),
    GameOver { result: GameResult, roster: Vec<Player> },
    SeatAssigned { seat: Seat, role: Role, mates: Vec<Seat> },
    Prompt(String),
    InvalidInput,
    CheckResult { target: Seat, is_mafia: bool },
    FactionTally(Vec<(Seat, usize)>),
}

fn join_seats<I: IntoIterator<Item = Seat>>(seats: I) -> String {
    seats
        .into_iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::DayBegins { day } => write!(f, "Day {}", day),
            GameEvent::NightFalls => write!(f, "Night"),
            GameEvent::NightResult(NightReport::Attributed(actions)) => {
                write!(f, "Night result")?;
                if let Some(t) = actions.vigilante {
                    write!(f, "\nVigilante kill {}", t)?;
                }
                if let Some(t) = actions.faction {
                    write!(f, "\nMafia kill {}", t)?;
                }
                if let Some(t) = actions.seer {
                    write!(f, "\nSeer kill {}", t)?;
                }
                if let Some(t) = actions.doctor {
                    write!(f, "\nDoctor save {}", t)?;
                }
                Ok(())
            }
            GameEvent::NightResult(NightReport::Anonymous(killed)) => {
                if killed.is_empty() {
                    write!(f, "Night result\nNo kill today")
                } else {
                    write!(f, "Night result\nToday kill\n{}", join_seats(killed.iter().copied()))
                }
            }
            GameEvent::NowLive(seats) => write!(f, "Now live\n{}", join_seats(seats.iter().copied())),
            GameEvent::DayVote => write!(f, "Day vote"),
            GameEvent::VoteResult { voters, ballots } => {
                let ballots = ballots
                    .iter()
                    .map(|b| b.map_or_else(|| "-".to_string(), |s| s.to_string()))
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(
                    f,
                    "Vote result\n{}\n{}",
                    join_seats(voters.iter().copied()),
                    ballots
                )
            }
            GameEvent::Outcome(DayOutcome::Eliminated(seat)) => write!(f, "Kick {}", seat),
            GameEvent::Outcome(DayOutcome::NoElimination) => write!(f, "No Kick today"),
            GameEvent::GameOver { result, roster } => {
                write!(f, "{}", result)?;
                for player in roster {
                    write!(f, "\n{} {}", player.id, player.role)?;
                }
                Ok(())
            }
            GameEvent::SeatAssigned { seat, role, mates } => {
                write!(f, "Your number is {}\nYou are {}", seat, role)?;
                if role.is_mafia() {
                    write!(f, "\nYour faction mates: {}", join_seats(mates.iter().copied()))?;
                }
                Ok(())
            }
            GameEvent::Prompt(text) => write!(f, "{}", text),
            GameEvent::InvalidInput => write!(f, "Wrong input, try again"),
            GameEvent::CheckResult { target, is_mafia } => {
                if *is_mafia {
                    write!(f, "{} is Mafia", target)
                } else {
                    write!(f, "{} is Civilian", target)
                }
            }
            GameEvent::FactionTally(tally) => {
                write!(f, "Faction nominations:")?;
                for (seat, count) in tally {
                    write!(f, "\n{}: {}", seat, count)?;
                }
                Ok(())
            }
        }
    }
}

impl Narration {
    pub fn new(audience: Audience, event: GameEvent) -> Self {
        Narration {
            audience,
            event,
            at: Utc::now(),
        }
    }
}

/// Best-effort sender of narration. A closed or absent receiver never
/// interferes with the game.
#[derive(Debug, Clone, Default)]
pub struct Narrator {
    tx: Option<mpsc::UnboundedSender<Narration>>,
}

impl Narrator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Narration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn announce(&self, audience: Audience, event: GameEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(Narration::new(audience, event)).is_err() {
                tracing::debug!("narration receiver dropped");
            }
        }
    }

    pub fn public(&self, event: GameEvent) {
        self.announce(Audience::Public, event);
    }

    pub fn private(&self, seat: Seat, event: GameEvent) {
        self.announce(Audience::Private(seat), event);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrationLog {
    pub entries: Vec<Narration>,
}

impl NarrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, narration: Narration) {
        self.entries.push(narration);
    }

    /// Drains everything currently queued on the receiver.
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<Narration>) -> Self {
        let mut log = Self::new();
        while let Ok(narration) = rx.try_recv() {
            log.add(narration);
        }
        log
    }

    pub fn by_audience(&self, audience: Audience) -> Vec<&GameEvent> {
        self.entries
            .iter()
            .filter(|n| n.audience == audience)
            .map(|n| &n.event)
            .collect()
    }

    pub fn public_events(&self) -> Vec<&GameEvent> {
        self.by_audience(Audience::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_transcript_lines() {
        assert_eq!(GameEvent::DayBegins { day: 2 }.to_string(), "Day 2");
        assert_eq!(
            GameEvent::NightResult(NightReport::Anonymous(vec![])).to_string(),
            "Night result\nNo kill today"
        );
        assert_eq!(
            GameEvent::VoteResult {
                voters: vec![0, 1, 2],
                ballots: vec![Some(2), Some(2), Some(0)],
            }
            .to_string(),
            "Vote result\n0 1 2\n2 2 0"
        );
        assert_eq!(
            GameEvent::Outcome(DayOutcome::Eliminated(4)).to_string(),
            "Kick 4"
        );
    }

    #[tokio::test]
    async fn log_filters_by_audience() {
        let (narrator, mut rx) = Narrator::channel();
        narrator.public(GameEvent::NightFalls);
        narrator.private(3, GameEvent::InvalidInput);
        drop(narrator);

        let log = NarrationLog::drain(&mut rx);
        assert_eq!(log.public_events(), vec![&GameEvent::NightFalls]);
        assert_eq!(
            log.by_audience(Audience::Private(3)),
            vec![&GameEvent::InvalidInput]
        );
    }

    #[test]
    fn silent_narrator_discards() {
        Narrator::silent().public(GameEvent::DayVote);
    }
}
