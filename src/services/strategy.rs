use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::error::EngineError;
use crate::models::narration::{GameEvent, Narrator};
use crate::models::player::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    DayVote,
    DoctorSave,
    VigilanteShot,
    SeerKill,
    SeerCheck,
    FactionNomination,
}

impl ChoiceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChoiceKind::DayVote => "day vote",
            ChoiceKind::DoctorSave => "doctor save",
            ChoiceKind::VigilanteShot => "vigilante shot",
            ChoiceKind::SeerKill => "seer kill",
            ChoiceKind::SeerCheck => "seer check",
            ChoiceKind::FactionNomination => "faction nomination",
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            ChoiceKind::DayVote => "Vote for a player to kick",
            ChoiceKind::DoctorSave => "Choose a player to save",
            ChoiceKind::VigilanteShot => "Choose a player to shoot",
            ChoiceKind::SeerKill => "Choose a player to kill",
            ChoiceKind::SeerCheck => "Choose a player to check",
            ChoiceKind::FactionNomination => "Nominate a player for the faction to kill",
        }
    }
}

/// One target decision. `candidates` holds exactly the rule-valid targets and
/// is never empty.
#[derive(Debug, Clone, Copy)]
pub struct Choice<'a> {
    pub kind: ChoiceKind,
    pub candidates: &'a BTreeSet<Seat>,
    /// A target the role's own memory suggests.
    pub preferred: Option<Seat>,
    /// Faction nominations made so far, shown to a deferring member.
    pub tally: Option<&'a BTreeMap<Seat, usize>>,
}

impl<'a> Choice<'a> {
    pub fn new(kind: ChoiceKind, candidates: &'a BTreeSet<Seat>) -> Self {
        Choice {
            kind,
            candidates,
            preferred: None,
            tally: None,
        }
    }

    pub fn preferring(mut self, preferred: Option<Seat>) -> Self {
        self.preferred = preferred;
        self
    }

    pub fn with_tally(mut self, tally: &'a BTreeMap<Seat, usize>) -> Self {
        self.tally = Some(tally);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeerMove {
    Kill,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Checked { target: Seat, is_mafia: bool },
}

/// Where a seat's decisions come from. The role logic is the same for every
/// source; only the picking differs.
#[async_trait]
pub trait DecisionSource: Send {
    /// Interactive sources see the faction tally before nominating.
    fn is_interactive(&self) -> bool {
        false
    }

    async fn choose(&mut self, choice: Choice<'_>) -> Result<Seat, EngineError>;

    async fn seer_move(&mut self) -> Result<SeerMove, EngineError>;

    async fn observe(&mut self, _observation: &Observation) {}
}

/// Randomized decisions from a private generator.
pub struct Autonomous {
    rng: StdRng,
}

impl Autonomous {
    pub fn new(rng: StdRng) -> Self {
        Autonomous { rng }
    }
}

#[async_trait]
impl DecisionSource for Autonomous {
    async fn choose(&mut self, choice: Choice<'_>) -> Result<Seat, EngineError> {
        if let Some(preferred) = choice.preferred.filter(|p| choice.candidates.contains(p)) {
            return Ok(preferred);
        }
        choice
            .candidates
            .iter()
            .copied()
            .choose(&mut self.rng)
            .ok_or(EngineError::NoCandidates(choice.kind.label()))
    }

    async fn seer_move(&mut self) -> Result<SeerMove, EngineError> {
        if self.rng.gen_bool(0.5) {
            Ok(SeerMove::Kill)
        } else {
            Ok(SeerMove::Check)
        }
    }
}

/// A human seat reading whitespace-separated answers from `input`. Prompts
/// and results go out as private narration for the seat.
pub struct Console<R> {
    seat: Seat,
    input: R,
    pending: VecDeque<String>,
    narrator: Narrator,
}

impl<R> Console<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(seat: Seat, input: R, narrator: Narrator) -> Self {
        Console {
            seat,
            input,
            pending: VecDeque::new(),
            narrator,
        }
    }

    fn say(&self, event: GameEvent) {
        self.narrator.private(self.seat, event);
    }

    async fn next_word(&mut self) -> Result<String, EngineError> {
        loop {
            if let Some(word) = self.pending.pop_front() {
                return Ok(word);
            }
            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                return Err(EngineError::InputClosed);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

#[async_trait]
impl<R> DecisionSource for Console<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn is_interactive(&self) -> bool {
        true
    }

    async fn choose(&mut self, choice: Choice<'_>) -> Result<Seat, EngineError> {
        if let Some(tally) = choice.tally {
            self.say(GameEvent::FactionTally(
                tally.iter().map(|(&seat, &count)| (seat, count)).collect(),
            ));
        }
        let options = choice
            .candidates
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.say(GameEvent::Prompt(format!("{}: {}", choice.kind.prompt(), options)));

        loop {
            let word = self.next_word().await?;
            match word.parse::<Seat>() {
                Ok(seat) if choice.candidates.contains(&seat) => return Ok(seat),
                _ => self.say(GameEvent::InvalidInput),
            }
        }
    }

    async fn seer_move(&mut self) -> Result<SeerMove, EngineError> {
        self.say(GameEvent::Prompt("Type kill or check".to_string()));
        loop {
            match self.next_word().await?.as_str() {
                "kill" => return Ok(SeerMove::Kill),
                "check" => return Ok(SeerMove::Check),
                _ => self.say(GameEvent::InvalidInput),
            }
        }
    }

    async fn observe(&mut self, observation: &Observation) {
        match *observation {
            Observation::Checked { target, is_mafia } => {
                self.say(GameEvent::CheckResult { target, is_mafia })
            }
        }
    }
}
