use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use super::strategy::{Autonomous, Console, DecisionSource};
use crate::models::config::{ConfigError, GameConfig};
use crate::models::narration::{GameEvent, Narrator};
use crate::models::player::{Roster, Seat};
use crate::models::role::Role;

/// Everything a game needs before it starts: the dealt roster, one decision
/// source per seat and the controller's generator.
pub struct GameSetup {
    pub(crate) roster: Roster,
    pub(crate) sources: Vec<Box<dyn DecisionSource>>,
    pub(crate) rng: StdRng,
    pub(crate) open_announcement: bool,
    pub(crate) round_limit: Option<u32>,
    human: Option<Seat>,
}

impl GameSetup {
    /// Validates the configuration and deals a shuffled role table.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let table = config.validate()?;
        let mut master = master_rng(config.seed);
        let roles = table.deal(&mut master);
        Self::assemble(roles, config, master)
    }

    /// Uses `roles` as dealt, seat by seat. Player count and divisor of
    /// `config` are ignored.
    pub fn with_roles(roles: Vec<Role>, config: &GameConfig) -> Result<Self, ConfigError> {
        Self::assemble(roles, config, master_rng(config.seed))
    }

    fn assemble(roles: Vec<Role>, config: &GameConfig, mut master: StdRng) -> Result<Self, ConfigError> {
        let roster = Roster::new(roles)?;

        let sources: Vec<Box<dyn DecisionSource>> = (0..roster.len())
            .map(|_| {
                let rng = StdRng::seed_from_u64(master.gen());
                Box::new(Autonomous::new(rng)) as Box<dyn DecisionSource>
            })
            .collect();

        let human = if config.human_seat {
            Some(master.gen_range(0..roster.len()))
        } else {
            None
        };
        let rng = StdRng::seed_from_u64(master.gen());

        info!(
            players = roster.len(),
            faction = roster.faction().len(),
            ?human,
            "table dealt"
        );

        Ok(GameSetup {
            roster,
            sources,
            rng,
            open_announcement: config.open_announcement,
            round_limit: config.round_limit,
            human,
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The seat drawn for a human, if one was requested.
    pub fn human_seat(&self) -> Option<Seat> {
        self.human
    }

    pub fn set_source(&mut self, seat: Seat, source: Box<dyn DecisionSource>) {
        match self.sources.get_mut(seat) {
            Some(slot) => *slot = source,
            None => warn!(seat, "no such seat, decision source dropped"),
        }
    }

    /// Puts a console on the human seat and tells it who it is.
    pub fn install_console<R>(&mut self, input: R, narrator: &Narrator) -> Option<Seat>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let seat = self.human?;
        let role = self.roster.role_of(seat)?;
        let mates = if role.is_mafia() {
            self.roster
                .faction()
                .iter()
                .copied()
                .filter(|&s| s != seat)
                .collect()
        } else {
            Vec::new()
        };

        self.set_source(seat, Box::new(Console::new(seat, input, narrator.clone())));
        narrator.private(seat, GameEvent::SeatAssigned { seat, role, mates });
        Some(seat)
    }
}

fn master_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
