use structopt::StructOpt;

use super::config::GameConfig;

#[derive(Debug, StructOpt)]
#[structopt(name = "mafia", about = "Runs a game of Mafia between concurrent players.")]
pub struct Opt {
    /// number of players (at least 6)
    #[structopt(short = "n", long)]
    pub players: Option<usize>,
    /// the Mafia faction gets players / divisor seats
    #[structopt(short = "k", long)]
    pub divisor: Option<usize>,
    /// take one seat yourself
    #[structopt(long)]
    pub play: bool,
    /// announce who killed and who saved each night
    #[structopt(long)]
    pub open: bool,
    /// deal Killer, Ninja and Bull flavors to the faction
    #[structopt(long)]
    pub flavored: bool,
    /// seed for a reproducible game
    #[structopt(long)]
    pub seed: Option<u64>,
    /// give up after this many rounds
    #[structopt(long)]
    pub round_limit: Option<u32>,
    /// print narration as JSON lines
    #[structopt(long)]
    pub json: bool,
}

impl Opt {
    /// Command-line values win over the environment.
    pub fn apply(&self, mut config: GameConfig) -> GameConfig {
        if let Some(players) = self.players {
            config.players = players;
        }
        if let Some(divisor) = self.divisor {
            config.divisor = divisor;
        }
        config.human_seat |= self.play;
        config.open_announcement |= self.open;
        config.flavored_roles |= self.flavored;
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.round_limit.is_some() {
            config.round_limit = self.round_limit;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let opt = Opt::from_iter(["mafia", "-n", "9", "--play", "--seed", "4"]);
        let config = opt.apply(GameConfig {
            divisor: 4,
            ..Default::default()
        });
        assert_eq!(config.players, 9);
        assert_eq!(config.divisor, 4);
        assert!(config.human_seat);
        assert_eq!(config.seed, Some(4));
    }
}
