use crate::models::game::GameResult;
use crate::models::player::Roster;
use crate::state::Liveness;

/// Win check from a liveness snapshot. The comparisons run in a fixed order:
/// a living Vigilante turns a tied count into "play on" and an empty faction
/// into a Vigilante win.
pub fn judge(roster: &Roster, liveness: &Liveness) -> GameResult {
    let live_faction = liveness.living_count(roster.faction());
    let vigilante_alive = liveness.is_alive(roster.vigilante());
    let live_town = liveness.living_count(roster.civilians())
        + usize::from(liveness.is_alive(roster.doctor()))
        + usize::from(liveness.is_alive(roster.seer()))
        + usize::from(vigilante_alive);

    if live_faction > live_town {
        return GameResult::MafiaWin;
    }
    if vigilante_alive && live_faction == live_town {
        return GameResult::InProgress;
    }
    if !vigilante_alive && live_faction == live_town {
        return GameResult::MafiaWin;
    }
    if live_faction == 0 {
        return if vigilante_alive {
            GameResult::VigilanteWin
        } else {
            GameResult::TownWin
        };
    }
    GameResult::InProgress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::{Flavor, Role};

    // seats: 0 Doctor, 1 Seer, 2 Vigilante, 3 and 4 faction, 5 Civilian
    fn roster() -> Roster {
        Roster::new(vec![
            Role::Doctor,
            Role::Seer,
            Role::Vigilante,
            Role::Mafia(Flavor::Mafia),
            Role::Mafia(Flavor::Mafia),
            Role::Civilian,
        ])
        .unwrap()
    }

    fn alive(seats: &[bool; 6]) -> Liveness {
        Liveness::from(seats.to_vec())
    }

    #[test]
    fn fresh_table_plays_on() {
        assert_eq!(judge(&roster(), &Liveness::new(6)), GameResult::InProgress);
    }

    #[test]
    fn vigilante_alive_keeps_a_tie_going() {
        let liveness = alive(&[false, false, true, true, false, false]);
        assert_eq!(judge(&roster(), &liveness), GameResult::InProgress);
    }

    #[test]
    fn tie_without_vigilante_goes_to_the_faction() {
        let liveness = alive(&[false, false, false, true, false, true]);
        assert_eq!(judge(&roster(), &liveness), GameResult::MafiaWin);
    }

    #[test]
    fn faction_majority_wins_even_with_vigilante() {
        let liveness = alive(&[false, false, true, true, true, false]);
        assert_eq!(judge(&roster(), &liveness), GameResult::MafiaWin);
    }

    #[test]
    fn empty_faction_splits_on_the_vigilante() {
        let with = alive(&[true, false, true, false, false, true]);
        assert_eq!(judge(&roster(), &with), GameResult::VigilanteWin);
        let without = alive(&[true, false, false, false, false, true]);
        assert_eq!(judge(&roster(), &without), GameResult::TownWin);
    }

    #[test]
    fn lone_vigilante_against_empty_faction() {
        let liveness = alive(&[false, false, true, false, false, false]);
        assert_eq!(judge(&roster(), &liveness), GameResult::VigilanteWin);
    }

    #[test]
    fn everyone_dead_is_a_mafia_win() {
        let liveness = alive(&[false; 6]);
        assert_eq!(judge(&roster(), &liveness), GameResult::MafiaWin);
    }
}
