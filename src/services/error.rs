use crate::models::player::Seat;
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("participant {0} stopped before the game ended")]
    ParticipantLost(Seat),
    #[error("participant {seat} failed: {source}")]
    Participant {
        seat: Seat,
        #[source]
        source: Box<EngineError>,
    },
    #[error("acknowledgment channel closed while waiting for {missing:?} (generation {generation})")]
    AttendanceClosed {
        generation: u64,
        missing: BTreeSet<Seat>,
    },
    #[error("the {0} handshake closed")]
    HandshakeClosed(&'static str),
    #[error("the controller left the table")]
    ControllerGone,
    #[error("input closed while waiting for a decision")]
    InputClosed,
    #[error("no rule-valid target for {0}")]
    NoCandidates(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("round limit of {0} exceeded")]
    RoundLimitExceeded(u32),
    #[error("participant task failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}
