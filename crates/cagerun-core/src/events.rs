use serde::{Deserialize, Serialize};

/// Semantic events raised by the simulation for audio, presence and
/// persistence layers. The simulation never waits on how they are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    Jumped { double: bool },
    Slid,
    Shot,
    HitTaken { hits: u32 },
    ObstacleDodged { bonus: u32 },
    CageDodged { bonus: u32 },
    ObstacleDestroyed { bonus: u32 },
    PlayerTrapped,
    ChaserCatching,
    PlayerCaught,
    PlayerTackled,
    FinaleArmed,
    ChaserTrapped,
    LevelComplete { score: u32 },
    GameOver { score: u32 },
    Restarted,
}

impl SimEvent {
    /// Whether this event ends the attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SimEvent::LevelComplete { .. } | SimEvent::GameOver { .. })
    }

    /// Points carried by a scoring event, zero for everything else.
    pub fn bonus(&self) -> u32 {
        match self {
            SimEvent::ObstacleDodged { bonus }
            | SimEvent::CageDodged { bonus }
            | SimEvent::ObstacleDestroyed { bonus } => *bonus,
            _ => 0,
        }
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Completed { score: u32 },
    GameOver { score: u32 },
}

impl Outcome {
    pub fn score(&self) -> u32 {
        match self {
            Outcome::Completed { score } | Outcome::GameOver { score } => *score,
        }
    }
}
