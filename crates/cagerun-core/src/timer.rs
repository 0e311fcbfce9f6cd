use serde::{Deserialize, Serialize};

/// Declared state of a re-armable one-shot timer owned by the host.
///
/// The simulation never schedules callbacks itself. It publishes a `TimerArm`,
/// the host mirrors it with an [`ExternalTimer`] and feeds the resulting
/// [`TimerFired`] back in. Every re-arm bumps `generation`, so a fire that
/// belongs to an older arm can be recognised and ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum TimerArm {
    #[default]
    Disabled,
    Armed { delay: f32, generation: u64 },
}

impl TimerArm {
    pub fn generation(&self) -> Option<u64> {
        match self {
            TimerArm::Disabled => None,
            TimerArm::Armed { generation, .. } => Some(*generation),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, TimerArm::Armed { .. })
    }

    /// Whether `fired` belongs to the current arm.
    pub fn accepts(&self, fired: TimerFired) -> bool {
        self.generation() == Some(fired.generation)
    }
}

/// One expiry of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerFired {
    pub generation: u64,
}

/// Host-side countdown mirroring a [`TimerArm`].
#[derive(Debug, Clone, Default)]
pub struct ExternalTimer {
    synced_generation: Option<u64>,
    remaining: Option<f32>,
}

impl ExternalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the simulation's declared arm. Re-syncing the same generation
    /// does not restart the countdown.
    pub fn sync(&mut self, arm: &TimerArm) {
        match *arm {
            TimerArm::Disabled => {
                self.synced_generation = None;
                self.remaining = None;
            },
            TimerArm::Armed { delay, generation } => {
                if self.synced_generation != Some(generation) {
                    self.synced_generation = Some(generation);
                    self.remaining = Some(delay.max(0.0));
                }
            },
        }
    }

    /// Advance by `dt`; yields a fire at most once per generation.
    pub fn tick(&mut self, dt: f32) -> Option<TimerFired> {
        let remaining = self.remaining.as_mut()?;
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        self.remaining = None;
        self.synced_generation
            .map(|generation| TimerFired { generation })
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }
}
