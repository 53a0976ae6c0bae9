//! # Request Generations
//!
//! Every activation mints a new [`Generation`] paired with a
//! [`CancellationToken`]. Minting cancels the previous token, so at most one
//! generation is live per controller and only its result may touch state.

use std::fmt::Display;
use tokio_util::sync::CancellationToken;

/// Identifier of one activation cycle. Later generations compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen_{}", self.0)
    }
}

struct ActiveRequest {
    generation: Generation,
    cancel: CancellationToken,
}

/// Mints generations and tracks the live one.
#[derive(Default)]
pub struct GenerationCounter {
    minted: u64,
    active: Option<ActiveRequest>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the live generation, if any, and starts a new one.
    pub fn mint(&mut self) -> (Generation, CancellationToken) {
        self.cancel_active();
        self.minted += 1;
        let generation = Generation(self.minted);
        let cancel = CancellationToken::new();
        self.active = Some(ActiveRequest {
            generation,
            cancel: cancel.clone(),
        });
        (generation, cancel)
    }

    /// The most recently minted generation, whether or not it has settled.
    pub fn latest(&self) -> Option<Generation> {
        (self.minted > 0).then_some(Generation(self.minted))
    }

    /// Whether `generation` is live and allowed to commit state.
    pub fn is_current(&self, generation: Generation) -> bool {
        matches!(&self.active, Some(active) if active.generation == generation)
    }

    /// Retires `generation` once its result has been handled.
    ///
    /// Returns `false` when it was not the live generation.
    pub fn retire(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Cancels the live generation without starting another.
    pub fn cancel_active(&mut self) -> Option<Generation> {
        self.active.take().map(|active| {
            active.cancel.cancel();
            active.generation
        })
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }
}
