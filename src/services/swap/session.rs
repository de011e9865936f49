// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::LIFECYCLE_EVENT_BUFFER;
use crate::domain::error::SwapError;
use crate::domain::swap::OutcomeKey;
use crate::services::swap::engine::{SwapEngine, SwapReport};
use crate::services::swap::lifecycle::{LifecycleEvent, LifecycleHandle, SwapState};
use crate::services::swap::outcome::{SellAmount, roll_die};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// One user's swap session. A new trigger supersedes whatever lifecycle is
/// still running; its later transitions are dropped.
pub struct SwapSession {
    engine: Arc<SwapEngine>,
    sell_amount: SellAmount,
    roll_duration: Duration,
    generation: Arc<AtomicU64>,
    active: Mutex<Option<CancellationToken>>,
    rng: Mutex<StdRng>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl SwapSession {
    pub fn new(engine: Arc<SwapEngine>, sell_amount: SellAmount, roll_duration: Duration) -> Self {
        let (events, _) = broadcast::channel(LIFECYCLE_EVENT_BUFFER);
        Self {
            engine,
            sell_amount,
            roll_duration,
            generation: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
            rng: Mutex::new(StdRng::from_entropy()),
            events,
        }
    }

    pub fn with_rng(self, rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ..self
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cancel the running lifecycle, if any, and start a fresh one.
    pub fn begin(&self) -> LifecycleHandle {
        let token = CancellationToken::new();
        // Token and generation move together under the lock.
        let (previous, generation) = {
            let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (active.replace(token.clone()), generation)
        };
        if let Some(previous) = previous {
            previous.cancel();
            tracing::debug!(target: "session", generation, "Superseded previous swap");
        }
        LifecycleHandle::new(generation, self.generation.clone(), token, self.events.clone())
    }

    /// Roll for a starting face, wait out the roll, then swap.
    pub async fn roll_and_swap(&self) -> Result<SwapReport, SwapError> {
        let mut life = self.begin();
        life.transition(SwapState::SelectingOutcome)?;
        let (face, amount) = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            let face = roll_die(&mut *rng, &self.engine.registry().domain())?;
            (face, self.sell_amount.pick(&mut *rng))
        };
        tracing::info!(target: "session", generation = life.generation(), face, "Rolled");

        let cancel = life.cancellation();
        tokio::select! {
            _ = tokio::time::sleep(self.roll_duration) => {}
            _ = cancel.cancelled() => return Err(SwapError::Superseded),
        }
        self.engine.execute(face, &amount, &mut life).await
    }

    /// Swap starting from a chosen face, skipping the roll.
    pub async fn swap_from(&self, start: OutcomeKey) -> Result<SwapReport, SwapError> {
        let mut life = self.begin();
        let amount = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            self.sell_amount.pick(&mut *rng)
        };
        self.engine.execute(start, &amount, &mut life).await
    }
}
