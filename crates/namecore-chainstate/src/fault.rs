//! Crash injection for exercising recovery of interrupted commits.

use parking_lot::Mutex;

/// A point in the commit path where a fault may be injected.
///
/// [`CoinsNameView::batch_write`](crate::CoinsNameView::batch_write) reaches
/// its fault point exactly once per commit, after the head-blocks marker is
/// durable and before the atomic write batch is applied.
pub trait FaultPoint: Send + Sync {
    fn reached(&self);
}

/// Never injects a fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFault;

impl FaultPoint for NoFault {
    fn reached(&self) {}
}

/// Terminates the process with probability `1 / ratio`, modelling power loss
/// in the middle of a commit.
#[derive(Debug)]
pub struct SimulatedCrash {
    ratio: u32,
    rng: Mutex<fastrand::Rng>,
}

impl SimulatedCrash {
    /// Panics if `ratio` is zero.
    pub fn new(ratio: u32) -> Self {
        Self::with_rng(ratio, fastrand::Rng::new())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(ratio: u32, seed: u64) -> Self {
        Self::with_rng(ratio, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(ratio: u32, rng: fastrand::Rng) -> Self {
        assert!(ratio > 0, "crash ratio must be positive");
        Self {
            ratio,
            rng: Mutex::new(rng),
        }
    }

    /// The fault point configured by `simulate_crash_ratio`.
    pub fn from_ratio(ratio: u32) -> Box<dyn FaultPoint> {
        if ratio == 0 {
            Box::new(NoFault)
        } else {
            Box::new(Self::new(ratio))
        }
    }

    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    fn should_crash(&self) -> bool {
        self.rng.lock().u32(..self.ratio) == 0
    }
}

impl FaultPoint for SimulatedCrash {
    fn reached(&self) {
        if self.should_crash() {
            tracing::error!("Simulating a crash. Goodbye.");
            std::process::exit(0);
        }
    }
}
