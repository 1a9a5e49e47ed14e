//! Frame pacing for the render loop.

use std::time::{Duration, Instant};

/// Caps the frame loop at a target rate by sleeping out the rest of each
/// frame's time budget.
///
/// Call [`tick`](FrameClock::tick) once per frame, before doing the frame's work.
#[derive(Debug)]
pub struct FrameClock {
    budget: Option<Duration>,
    last_tick: Instant,
}

impl FrameClock {
    /// A clock targeting `target_fps` frames per second. `0` disables the cap.
    pub fn new(target_fps: u32) -> Self {
        Self {
            budget: frame_budget(target_fps),
            last_tick: Instant::now(),
        }
    }

    /// Time allotted to each frame, if capped.
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Block until the current frame's budget is used up, then start the next
    /// frame. Returns the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        if let Some(wait) = remaining(self.last_tick.elapsed(), self.budget) {
            std::thread::sleep(wait);
        }
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        dt
    }
}

fn frame_budget(target_fps: u32) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64))
}

/// How long to sleep after `elapsed` of work to fill `budget`.
fn remaining(elapsed: Duration, budget: Option<Duration>) -> Option<Duration> {
    budget?
        .checked_sub(elapsed)
        .filter(|wait| !wait.is_zero())
}
