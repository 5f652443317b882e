/// Frame timing for the fixed-timestep update loop
///
/// Physics and entity updates run at a constant rate regardless of how
/// fast frames arrive; leftover time carries over in an accumulator.
use std::time::{Duration, Instant};

/// Target update rate (60 updates per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const FIXED_TIMESTEP_DURATION: Duration = Duration::from_micros(16_667); // ~1/60 second

/// Maximum number of fixed steps per frame to prevent spiral of death
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Fixed-timestep accumulator driving the update loop
pub struct FrameClock {
    /// Accumulated time not yet consumed by fixed steps
    accumulator: Duration,

    /// Time of last frame
    last_frame_time: Instant,

    /// Time when the clock started
    start_time: Instant,

    /// Whether time accumulation is paused
    paused: bool,

    /// Current frame number
    frame_count: u64,

    /// Total fixed steps produced
    step_count: u64,
}

impl FrameClock {
    /// Create a new frame clock
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            accumulator: Duration::ZERO,
            last_frame_time: now,
            start_time: now,
            paused: false,
            frame_count: 0,
            step_count: 0,
        }
    }

    /// Begin a new frame, returning the number of fixed steps to run
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.frame_count += 1;

        // If paused, don't accumulate time
        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= FIXED_TIMESTEP_DURATION && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= FIXED_TIMESTEP_DURATION;
            steps += 1;
        }

        self.step_count += steps as u64;
        steps
    }

    /// The fixed timestep, in seconds
    pub fn fixed_timestep(&self) -> f32 {
        FIXED_TIMESTEP
    }

    /// Interpolation alpha between the last and next fixed step
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / FIXED_TIMESTEP
    }

    /// Total elapsed time since the clock started
    pub fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.start_time)
    }

    /// Total number of frames begun
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total number of fixed steps produced
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Whether the clock is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause time accumulation
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("frame clock paused");
        }
    }

    /// Resume time accumulation
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent a step burst
            self.accumulator = Duration::ZERO;
            log::info!("frame clock resumed");
        }
    }

    /// Toggle the paused state
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
