//! Frame scheduling for a mounted session.
//!
//! The host calls [`AnimationClock::tick`] once per display refresh with a
//! monotonically increasing timestamp. A tick only produces a [`FrameTime`]
//! if a frame was requested; the session requeues after every tick it
//! handled. Once [`AnimationClock::stop`] has been called nothing is ever
//! scheduled again.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTime {
    /// Time since the first tick of the session.
    pub elapsed: Duration,
    /// Time since the previous tick.
    pub dt: Duration,
}

impl FrameTime {
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct AnimationClock {
    state: ClockState,
    pending: bool,
    origin: Option<Duration>,
    last: Duration,
    ticks: u64,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Idle,
            pending: false,
            origin: None,
            last: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Begin scheduling. Has no effect on a stopped clock.
    pub fn start(&mut self) {
        if self.state == ClockState::Idle {
            self.state = ClockState::Running;
            self.pending = true;
        }
    }

    /// Schedule the next frame. Returns `false` once the clock is stopped.
    pub fn requeue(&mut self) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the scheduled frame, if any.
    pub fn tick(&mut self, timestamp: Duration) -> Option<FrameTime> {
        if self.state != ClockState::Running || !self.pending {
            return None;
        }
        self.pending = false;
        let origin = *self.origin.get_or_insert(timestamp);
        // timestamps going backwards count as a zero length frame
        let now = timestamp.max(self.last).max(origin);
        let dt = if self.ticks == 0 {
            Duration::ZERO
        } else {
            now - self.last
        };
        self.last = now;
        self.ticks += 1;
        Some(FrameTime {
            elapsed: now - origin,
            dt,
        })
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.pending = false;
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn ticks_need_a_request() {
        let mut clock = AnimationClock::new();
        assert_eq!(clock.tick(ms(0)), None);
        clock.start();
        let first = clock.tick(ms(100)).unwrap();
        assert_eq!(first.elapsed, Duration::ZERO);
        assert_eq!(clock.tick(ms(116)), None);
        assert!(clock.requeue());
        let second = clock.tick(ms(132)).unwrap();
        assert_eq!(second.elapsed, ms(32));
        assert_eq!(second.dt, ms(32));
    }

    #[test]
    fn stopped_clock_never_fires() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.stop();
        assert!(!clock.requeue());
        clock.start();
        for i in 0..10 {
            assert_eq!(clock.tick(ms(i * 16)), None);
        }
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.state(), ClockState::Stopped);
    }

    #[test]
    fn time_never_runs_backwards() {
        let mut clock = AnimationClock::new();
        clock.start();
        clock.tick(ms(50));
        clock.requeue();
        clock.tick(ms(80));
        clock.requeue();
        let frame = clock.tick(ms(60)).unwrap();
        assert_eq!(frame.dt, Duration::ZERO);
        assert_eq!(frame.elapsed, ms(30));
    }
}
