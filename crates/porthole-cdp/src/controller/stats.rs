//! Frame counter and smoothed frame-rate estimate for one connection.

use std::time::Instant;

/// Running statistics for the active screencast.
///
/// The rate is an exponential moving average: each arrival folds the
/// instantaneous rate in at 10% weight. The first frame only records its
/// arrival time; a rate needs two frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Frames seen since the connection was established.
    pub frames: u64,
    /// Smoothed frames per second, 0.0 until a second frame arrives.
    pub fps: f64,
    /// Device width from the latest frame's metadata.
    pub width: u32,
    /// Device height from the latest frame's metadata.
    pub height: u32,
    last_frame: Option<Instant>,
}

impl FrameStats {
    /// Fold one frame arrival into the estimate.
    pub fn record(&mut self, now: Instant, width: u32, height: u32) {
        self.frames += 1;
        if let Some(prev) = self.last_frame {
            let interval_ms = now.duration_since(prev).as_secs_f64() * 1000.0;
            if interval_ms > 0.0 {
                let instantaneous = 1000.0 / interval_ms;
                self.fps = self.fps * 0.9 + instantaneous * 0.1;
            }
        }
        self.last_frame = Some(now);
        self.width = width;
        self.height = height;
    }

    /// Drop everything, as on reconnect.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
