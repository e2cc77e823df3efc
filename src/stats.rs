// Streaming FPS estimate: one counter and one timestamp, no history.

use std::time::{Duration, Instant};

const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Read-only snapshot of the renderer's timing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceStats {
    /// Duration of the last compositing call, in milliseconds.
    pub render_time_ms: f64,
    /// Frames per second, recomputed about once per second.
    pub fps: u32,
    /// Frames since the last FPS update.
    pub frame_count: u32,
    /// Start of the current FPS window.
    pub last_frame_time: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct FrameStats {
    stats: PerformanceStats,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and open a new FPS window at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.stats = PerformanceStats { last_frame_time: Some(now), ..PerformanceStats::default() };
    }

    /// Account for one finished frame.
    pub fn record(&mut self, render_time: Duration, now: Instant) {
        let s = &mut self.stats;
        s.render_time_ms = render_time.as_secs_f64() * 1000.0;
        s.frame_count += 1;

        let since = *s.last_frame_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(since);
        if elapsed >= FPS_WINDOW {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            s.fps = (s.frame_count as f64 * 1000.0 / elapsed_ms).round() as u32;
            s.frame_count = 0;
            s.last_frame_time = Some(now);
        }
    }

    pub fn snapshot(&self) -> PerformanceStats {
        self.stats
    }
}
