//! Periodic reduction of the grid to a scalar activity level.

/// How many simulated frames pass between samples.
pub const SAMPLE_INTERVAL: u64 = 30;

/// Tracks the change in mean concentration between sampling windows.
///
/// Activity is `min(1, |mean_now - mean_prev| * 10)`, a bounded
/// diagnostic signal for visual or audible feedback, never fed back into
/// the simulation.
#[derive(Debug)]
pub struct ActivitySampler {
    frames: u64,
    last_mean: f32,
}

impl ActivitySampler {
    /// Creates a sampler with no history.
    pub fn new() -> Self {
        Self {
            frames: 0,
            last_mean: 0.0,
        }
    }

    /// Records one rendered frame.
    ///
    /// On every 30th frame, `mean_v` is invoked (it may be an expensive
    /// device readback) and the activity level is returned.
    pub fn record_frame(&mut self, mean_v: impl FnOnce() -> f32) -> Option<f32> {
        if !self.frame_due() {
            return None;
        }
        Some(self.update(mean_v()))
    }

    /// Counts one frame; true when this frame should be sampled.
    ///
    /// Split from [`ActivitySampler::update`] so backends can interleave a
    /// device readback between the two calls.
    pub fn frame_due(&mut self) -> bool {
        self.frames += 1;
        self.frames % SAMPLE_INTERVAL == 0
    }

    /// Folds a freshly measured mean into the sampler, returning the
    /// activity level.
    pub fn update(&mut self, mean: f32) -> f32 {
        let activity = ((mean - self.last_mean).abs() * 10.0).min(1.0);
        self.last_mean = mean;
        activity
    }

    /// Forgets history (after a reset or grid reallocation).
    pub fn reset(&mut self) {
        self.frames = 0;
        self.last_mean = 0.0;
    }
}

impl Default for ActivitySampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of a channel buffer.
pub(crate) fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_every_thirtieth_frame() {
        let mut sampler = ActivitySampler::new();
        let mut emitted = 0;
        for _ in 0..90 {
            if sampler.record_frame(|| 0.5).is_some() {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 3);
    }

    #[test]
    fn test_level_is_scaled_delta() {
        let mut sampler = ActivitySampler::new();
        let mut level = None;
        for _ in 0..30 {
            level = sampler.record_frame(|| 0.05).or(level);
        }
        // First window: |0.05 - 0| * 10
        assert!((level.unwrap() - 0.5).abs() < 1e-6);

        for _ in 0..30 {
            level = sampler.record_frame(|| 0.05);
        }
        // Unchanged mean reads as zero activity.
        assert_eq!(level.unwrap(), 0.0);
    }

    #[test]
    fn test_level_is_capped_at_one() {
        let mut sampler = ActivitySampler::new();
        let mut level = None;
        for _ in 0..30 {
            level = sampler.record_frame(|| 0.9);
        }
        assert_eq!(level.unwrap(), 1.0);
    }

    #[test]
    fn test_mean_helper() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.0, 0.5, 1.0]) - 0.5).abs() < 1e-6);
    }
}
