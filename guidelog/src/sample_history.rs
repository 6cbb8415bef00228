//! Bounded history of guide samples behind the live tracking graph.
//!
//! The history stores at most `max_length` samples in a ring. The zoom
//! parameters (`display_length`, `display_height`) only select how many of the
//! newest samples a reader looks at and at which amplitude scale; they never
//! touch stored data.

use shared::config_storage::SettingsStore;
use shared::ring_buffer::{Iter, RingBuffer};

use crate::error::ConfigError;
use crate::stability::{StabilityReport, StabilityStats};

pub const DEFAULT_MIN_LENGTH: usize = 50;
pub const DEFAULT_MAX_LENGTH: usize = 400;
pub const DEFAULT_MIN_HEIGHT: u32 = 1;
pub const DEFAULT_MAX_HEIGHT: u32 = 16;

pub const KEY_MIN_LENGTH: &str = "graph.minLength";
pub const KEY_MAX_LENGTH: &str = "graph.maxLength";
pub const KEY_MIN_HEIGHT: &str = "graph.minHeight";
pub const KEY_MAX_HEIGHT: &str = "graph.maxHeight";

/// One control-loop observation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Camera X offset in pixels
    pub dx: f64,
    /// Camera Y offset in pixels
    pub dy: f64,
    /// Error along the mount RA axis
    pub ra: f64,
    /// Error along the mount Dec axis
    pub dec: f64,
}

impl Sample {
    pub fn new(dx: f64, dy: f64, ra: f64, dec: f64) -> Self {
        Self { dx, dy, ra, dec }
    }
}

/// Chronological read-only view over stored samples.
pub type Window<'a> = Iter<'a, Sample>;

/// Which pair of sample fields the graph plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphMode {
    #[default]
    RaDec,
    DxDy,
}

impl GraphMode {
    /// Labels of the two plotted series.
    pub fn labels(&self) -> (&'static str, &'static str) {
        match self {
            GraphMode::RaDec => ("RA", "Dec"),
            GraphMode::DxDy => ("dx", "dy"),
        }
    }

    fn project(&self, sample: &Sample) -> (f64, f64) {
        match self {
            GraphMode::RaDec => (sample.ra, sample.dec),
            GraphMode::DxDy => (sample.dx, sample.dy),
        }
    }
}

/// Zoom limits for the graph, persisted in the settings store.
///
/// Invalid values never leave the limits half-updated: a rejected value resets
/// its whole min/max pair to the built-in defaults and persists that pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphLimits {
    min_length: usize,
    max_length: usize,
    min_height: u32,
    max_height: u32,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl GraphLimits {
    /// Read limits from the store, applying each setter in turn.
    ///
    /// Missing keys use the defaults. Rejected values are logged and leave the
    /// defaulted pair in place, so this never fails.
    pub fn load(store: &mut dyn SettingsStore) -> Self {
        let mut limits = Self::default();

        let min_length = store.get_int_or(KEY_MIN_LENGTH, DEFAULT_MIN_LENGTH as i64);
        let max_length = store.get_int_or(KEY_MAX_LENGTH, DEFAULT_MAX_LENGTH as i64);
        let min_height = store.get_int_or(KEY_MIN_HEIGHT, DEFAULT_MIN_HEIGHT as i64);
        let max_height = store.get_int_or(KEY_MAX_HEIGHT, DEFAULT_MAX_HEIGHT as i64);

        // Minimums are checked against the stored maximums, not the defaults
        if let Some(n) = usize::try_from(max_length).ok().filter(|&n| n > 1) {
            limits.max_length = n;
        }
        if let Some(n) = u32::try_from(max_height).ok().filter(|&n| n > 1) {
            limits.max_height = n;
        }

        // A rejected minimum resets its pair, and the defaults are kept
        let lengths = limits
            .set_min_length(min_length, store)
            .and_then(|_| limits.set_max_length(max_length, store));
        let heights = limits
            .set_min_height(min_height, store)
            .and_then(|_| limits.set_max_height(max_height, store));
        for err in [lengths, heights].into_iter().filter_map(Result::err) {
            tracing::warn!("Graph settings: {err}");
        }

        limits
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Set the shortest zoom length. Must be at least 1 and below the current
    /// maximum; otherwise both length limits return to their defaults.
    pub fn set_min_length(
        &mut self,
        min_length: i64,
        store: &mut dyn SettingsStore,
    ) -> Result<(), ConfigError> {
        match usize::try_from(min_length) {
            Ok(n) if n >= 1 && n < self.max_length => {
                self.min_length = n;
                persist(store, KEY_MIN_LENGTH, self.min_length as i64);
                Ok(())
            }
            _ => {
                self.reset_lengths(store);
                Err(ConfigError::InvalidLimit {
                    key: KEY_MIN_LENGTH,
                    value: min_length,
                })
            }
        }
    }

    /// Set the history capacity. Must exceed the current minimum length;
    /// otherwise both length limits return to their defaults.
    pub fn set_max_length(
        &mut self,
        max_length: i64,
        store: &mut dyn SettingsStore,
    ) -> Result<(), ConfigError> {
        match usize::try_from(max_length) {
            Ok(n) if n > self.min_length => {
                self.max_length = n;
                persist(store, KEY_MAX_LENGTH, self.max_length as i64);
                Ok(())
            }
            _ => {
                self.reset_lengths(store);
                Err(ConfigError::InvalidLimit {
                    key: KEY_MAX_LENGTH,
                    value: max_length,
                })
            }
        }
    }

    /// Set the smallest amplitude scale. Must be at least 1 and below the
    /// current maximum; otherwise both height limits return to their defaults.
    pub fn set_min_height(
        &mut self,
        min_height: i64,
        store: &mut dyn SettingsStore,
    ) -> Result<(), ConfigError> {
        match u32::try_from(min_height) {
            Ok(n) if n >= 1 && n < self.max_height => {
                self.min_height = n;
                persist(store, KEY_MIN_HEIGHT, self.min_height as i64);
                Ok(())
            }
            _ => {
                self.reset_heights(store);
                Err(ConfigError::InvalidLimit {
                    key: KEY_MIN_HEIGHT,
                    value: min_height,
                })
            }
        }
    }

    /// Set the largest amplitude scale. Must exceed the current minimum
    /// height; otherwise both height limits return to their defaults.
    pub fn set_max_height(
        &mut self,
        max_height: i64,
        store: &mut dyn SettingsStore,
    ) -> Result<(), ConfigError> {
        match u32::try_from(max_height) {
            Ok(n) if n > self.min_height => {
                self.max_height = n;
                persist(store, KEY_MAX_HEIGHT, self.max_height as i64);
                Ok(())
            }
            _ => {
                self.reset_heights(store);
                Err(ConfigError::InvalidLimit {
                    key: KEY_MAX_HEIGHT,
                    value: max_height,
                })
            }
        }
    }

    fn reset_lengths(&mut self, store: &mut dyn SettingsStore) {
        self.min_length = DEFAULT_MIN_LENGTH;
        self.max_length = DEFAULT_MAX_LENGTH;
        persist(store, KEY_MIN_LENGTH, self.min_length as i64);
        persist(store, KEY_MAX_LENGTH, self.max_length as i64);
    }

    fn reset_heights(&mut self, store: &mut dyn SettingsStore) {
        self.min_height = DEFAULT_MIN_HEIGHT;
        self.max_height = DEFAULT_MAX_HEIGHT;
        persist(store, KEY_MIN_HEIGHT, self.min_height as i64);
        persist(store, KEY_MAX_HEIGHT, self.max_height as i64);
    }
}

fn persist(store: &mut dyn SettingsStore, key: &str, value: i64) {
    if let Err(e) = store.set_int(key, value) {
        tracing::warn!("Failed to persist {key} = {value}: {e}");
    }
}

/// Fixed-capacity sample history with graph zoom state.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: RingBuffer<Sample>,
    limits: GraphLimits,
    display_length: usize,
    display_height: u32,
    mode: GraphMode,
}

impl SampleHistory {
    /// Create an empty history whose capacity is `limits.max_length()`.
    pub fn new(limits: GraphLimits) -> Self {
        Self {
            samples: RingBuffer::new(limits.max_length),
            limits,
            display_length: limits.min_length,
            display_height: limits.max_height,
            mode: GraphMode::default(),
        }
    }

    /// Create a history from the limits stored in `store`.
    pub fn from_settings(store: &mut dyn SettingsStore) -> Self {
        Self::new(GraphLimits::load(store))
    }

    pub fn limits(&self) -> &GraphLimits {
        &self.limits
    }

    /// Append one sample, evicting the oldest when full.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of samples holding real data.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Discard history. Storage is reused by later appends.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The newest `min(display_length, len)` samples, oldest first.
    pub fn window(&self) -> Window<'_> {
        self.samples.latest(self.display_length)
    }

    /// Every retained sample, oldest first.
    pub fn retained(&self) -> Window<'_> {
        self.samples.iter()
    }

    pub fn display_length(&self) -> usize {
        self.display_length
    }

    pub fn display_height(&self) -> u32 {
        self.display_height
    }

    /// Double the displayed length, wrapping to the minimum past capacity.
    pub fn zoom_length(&mut self) -> usize {
        self.display_length *= 2;
        if self.display_length > self.limits.max_length {
            self.display_length = self.limits.min_length;
        }
        self.display_length
    }

    /// Double the amplitude scale, wrapping to the minimum past the maximum.
    pub fn zoom_height(&mut self) -> u32 {
        self.display_height = self.display_height.saturating_mul(2);
        if self.display_height > self.limits.max_height {
            self.display_height = self.limits.min_height;
        }
        self.display_height
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    /// Switch between RA/Dec and dx/dy plotting.
    pub fn toggle_mode(&mut self) -> GraphMode {
        self.mode = match self.mode {
            GraphMode::RaDec => GraphMode::DxDy,
            GraphMode::DxDy => GraphMode::RaDec,
        };
        self.mode
    }

    /// The display window projected onto the active mode, scaled by
    /// `sampling` (e.g. arcseconds per pixel).
    pub fn plot_points(&self, sampling: f64) -> impl Iterator<Item = (f64, f64)> + Clone + '_ {
        let mode = self.mode;
        self.window().map(move |s| {
            let (a, b) = mode.project(s);
            (a * sampling, b * sampling)
        })
    }

    /// Statistics over the full retained history.
    pub fn stability(&self) -> StabilityStats {
        StabilityStats::from_samples(self.retained())
    }

    /// Statistics with display scaling applied.
    pub fn stability_report(&self, sampling: f64) -> StabilityReport {
        self.stability().report(sampling)
    }

    /// Label for the length zoom control.
    pub fn length_label(&self) -> String {
        format!("x:{:3}", self.display_length)
    }

    /// Label for the height zoom control; arcseconds are marked when a pixel
    /// scale is in use.
    pub fn height_label(&self, sampling: f64) -> String {
        if sampling != 1.0 {
            format!("y:+/-{}''", self.display_height)
        } else {
            format!("y:+/-{}", self.display_height)
        }
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(GraphLimits::default())
    }
}
