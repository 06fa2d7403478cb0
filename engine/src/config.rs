//! Policy knobs for the search driver, layered the way
//! `utils::cli::CommandLineConfig` is: a plain struct with a `Default`
//! impl, usable standalone or flattened into a `clap::Parser` binary.

use clap::Args;

use crate::geometry::Size;

#[derive(Args, Debug, Clone, Copy, PartialEq)]
pub struct PathfinderConfig {
    /// Soft timeout (ms) after which the driver stops, but only once a
    /// segment far enough from `start` to not be a failure has been found.
    #[arg(long, default_value_t = 500)]
    pub primary_timeout_ms: u64,

    /// Hard timeout (ms); the driver stops unconditionally past this.
    #[arg(long, default_value_t = 30_000)]
    pub failure_timeout_ms: u64,

    /// How many popped nodes elapse between clock/cancellation checks.
    #[arg(long, default_value_t = 64)]
    pub timeout_check_interval: u32,

    /// Smallest cube size the shrink phase is allowed to emit (never X1:
    /// see the neighbor-enumeration stop rule).
    #[arg(skip = Size::X2)]
    pub min_neighbor_size: Size,

    /// Worker count for the bounded parallel chunk-prefetch pool.
    #[arg(long, default_value_t = 4)]
    pub prefetch_threads: usize,

    /// Minimum distance from `start` a best-so-far node must reach for a
    /// timed-out/canceled search to return a `Segment` instead of `None`.
    #[arg(long, default_value_t = 5.0)]
    pub min_segment_distance: f64,

    /// Euclidean radius from `goal` within which a popped node counts as
    /// having reached the goal.
    #[arg(long, default_value_t = 16.0)]
    pub goal_radius: f64,
}

/// Per-call overrides for the two timeout knobs, letting a host vary a
/// single search's budget without rebuilding the `Context` (and its chunk
/// cache) just to change `PathfinderConfig`'s baked-in defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeoutOverrides {
    pub primary_timeout_ms: Option<u64>,
    pub failure_timeout_ms: Option<u64>,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            primary_timeout_ms: 500,
            failure_timeout_ms: 30_000,
            timeout_check_interval: 64,
            min_neighbor_size: Size::X2,
            prefetch_threads: 4,
            min_segment_distance: 5.0,
            goal_radius: 16.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = PathfinderConfig::default();
        assert_eq!(cfg.primary_timeout_ms, 500);
        assert_eq!(cfg.failure_timeout_ms, 30_000);
        assert_eq!(cfg.timeout_check_interval, 64);
        assert_eq!(cfg.min_neighbor_size, Size::X2);
        assert_eq!(cfg.prefetch_threads, 4);
        assert!((cfg.min_segment_distance - 5.0).abs() < f64::EPSILON);
        assert!((cfg.goal_radius - 16.0).abs() < f64::EPSILON);
    }
}
