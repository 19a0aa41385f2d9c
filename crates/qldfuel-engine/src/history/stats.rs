//! Rolling 7- and 14-day statistics over a sensor's recorded prices.

use chrono::{DateTime, TimeDelta, Utc};
use qldfuel_core::round1;
use serde::Serialize;

use super::HistorySample;

/// Length of the long window, which is also the query range.
pub const LONG_WINDOW_DAYS: i64 = 14;
pub const SHORT_WINDOW_DAYS: i64 = 7;

/// Low and average over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowStats {
    pub low: f64,
    /// Whole days between the low's timestamp and the evaluation time.
    pub low_age_days: i64,
    /// Arithmetic mean of every valid sample, 1 dp.
    pub average: f64,
}

/// Statistics for one sensor; a window is `None` until it has been computed
/// from at least one valid sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoricalStats {
    pub seven_day: Option<WindowStats>,
    pub fourteen_day: Option<WindowStats>,
}

/// Recomputes both windows from `samples`.
///
/// With no valid samples `previous` is returned untouched. When the 14-day
/// window has data but the last 7 days do not, the previous 7-day value is
/// kept.
#[must_use]
pub fn compute_stats(
    previous: HistoricalStats,
    samples: &[HistorySample],
    now: DateTime<Utc>,
) -> HistoricalStats {
    let points: Vec<(f64, DateTime<Utc>)> = samples
        .iter()
        .filter_map(|s| s.value().map(|v| (v, s.changed_at)))
        .collect();

    let Some(fourteen_day) = window_stats(&points, now) else {
        return previous;
    };

    let cutoff = now - TimeDelta::days(SHORT_WINDOW_DAYS);
    let recent: Vec<(f64, DateTime<Utc>)> =
        points.iter().copied().filter(|(_, at)| *at > cutoff).collect();

    HistoricalStats {
        seven_day: window_stats(&recent, now).or(previous.seven_day),
        fourteen_day: Some(fourteen_day),
    }
}

#[allow(clippy::cast_precision_loss)]
fn window_stats(points: &[(f64, DateTime<Utc>)], now: DateTime<Utc>) -> Option<WindowStats> {
    let (first, rest) = points.split_first()?;
    let (low, low_at) = rest
        .iter()
        .fold(*first, |best, p| if p.0 < best.0 { *p } else { best });
    let sum: f64 = points.iter().map(|(v, _)| v).sum();

    Some(WindowStats {
        low,
        low_age_days: (now - low_at).num_days(),
        average: round1(sum / points.len() as f64),
    })
}
