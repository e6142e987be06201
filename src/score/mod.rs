//! Composite 0–100 broadband quality score for one hex.
//!
//! Each of four metrics is normalized through a piecewise-linear curve whose
//! breakpoints sit at observed percentiles of the Maryland dataset, then the
//! four normalized scores are blended with fixed weights. Everything here is
//! pure and allocation-free.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub value: f64,
    pub score: f64,
}

const fn bp(value: f64, score: f64) -> Breakpoint {
    Breakpoint { value, score }
}

// Download: p10=280, p50=2000, p90=10000
pub const DOWNLOAD_BREAKPOINTS: [Breakpoint; 7] = [
    bp(150.0, 0.0),
    bp(280.0, 10.0),
    bp(1000.0, 25.0),
    bp(2000.0, 50.0),
    bp(2048.0, 75.0),
    bp(10000.0, 90.0),
    bp(100000.0, 100.0),
];

// Upload: p10=30, p50=880, p90=10000
pub const UPLOAD_BREAKPOINTS: [Breakpoint; 7] = [
    bp(5.0, 0.0),
    bp(30.0, 10.0),
    bp(100.0, 25.0),
    bp(880.0, 50.0),
    bp(2000.0, 75.0),
    bp(10000.0, 90.0),
    bp(100000.0, 100.0),
];

// Providers: p10=5, p50=7, p90=8
pub const PROVIDER_BREAKPOINTS: [Breakpoint; 7] = [
    bp(2.0, 0.0),
    bp(4.0, 20.0),
    bp(5.0, 35.0),
    bp(6.0, 50.0),
    bp(7.0, 70.0),
    bp(8.0, 85.0),
    bp(10.0, 100.0),
];

pub const TECHNOLOGY_BREAKPOINTS: [Breakpoint; 7] = [
    bp(1.0, 0.0),
    bp(2.0, 20.0),
    bp(3.0, 40.0),
    bp(4.0, 55.0),
    bp(5.0, 75.0),
    bp(6.0, 90.0),
    bp(7.0, 100.0),
];

/// Blend weights in whole percent: download, upload, providers, technology.
pub const WEIGHTS_PERCENT: [u32; 4] = [45, 20, 25, 10];

/// Ten color bands, red (poor) to deep green, one per 10 points of score.
pub const SCORE_COLORS: [&str; 10] = [
    "#dc2626", "#ea580c", "#f97316", "#fb923c", "#facc15", "#a3e635", "#4ade80", "#22c55e",
    "#16a34a", "#15803d",
];

/// The four metrics the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HexMetrics {
    pub providers: i32,
    pub max_download: i32,
    pub max_upload: i32,
    pub tech_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub download: f64,
    pub upload: f64,
    pub providers: f64,
    pub technology: f64,
    pub composite: u8,
}

/// Map `value` onto the curve through `breakpoints` (ascending by value).
///
/// Values at or beyond either end clamp to that end's score; in between, the
/// score is linearly interpolated between the two surrounding breakpoints.
pub fn percentile_score(value: f64, breakpoints: &[Breakpoint]) -> f64 {
    let (first, last) = match (breakpoints.first(), breakpoints.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return 0.0,
    };
    if value <= first.value {
        return first.score;
    }
    if value >= last.value {
        return last.score;
    }

    for pair in breakpoints.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if value <= curr.value {
            let ratio = (value - prev.value) / (curr.value - prev.value);
            return prev.score + ratio * (curr.score - prev.score);
        }
    }
    last.score
}

pub fn breakdown(m: &HexMetrics) -> ScoreBreakdown {
    let download = percentile_score(f64::from(m.max_download), &DOWNLOAD_BREAKPOINTS);
    let upload = percentile_score(f64::from(m.max_upload), &UPLOAD_BREAKPOINTS);
    let providers = percentile_score(f64::from(m.providers), &PROVIDER_BREAKPOINTS);
    let technology = percentile_score(f64::from(m.tech_count), &TECHNOLOGY_BREAKPOINTS);

    // Weight in whole percent and divide once, so integral metric scores sum
    // exactly and ties land on an exact .5.
    let [wd, wu, wp, wt] = WEIGHTS_PERCENT.map(f64::from);
    let weighted = (download * wd + upload * wu + providers * wp + technology * wt) / 100.0;

    ScoreBreakdown {
        download,
        upload,
        providers,
        technology,
        // round half away from zero
        composite: weighted.round().clamp(0.0, 100.0) as u8,
    }
}

/// Composite score in `0..=100`.
pub fn score(m: &HexMetrics) -> u8 {
    breakdown(m).composite
}

/// Map color for a score.
pub fn score_color(score: u8) -> &'static str {
    SCORE_COLORS[usize::from(score / 10).min(SCORE_COLORS.len() - 1)]
}
