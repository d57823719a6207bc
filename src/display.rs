//! Rendering of elapsed time for the live display

/// Render elapsed seconds as `M:SS`, or `H:MM:SS` once an hour has passed.
///
/// Fractions are truncated. Negative and non-finite values are treated as zero.
pub fn format_elapsed(total_seconds: f64) -> String {
    let total = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds.floor() as u64
    } else {
        0
    };

    let seconds = total % 60;
    let minutes = (total / 60) % 60;
    let hours = total / 3600;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
