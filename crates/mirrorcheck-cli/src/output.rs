//! Formatted output helpers for CLI commands.

use std::time::Duration;

/// Formats a duration for humans (e.g., "850ms", "4.2s", "3m 07s").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if duration.as_secs() < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Line reporting a passed scenario.
#[must_use]
pub fn passed(name: &str, duration: Duration) -> String {
    format!("PASS  {name} ({})", format_duration(duration))
}

/// Line reporting a failed scenario.
#[must_use]
pub fn failed(name: &str) -> String {
    format!("FAIL  {name}")
}

/// Final line of a run. Scenarios skipped after a failure are counted.
#[must_use]
pub fn summary(ran: usize, failed: usize, total: usize) -> String {
    let skipped = total.saturating_sub(ran);
    let mut line = format!("{} passed, {failed} failed", ran.saturating_sub(failed));
    if skipped > 0 {
        line.push_str(&format!(", {skipped} skipped"));
    }
    line
}

/// Line reporting a passed preflight check.
#[must_use]
pub fn check_ok(label: &str, detail: &str) -> String {
    format!("[ok]   {label:<18} {detail}")
}

/// Line reporting a failed preflight check.
#[must_use]
pub fn check_failed(label: &str, detail: &str) -> String {
    format!("[fail] {label:<18} {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_displays_millis() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
    }

    #[test]
    fn format_duration_displays_seconds() {
        assert_eq!(format_duration(Duration::from_millis(4_200)), "4.2s");
    }

    #[test]
    fn format_duration_displays_minutes() {
        assert_eq!(format_duration(Duration::from_secs(187)), "3m 07s");
    }

    #[test]
    fn summary_counts_skipped_scenarios() {
        assert_eq!(summary(1, 1, 2), "0 passed, 1 failed, 1 skipped");
        assert_eq!(summary(2, 0, 2), "2 passed, 0 failed");
    }

    #[test]
    fn check_lines_align_labels() {
        assert_eq!(check_ok("artifacts", "."), "[ok]   artifacts          .");
        assert!(check_failed("registry binary", "missing").starts_with("[fail] registry binary"));
    }
}
