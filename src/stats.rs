use std::time::Duration;

/// Counters collected while ingesting, sorting and writing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub lines_read: usize,
    pub lines_accepted: usize,
    pub lines_malformed: usize,
    pub lines_excluded: usize,
    pub lines_not_included: usize,
    pub sources_ok: usize,
    pub sources_missing: usize,
    pub sources_failed: usize,
    pub ingest_time: Duration,
    pub sort_time: Duration,
    pub total_time: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold per-source counters into the run totals. Timings are per run and
    /// are not merged.
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.lines_read += other.lines_read;
        self.lines_accepted += other.lines_accepted;
        self.lines_malformed += other.lines_malformed;
        self.lines_excluded += other.lines_excluded;
        self.lines_not_included += other.lines_not_included;
        self.sources_ok += other.sources_ok;
        self.sources_missing += other.sources_missing;
        self.sources_failed += other.sources_failed;
    }

    /// Lines dropped for any reason
    pub fn lines_dropped(&self) -> usize {
        self.lines_malformed + self.lines_excluded + self.lines_not_included
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Lines processed: {} total, {} output, {} dropped ({} malformed, {} excluded, {} not matching filter)",
            self.lines_read,
            self.lines_accepted,
            self.lines_dropped(),
            self.lines_malformed,
            self.lines_excluded,
            self.lines_not_included
        );

        output.push_str(&format!("; Sources: {} read", self.sources_ok));
        if self.sources_missing > 0 {
            output.push_str(&format!(", {} missing", self.sources_missing));
        }
        if self.sources_failed > 0 {
            output.push_str(&format!(", {} failed", self.sources_failed));
        }

        output.push_str(&format!(
            "; ingest {}ms, sort {}ms, total {}ms",
            self.ingest_time.as_millis(),
            self.sort_time.as_millis(),
            self.total_time.as_millis()
        ));

        let ingest_ms = self.ingest_time.as_millis();
        if ingest_ms > 0 && self.lines_read > 0 {
            let lines_per_sec = (self.lines_read as f64 * 1000.0) / ingest_ms as f64;
            output.push_str(&format!(" ({:.0} lines/s)", lines_per_sec));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counters_but_not_timings() {
        let mut total = ProcessingStats {
            ingest_time: Duration::from_millis(7),
            ..ProcessingStats::new()
        };
        let source = ProcessingStats {
            lines_read: 10,
            lines_accepted: 6,
            lines_malformed: 2,
            lines_excluded: 1,
            lines_not_included: 1,
            sources_ok: 1,
            ingest_time: Duration::from_secs(3),
            ..ProcessingStats::new()
        };

        total.merge(&source);
        total.merge(&source);

        assert_eq!(total.lines_read, 20);
        assert_eq!(total.lines_accepted, 12);
        assert_eq!(total.lines_dropped(), 8);
        assert_eq!(total.sources_ok, 2);
        assert_eq!(total.ingest_time, Duration::from_millis(7));
    }

    #[test]
    fn format_mentions_missing_sources_only_when_present() {
        let mut stats = ProcessingStats::new();
        assert!(!stats.format_stats().contains("missing"));

        stats.sources_missing = 2;
        let text = stats.format_stats();
        assert!(text.contains("2 missing"));
        assert!(text.starts_with("Lines processed: 0 total"));
    }

    #[test]
    fn format_reports_dropped_total() {
        let stats = ProcessingStats {
            lines_read: 7,
            lines_accepted: 3,
            lines_malformed: 2,
            lines_excluded: 1,
            lines_not_included: 1,
            ..ProcessingStats::new()
        };
        assert!(stats
            .format_stats()
            .contains("7 total, 3 output, 4 dropped (2 malformed, 1 excluded, 1 not matching filter)"));
    }
}
