//! Final ordering of the aggregated record set
//!
//! Records are ordered by `(date, time)` as plain strings. Ties fall back to
//! the whole cleaned line and then the label, which makes the order total:
//! the same input always produces the same output regardless of how the
//! ingest workers were scheduled.

use rayon::prelude::*;
use std::cmp::Ordering;

use crate::config::FilterConfig;
use crate::normalize::NormalizedRecord;

/// Total order over records
pub fn compare_records(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    a.sort_key()
        .cmp(&b.sort_key())
        .then_with(|| a.cleaned_line().cmp(b.cleaned_line()))
        .then_with(|| a.label().cmp(b.label()))
}

/// Drop records that fail the include filter. Ingestion already applies the
/// same check, so this only matters for records that entered another way.
pub fn retain_included(records: &mut Vec<NormalizedRecord>, filter: &FilterConfig) {
    if filter.include().is_none() {
        return;
    }
    *records = std::mem::take(records)
        .into_par_iter()
        .filter(|record| filter.includes(record.cleaned_line()))
        .collect();
}

/// Sort in place using rayon's parallel sort
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.par_sort_unstable_by(compare_records);
}

/// Apply the final include pass and sort
pub fn finalize(mut records: Vec<NormalizedRecord>, filter: &FilterConfig) -> Vec<NormalizedRecord> {
    retain_included(&mut records, filter);
    sort_records(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_line;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn record(line: &str, label: &str) -> NormalizedRecord {
        normalize_line(line, &Arc::from(label)).unwrap()
    }

    #[test]
    fn orders_by_date_then_time() {
        let mut records = vec![
            record("20240102;0100;c", "A"),
            record("20240101;0900;b", "B"),
            record("20240101;0800;a", "A"),
        ];
        sort_records(&mut records);
        let lines: Vec<String> = records.iter().map(|r| r.output_line()).collect();
        assert_eq!(
            lines,
            vec!["20240101;0800;a;A", "20240101;0900;b;B", "20240102;0100;c;A"]
        );
    }

    #[test]
    fn time_compares_as_string_not_number() {
        let mut records = vec![record("20240101;9;late", "A"), record("20240101;10;early", "A")];
        sort_records(&mut records);
        assert_eq!(records[0].time_part(), "10");
        assert_eq!(records[1].time_part(), "9");
    }

    #[test]
    fn ties_break_on_line_then_label() {
        let mut records = vec![
            record("20240101;0800;same", "B"),
            record("20240101;0800;zzz", "A"),
            record("20240101;0800;same", "A"),
        ];
        sort_records(&mut records);
        let lines: Vec<String> = records.iter().map(|r| r.output_line()).collect();
        assert_eq!(
            lines,
            vec![
                "20240101;0800;same;A",
                "20240101;0800;same;B",
                "20240101;0800;zzz;A"
            ]
        );
    }

    #[test]
    fn final_pass_drops_non_matching_records() {
        let filter = FilterConfig::new(Some("keep"), Vec::<String>::new());
        let records = vec![
            record("20240102;0100;KEEP me", "A"),
            record("20240101;0100;drop me", "A"),
            record("20240101;0000;keep too", "B"),
        ];
        let result = finalize(records, &filter);
        let lines: Vec<String> = result.iter().map(|r| r.output_line()).collect();
        assert_eq!(lines, vec!["20240101;0000;keep too;B", "20240102;0100;KEEP me;A"]);
    }

    proptest! {
        #[test]
        fn sorted_output_is_ordered_and_complete(
            rows in proptest::collection::vec(("[0-9]{8}", "[0-9]{0,4}", "[a-z]{0,3}", "[AB]"), 0..200)
        ) {
            let records: Vec<NormalizedRecord> = rows
                .iter()
                .map(|(date, time, rest, label)| record(&format!("{};{};{}", date, time, rest), label))
                .collect();
            let mut expected: Vec<String> = records.iter().map(|r| r.output_line()).collect();
            expected.sort();

            let sorted = finalize(records, &FilterConfig::default());

            for pair in sorted.windows(2) {
                prop_assert!(pair[0].sort_key() <= pair[1].sort_key());
            }
            let mut actual: Vec<String> = sorted.iter().map(|r| r.output_line()).collect();
            actual.sort();
            prop_assert_eq!(actual, expected);
        }
    }
}
