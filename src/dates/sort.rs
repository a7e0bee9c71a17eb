use super::CanonicalDate;
use std::cmp::Ordering;

/// Unparsed values sort before everything else and tie with each other, so
/// a stable sort keeps their relative order.
pub(super) fn compare_parsed(a: Option<CanonicalDate>, b: Option<CanonicalDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use crate::dates::{RawDate, compare_dates};
    use std::cmp::Ordering;

    #[test]
    fn unreadable_values_pin_to_the_front() {
        assert_eq!(compare_dates("nope", "2025-04-05"), Ordering::Less);
        assert_eq!(compare_dates("2025-04-05", "nope"), Ordering::Greater);
        assert_eq!(compare_dates("nope", RawDate::Missing), Ordering::Equal);
    }

    #[test]
    fn equal_instants_compare_equal() {
        assert_eq!(
            compare_dates(1_743_897_600_i64, 1_743_897_600_000_i64),
            Ordering::Equal
        );
        assert_eq!(
            compare_dates("2025-04-08T12:30:00+02:00", "2025-04-08T10:30:00Z"),
            Ordering::Equal
        );
    }

    #[test]
    fn mixed_shapes_sort_chronologically() {
        let mut values: Vec<RawDate> = vec![
            "2025-04-08T10:30:00Z".into(),
            1_743_984_000_i64.into(), // 2025-04-07T00:00:00Z
            "bad".into(),
            "05.04.2025".into(),
            1_743_897_600_000_i64.into(), // 2025-04-06T00:00:00Z
            RawDate::Missing,
            "2025-04-06T12:00:00Z".into(),
        ];

        values.sort_by(|a, b| compare_dates(a, b));

        assert_eq!(
            values,
            vec![
                RawDate::from("bad"),
                RawDate::Missing,
                RawDate::from("05.04.2025"),
                RawDate::from(1_743_897_600_000_i64),
                RawDate::from("2025-04-06T12:00:00Z"),
                RawDate::from(1_743_984_000_i64),
                RawDate::from("2025-04-08T10:30:00Z"),
            ]
        );
    }
}
