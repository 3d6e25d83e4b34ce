use crate::model::TimeSlot;

/// Merge sorted overlapping/adjacent slots into disjoint slots.
pub fn merge_overlapping(sorted: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut merged: Vec<TimeSlot> = Vec::new();
    for &slot in sorted {
        if let Some(last) = merged.last_mut()
            && slot.start <= last.end
        {
            last.end = last.end.max(slot.end);
            continue;
        }
        merged.push(slot);
    }
    merged
}

/// Subtract a sorted set of slots from a sorted base set, keeping the
/// uncovered remainder. Both inputs must be sorted by start.
pub fn subtract_intervals(base: &[TimeSlot], to_remove: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(TimeSlot::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(TimeSlot::new(current_start, current_end));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn slot(h1: u32, h2: u32) -> TimeSlot {
        TimeSlot::new(dt(h1, 0), dt(h2, 0))
    }

    #[test]
    fn merge_disjoint_stays_put() {
        let slots = vec![slot(8, 9), slot(10, 11)];
        assert_eq!(merge_overlapping(&slots), slots);
    }

    #[test]
    fn merge_adjacent_and_overlapping() {
        let slots = vec![slot(8, 10), slot(9, 11), slot(11, 12)];
        assert_eq!(merge_overlapping(&slots), vec![slot(8, 12)]);
    }

    #[test]
    fn merge_contained_is_absorbed() {
        let slots = vec![slot(8, 12), slot(9, 10)];
        assert_eq!(merge_overlapping(&slots), vec![slot(8, 12)]);
    }

    #[test]
    fn subtract_middle_splits_base() {
        let free = subtract_intervals(&[slot(8, 18)], &[slot(10, 12)]);
        assert_eq!(free, vec![slot(8, 10), slot(12, 18)]);
    }

    #[test]
    fn subtract_edges() {
        let free = subtract_intervals(&[slot(8, 18)], &[slot(8, 9), slot(17, 18)]);
        assert_eq!(free, vec![slot(9, 17)]);
    }

    #[test]
    fn subtract_everything_leaves_nothing() {
        let free = subtract_intervals(&[slot(9, 10)], &[slot(8, 12)]);
        assert!(free.is_empty());
    }

    #[test]
    fn subtract_nothing_is_identity() {
        let base = vec![slot(9, 10), slot(13, 14)];
        assert_eq!(subtract_intervals(&base, &[]), base);
    }

    #[test]
    fn subtract_back_to_back_keeps_boundary_free() {
        // A slot ending exactly where the base begins removes nothing.
        let free = subtract_intervals(&[slot(10, 12)], &[slot(8, 10)]);
        assert_eq!(free, vec![slot(10, 12)]);
    }
}
