use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::model::{Reservation, ReservationId, TimeSlot};

use super::Error;

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Check the interval invariants and produce the slot: `start < end`, and
/// both instants on the reservation's calendar date.
pub(crate) fn validate_slot(
    date: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<TimeSlot, Error> {
    if start >= end {
        return Err(Error::Validation("reservation end must be after its start"));
    }
    if start.date() != date || end.date() != date {
        return Err(Error::Validation(
            "reservation times must fall on the reservation date",
        ));
    }
    Ok(TimeSlot::new(start, end))
}

/// First active reservation whose slot overlaps the candidate, if any.
/// Cancelled rows never conflict; the caller is responsible for excluding
/// the candidate itself when re-validating an update.
pub(crate) fn find_conflict(existing: &[Reservation], slot: &TimeSlot) -> Option<ReservationId> {
    existing
        .iter()
        .find(|r| r.is_active() && r.slot.overlaps(slot))
        .map(|r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReservationStatus;
    use ulid::Ulid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn slot(h1: u32, h2: u32) -> TimeSlot {
        TimeSlot::new(
            date().and_hms_opt(h1, 0, 0).unwrap(),
            date().and_hms_opt(h2, 0, 0).unwrap(),
        )
    }

    fn active(h1: u32, h2: u32) -> Reservation {
        Reservation {
            id: Ulid::new(),
            laboratory_id: Ulid::new(),
            user_id: Ulid::new(),
            date: date(),
            slot: slot(h1, h2),
            status: ReservationStatus::Active,
            created_at: date().and_hms_opt(0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn validate_rejects_inverted_interval() {
        let err = validate_slot(
            date(),
            date().and_hms_opt(10, 0, 0).unwrap(),
            date().and_hms_opt(9, 0, 0).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn validate_rejects_zero_length() {
        let t = date().and_hms_opt(9, 0, 0).unwrap();
        assert!(validate_slot(date(), t, t).is_err());
    }

    #[test]
    fn validate_rejects_cross_day() {
        let start = date().and_hms_opt(23, 0, 0).unwrap();
        let end = date().succ_opt().unwrap().and_hms_opt(1, 0, 0).unwrap();
        assert!(validate_slot(date(), start, end).is_err());
    }

    #[test]
    fn validate_rejects_wrong_day() {
        let other = date().succ_opt().unwrap();
        let start = other.and_hms_opt(9, 0, 0).unwrap();
        let end = other.and_hms_opt(10, 0, 0).unwrap();
        assert!(validate_slot(date(), start, end).is_err());
    }

    #[test]
    fn conflict_found_on_overlap() {
        let existing = vec![active(9, 10)];
        assert_eq!(
            find_conflict(&existing, &slot(9, 10)),
            Some(existing[0].id)
        );
        assert!(find_conflict(&existing, &slot(8, 10)).is_some());
        assert!(find_conflict(&existing, &slot(9, 11)).is_some());
    }

    #[test]
    fn back_to_back_does_not_conflict() {
        let existing = vec![active(9, 10)];
        assert_eq!(find_conflict(&existing, &slot(10, 11)), None);
        assert_eq!(find_conflict(&existing, &slot(8, 9)), None);
    }

    #[test]
    fn containment_conflicts_both_ways() {
        let existing = vec![active(9, 10)];
        assert!(find_conflict(&existing, &slot(8, 12)).is_some());
        let wide = vec![active(8, 12)];
        assert!(find_conflict(&wide, &slot(9, 10)).is_some());
    }

    #[test]
    fn cancelled_rows_never_conflict() {
        let mut r = active(9, 10);
        r.status = ReservationStatus::Cancelled;
        assert_eq!(find_conflict(&[r], &slot(9, 10)), None);
    }
}
