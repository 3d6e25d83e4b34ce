use crate::model::{Actor, Reservation};

use super::Error;

/// Actions the authorization policy rules on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Cancel,
    Delete,
    Search,
    ManageLaboratories,
    ManageUsers,
    Login,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create a reservation for another user",
            Action::Read => "read the reservation",
            Action::Update => "update the reservation",
            Action::Cancel => "cancel the reservation",
            Action::Delete => "delete the reservation",
            Action::Search => "search reservations",
            Action::ManageLaboratories => "manage laboratories",
            Action::ManageUsers => "manage users",
            Action::Login => "log in",
        }
    }
}

/// Owner-or-admin rule for a specific reservation. Delete is admin-only
/// regardless of ownership.
pub(crate) fn authorize_reservation(
    actor: &Actor,
    reservation: &Reservation,
    action: Action,
) -> Result<(), Error> {
    if actor.is_admin() {
        return Ok(());
    }
    match action {
        Action::Read | Action::Update | Action::Cancel
            if reservation.user_id == actor.user_id =>
        {
            Ok(())
        }
        _ => Err(Error::Unauthorized(action)),
    }
}

/// Admin-only gate for reporting and administrative capabilities.
pub(crate) fn require_admin(actor: &Actor, action: Action) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Unauthorized(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, TimeSlot};
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn reservation_owned_by(user_id: Ulid) -> Reservation {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Reservation {
            id: Ulid::new(),
            laboratory_id: Ulid::new(),
            user_id,
            date,
            slot: TimeSlot::new(
                date.and_hms_opt(9, 0, 0).unwrap(),
                date.and_hms_opt(10, 0, 0).unwrap(),
            ),
            status: crate::model::ReservationStatus::Active,
            created_at: date.and_hms_opt(8, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn owner_may_read_update_cancel() {
        let owner = Actor::new(Ulid::new(), Role::Student);
        let r = reservation_owned_by(owner.user_id);
        for action in [Action::Read, Action::Update, Action::Cancel] {
            assert!(authorize_reservation(&owner, &r, action).is_ok());
        }
    }

    #[test]
    fn owner_may_not_delete() {
        let owner = Actor::new(Ulid::new(), Role::Professor);
        let r = reservation_owned_by(owner.user_id);
        assert_eq!(
            authorize_reservation(&owner, &r, Action::Delete),
            Err(Error::Unauthorized(Action::Delete))
        );
    }

    #[test]
    fn stranger_may_do_nothing() {
        let stranger = Actor::new(Ulid::new(), Role::Student);
        let r = reservation_owned_by(Ulid::new());
        for action in [Action::Read, Action::Update, Action::Cancel, Action::Delete] {
            assert!(authorize_reservation(&stranger, &r, action).is_err());
        }
    }

    #[test]
    fn admin_may_do_everything() {
        let admin = Actor::new(Ulid::new(), Role::Admin);
        let r = reservation_owned_by(Ulid::new());
        for action in [Action::Read, Action::Update, Action::Cancel, Action::Delete] {
            assert!(authorize_reservation(&admin, &r, action).is_ok());
        }
        assert!(require_admin(&admin, Action::Search).is_ok());
    }

    #[test]
    fn non_admin_cannot_search() {
        let actor = Actor::new(Ulid::new(), Role::Professor);
        assert_eq!(
            require_admin(&actor, Action::Search),
            Err(Error::Unauthorized(Action::Search))
        );
    }
}
