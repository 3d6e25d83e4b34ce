use ulid::Ulid;

use crate::limits::{MAX_NAME_LEN, MAX_RA_LEN};
use crate::model::{
    Actor, Laboratory, LaboratoryId, LaboratoryRequest, Reservation, ReservationId,
    ReservationRequest, ReservationStatus, ReservationView, User, UserId, UserRequest,
};
use crate::notify::SETUP_PASSWORD_TEMPLATE;
use crate::observability::{
    NOTIFICATIONS_SENT_TOTAL, RESERVATIONS_CANCELLED_TOTAL, RESERVATIONS_CREATED_TOTAL,
    RESERVATION_CONFLICTS_TOTAL,
};

use super::conflict::{find_conflict, now, today, validate_slot};
use super::policy::{authorize_reservation, require_admin, Action};
use super::{Engine, Entity, Error};

impl Engine {
    // ── Reservations ─────────────────────────────────────────────

    /// Book a laboratory slot. Non-admin actors may only book for
    /// themselves. Fails with `Conflict` when the slot overlaps an active
    /// reservation for the same laboratory and day.
    pub async fn create_reservation(
        &self,
        request: ReservationRequest,
        actor: &Actor,
    ) -> Result<ReservationView, Error> {
        if !actor.is_admin() && request.user_id != actor.user_id {
            return Err(Error::Unauthorized(Action::Create));
        }
        let slot = validate_slot(request.date, request.start, request.end)?;
        let lab = self
            .laboratories
            .get(request.laboratory_id)
            .await?
            .ok_or(Error::NotFound(Entity::Laboratory, request.laboratory_id))?;
        let user = self
            .users
            .get(request.user_id)
            .await?
            .ok_or(Error::NotFound(Entity::User, request.user_id))?;

        // Conflict check and insert under the slot lock: a concurrent
        // overlapping create serializes behind us and sees our row.
        let _guards = self
            .lock_slots((request.laboratory_id, request.date), None)
            .await;
        let existing = self
            .reservations
            .list_by_lab_and_date(request.laboratory_id, request.date, None, true)
            .await?;
        if let Some(existing_id) = find_conflict(&existing, &slot) {
            metrics::counter!(RESERVATION_CONFLICTS_TOTAL).increment(1);
            return Err(Error::Conflict {
                laboratory_id: request.laboratory_id,
                date: request.date,
                existing: existing_id,
            });
        }

        let reservation = Reservation {
            id: Ulid::new(),
            laboratory_id: request.laboratory_id,
            user_id: request.user_id,
            date: request.date,
            slot,
            status: ReservationStatus::Active,
            created_at: now(),
            updated_at: None,
        };
        self.reservations.insert(reservation.clone()).await?;

        metrics::counter!(RESERVATIONS_CREATED_TOTAL).increment(1);
        tracing::info!(
            reservation = %reservation.id,
            laboratory = %lab.id,
            user = %user.id,
            date = %reservation.date,
            "reservation created"
        );
        Ok(ReservationView::from_parts(&reservation, lab.name, user.name))
    }

    /// Replace an active reservation's fields, re-validated for conflicts
    /// (excluding itself). The owner is immutable.
    pub async fn update_reservation(
        &self,
        id: ReservationId,
        request: ReservationRequest,
        actor: &Actor,
    ) -> Result<ReservationView, Error> {
        let current = self
            .reservations
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::Reservation, id))?;
        authorize_reservation(actor, &current, Action::Update)?;
        if request.user_id != current.user_id {
            return Err(Error::Validation("reservation owner cannot be changed"));
        }
        if !current.is_active() {
            return Err(Error::Validation("cannot update a cancelled reservation"));
        }

        let slot = validate_slot(request.date, request.start, request.end)?;
        let lab = self
            .laboratories
            .get(request.laboratory_id)
            .await?
            .ok_or(Error::NotFound(Entity::Laboratory, request.laboratory_id))?;
        let user = self
            .users
            .get(current.user_id)
            .await?
            .ok_or(Error::NotFound(Entity::User, current.user_id))?;

        // A move between laboratory/day buckets touches two lock keys.
        let _guards = self
            .lock_slots(
                (request.laboratory_id, request.date),
                Some((current.laboratory_id, current.date)),
            )
            .await;
        let existing = self
            .reservations
            .list_by_lab_and_date(request.laboratory_id, request.date, Some(id), true)
            .await?;
        if let Some(existing_id) = find_conflict(&existing, &slot) {
            metrics::counter!(RESERVATION_CONFLICTS_TOTAL).increment(1);
            return Err(Error::Conflict {
                laboratory_id: request.laboratory_id,
                date: request.date,
                existing: existing_id,
            });
        }

        let updated = Reservation {
            laboratory_id: request.laboratory_id,
            date: request.date,
            slot,
            updated_at: Some(now()),
            ..current
        };
        self.reservations.update(updated.clone()).await?;
        tracing::info!(reservation = %id, "reservation updated");
        Ok(ReservationView::from_parts(&updated, lab.name, user.name))
    }

    /// Logical delete: Active → Cancelled, terminal. Past reservations
    /// cannot be cancelled.
    pub async fn cancel_reservation(&self, id: ReservationId, actor: &Actor) -> Result<(), Error> {
        let mut reservation = self
            .reservations
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::Reservation, id))?;
        authorize_reservation(actor, &reservation, Action::Cancel)?;
        if !reservation.is_active() {
            return Err(Error::Validation("reservation is already cancelled"));
        }
        if reservation.date < today() {
            return Err(Error::Validation("cannot cancel a past reservation"));
        }

        reservation.status = ReservationStatus::Cancelled;
        reservation.updated_at = Some(now());
        self.reservations.update(reservation).await?;

        metrics::counter!(RESERVATIONS_CANCELLED_TOTAL).increment(1);
        tracing::info!(reservation = %id, "reservation cancelled");
        Ok(())
    }

    /// Administrative hard delete. Bypasses the state machine entirely.
    pub async fn delete_reservation(&self, id: ReservationId, actor: &Actor) -> Result<(), Error> {
        require_admin(actor, Action::Delete)?;
        if !self.reservations.remove(id).await? {
            return Err(Error::NotFound(Entity::Reservation, id));
        }
        tracing::info!(reservation = %id, "reservation deleted");
        Ok(())
    }

    // ── Laboratories ─────────────────────────────────────────────

    pub async fn create_laboratory(
        &self,
        request: LaboratoryRequest,
        actor: &Actor,
    ) -> Result<Laboratory, Error> {
        require_admin(actor, Action::ManageLaboratories)?;
        validate_laboratory(&request)?;

        let lab = Laboratory {
            id: Ulid::new(),
            name: request.name,
            building: request.building,
            room: request.room,
            capacity: request.capacity,
        };
        self.laboratories.insert(lab.clone()).await?;
        tracing::info!(laboratory = %lab.id, name = %lab.name, "laboratory created");
        Ok(lab)
    }

    pub async fn update_laboratory(
        &self,
        id: LaboratoryId,
        request: LaboratoryRequest,
        actor: &Actor,
    ) -> Result<Laboratory, Error> {
        require_admin(actor, Action::ManageLaboratories)?;
        validate_laboratory(&request)?;
        let current = self
            .laboratories
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::Laboratory, id))?;

        let lab = Laboratory {
            id: current.id,
            name: request.name,
            building: request.building,
            room: request.room,
            capacity: request.capacity,
        };
        self.laboratories.update(lab.clone()).await?;
        Ok(lab)
    }

    pub async fn delete_laboratory(&self, id: LaboratoryId, actor: &Actor) -> Result<(), Error> {
        require_admin(actor, Action::ManageLaboratories)?;
        if !self.laboratories.remove(id).await? {
            return Err(Error::NotFound(Entity::Laboratory, id));
        }
        tracing::info!(laboratory = %id, "laboratory deleted");
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────

    /// Create an account (inactive, no credential), resolve its address
    /// from the postal code when possible, and send the password-setup
    /// notification carrying a fresh setup token.
    pub async fn create_user(&self, request: UserRequest, actor: &Actor) -> Result<User, Error> {
        require_admin(actor, Action::ManageUsers)?;
        validate_user(&request)?;
        if self.users.get_by_ra(&request.ra).await?.is_some() {
            return Err(Error::Validation("registration number already in use"));
        }

        let address = match &request.postal_code {
            Some(code) => self.resolve_address(code).await,
            None => None,
        };
        let user = User {
            id: Ulid::new(),
            name: request.name,
            email: request.email,
            role: request.role,
            ra: request.ra,
            password_hash: None,
            is_active: false,
            phone: request.phone,
            postal_code: request.postal_code,
            address,
        };
        self.users.insert(user.clone()).await?;

        let token = self.tokens.issue_setup_token(&user)?;
        let link = format!("{}?token={token}", self.auth.setup_link_base);
        let data = serde_json::json!({
            "name": user.name,
            "ra": user.ra,
            "link": link,
        });
        self.notifier
            .send_template_message(&user.email, "Set up your password", SETUP_PASSWORD_TEMPLATE, data)
            .await?;
        metrics::counter!(NOTIFICATIONS_SENT_TOTAL).increment(1);

        tracing::info!(user = %user.id, ra = %user.ra, "user created, setup notification sent");
        Ok(user)
    }

    /// Administrative profile update. The RA is immutable; credential and
    /// activation state are owned by the setup flow and never touched here.
    pub async fn update_user(
        &self,
        id: UserId,
        request: UserRequest,
        actor: &Actor,
    ) -> Result<User, Error> {
        require_admin(actor, Action::ManageUsers)?;
        validate_user(&request)?;
        let current = self
            .users
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::User, id))?;
        if request.ra != current.ra {
            return Err(Error::Validation("registration number cannot be changed"));
        }

        let address = match &request.postal_code {
            Some(code) if request.postal_code != current.postal_code => {
                self.resolve_address(code).await
            }
            Some(_) => current.address.clone(),
            None => None,
        };
        let user = User {
            id: current.id,
            name: request.name,
            email: request.email,
            role: request.role,
            ra: current.ra,
            password_hash: current.password_hash,
            is_active: current.is_active,
            phone: request.phone,
            postal_code: request.postal_code,
            address,
        };
        self.users.update(user.clone()).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: UserId, actor: &Actor) -> Result<(), Error> {
        require_admin(actor, Action::ManageUsers)?;
        if !self.users.remove(id).await? {
            return Err(Error::NotFound(Entity::User, id));
        }
        tracing::info!(user = %id, "user deleted");
        Ok(())
    }

    /// Lookup failure is tolerated: the account is still usable without an
    /// address on file.
    async fn resolve_address(&self, postal_code: &str) -> Option<crate::model::Address> {
        match self.address_lookup.lookup(postal_code).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(postal_code, error = %e, "address lookup failed");
                None
            }
        }
    }
}

fn validate_laboratory(request: &LaboratoryRequest) -> Result<(), Error> {
    if request.name.trim().is_empty() {
        return Err(Error::Validation("laboratory name is required"));
    }
    if request.name.len() > MAX_NAME_LEN {
        return Err(Error::Validation("laboratory name is too long"));
    }
    if request.building.trim().is_empty() {
        return Err(Error::Validation("laboratory building is required"));
    }
    if request.capacity == 0 {
        return Err(Error::Validation("laboratory capacity must be positive"));
    }
    Ok(())
}

fn validate_user(request: &UserRequest) -> Result<(), Error> {
    if request.name.trim().is_empty() {
        return Err(Error::Validation("user name is required"));
    }
    if request.name.len() > MAX_NAME_LEN {
        return Err(Error::Validation("user name is too long"));
    }
    if request.ra.trim().is_empty() {
        return Err(Error::Validation("registration number is required"));
    }
    if request.ra.len() > MAX_RA_LEN {
        return Err(Error::Validation("registration number is too long"));
    }
    if !request.email.contains('@') {
        return Err(Error::Validation("email address is malformed"));
    }
    Ok(())
}
