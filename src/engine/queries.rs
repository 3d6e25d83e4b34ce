use chrono::NaiveDate;
use futures::future::try_join_all;

use crate::limits::MAX_KEYWORD_LEN;
use crate::model::{
    paging_or_default, Actor, Laboratory, LaboratoryFilter, LaboratoryId, Page, Reservation,
    ReservationFilter, ReservationId, ReservationView, TimeSlot, User, UserFilter, UserId,
};

use super::availability::{merge_overlapping, subtract_intervals};
use super::policy::{authorize_reservation, require_admin, Action};
use super::{Engine, Entity, Error};

impl Engine {
    // ── Reservations ─────────────────────────────────────────────

    /// Owner-or-admin read of a single reservation, enriched with display
    /// names.
    pub async fn get_reservation(
        &self,
        id: ReservationId,
        actor: &Actor,
    ) -> Result<ReservationView, Error> {
        let reservation = self
            .reservations
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::Reservation, id))?;
        authorize_reservation(actor, &reservation, Action::Read)?;
        self.enrich(reservation).await
    }

    /// Reporting query over all reservations, admin only. The keyword is a
    /// case-insensitive substring over laboratory and user names; the date
    /// range is inclusive.
    pub async fn search_reservations(
        &self,
        filter: &ReservationFilter,
        actor: &Actor,
    ) -> Result<Page<ReservationView>, Error> {
        require_admin(actor, Action::Search)?;
        if let Some(kw) = &filter.keyword
            && kw.len() > MAX_KEYWORD_LEN
        {
            return Err(Error::Validation("search keyword is too long"));
        }

        let rows = self
            .reservations
            .search(filter.start_date, filter.end_date, filter.order)
            .await?;
        let mut views = self.enrich_all(rows).await?;

        if let Some(kw) = &filter.keyword {
            let kw = kw.to_lowercase();
            views.retain(|v| {
                v.laboratory_name.to_lowercase().contains(&kw)
                    || v.user_name.to_lowercase().contains(&kw)
            });
        }

        let (page, size) = paging_or_default(filter.page, filter.size);
        Ok(Page::slice(views, page, size))
    }

    /// The day's occupied slots for a laboratory, ascending. Purely a
    /// projection: an unknown laboratory simply has no reserved times.
    pub async fn reserved_times(
        &self,
        laboratory_id: LaboratoryId,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, Error> {
        let rows = self
            .reservations
            .list_by_lab_and_date(laboratory_id, date, None, true)
            .await?;
        Ok(rows.into_iter().map(|r| r.slot).collect())
    }

    /// The complement of [`Engine::reserved_times`] inside a query window:
    /// merge the day's active slots and subtract them from the window.
    pub async fn free_times(
        &self,
        laboratory_id: LaboratoryId,
        date: NaiveDate,
        window: TimeSlot,
    ) -> Result<Vec<TimeSlot>, Error> {
        let reserved = self.reserved_times(laboratory_id, date).await?;
        let occupied = merge_overlapping(&reserved);
        Ok(subtract_intervals(&[window], &occupied))
    }

    /// Every reservation owned by the actor, any status, newest day first.
    pub async fn my_reservations(&self, actor: &Actor) -> Result<Vec<ReservationView>, Error> {
        let mut rows = self.reservations.list_by_user(actor.user_id).await?;
        rows.sort_by_key(|r| (r.date, r.slot.start));
        rows.reverse();
        self.enrich_all(rows).await
    }

    // ── Laboratories ─────────────────────────────────────────────

    pub async fn get_laboratory(&self, id: LaboratoryId) -> Result<Laboratory, Error> {
        self.laboratories
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::Laboratory, id))
    }

    pub async fn list_laboratories(&self) -> Result<Vec<Laboratory>, Error> {
        self.laboratories.list().await
    }

    pub async fn search_laboratories(
        &self,
        filter: &LaboratoryFilter,
    ) -> Result<Page<Laboratory>, Error> {
        if let Some(kw) = &filter.keyword
            && kw.len() > MAX_KEYWORD_LEN
        {
            return Err(Error::Validation("search keyword is too long"));
        }
        let labs = self.laboratories.search(filter).await?;
        let (page, size) = paging_or_default(filter.page, filter.size);
        Ok(Page::slice(labs, page, size))
    }

    // ── Users ────────────────────────────────────────────────────

    /// Self-or-admin read of an account.
    pub async fn get_user(&self, id: UserId, actor: &Actor) -> Result<User, Error> {
        if !actor.is_admin() && actor.user_id != id {
            return Err(Error::Unauthorized(Action::ManageUsers));
        }
        self.users
            .get(id)
            .await?
            .ok_or(Error::NotFound(Entity::User, id))
    }

    pub async fn search_users(
        &self,
        filter: &UserFilter,
        actor: &Actor,
    ) -> Result<Page<User>, Error> {
        require_admin(actor, Action::ManageUsers)?;
        if let Some(kw) = &filter.keyword
            && kw.len() > MAX_KEYWORD_LEN
        {
            return Err(Error::Validation("search keyword is too long"));
        }
        let users = self.users.search(filter).await?;
        let (page, size) = paging_or_default(filter.page, filter.size);
        Ok(Page::slice(users, page, size))
    }

    // ── Enrichment ───────────────────────────────────────────────

    /// Join laboratory and user display names onto a reservation. A missing
    /// referent degrades to "unknown" rather than failing the projection.
    pub(crate) async fn enrich(&self, reservation: Reservation) -> Result<ReservationView, Error> {
        let (lab, user) = futures::try_join!(
            self.laboratories.get(reservation.laboratory_id),
            self.users.get(reservation.user_id)
        )?;
        let laboratory_name = lab.map(|l| l.name).unwrap_or_else(|| "unknown".into());
        let user_name = user.map(|u| u.name).unwrap_or_else(|| "unknown".into());
        Ok(ReservationView::from_parts(
            &reservation,
            laboratory_name,
            user_name,
        ))
    }

    pub(crate) async fn enrich_all(
        &self,
        rows: Vec<Reservation>,
    ) -> Result<Vec<ReservationView>, Error> {
        try_join_all(rows.into_iter().map(|r| self.enrich(r))).await
    }
}
