use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use crate::model::{
    Laboratory, LaboratoryFilter, LaboratoryId, Reservation, ReservationId, SortOrder, User,
    UserFilter, UserId,
};

use super::Error;

/// Storage seam for laboratories. Implementations report infrastructure
/// trouble as `Error::Dependency`; absence is `Ok(None)`/`Ok(false)`.
#[async_trait]
pub trait LaboratoryStore: Send + Sync {
    async fn get(&self, id: LaboratoryId) -> Result<Option<Laboratory>, Error>;
    async fn list(&self) -> Result<Vec<Laboratory>, Error>;
    async fn insert(&self, lab: Laboratory) -> Result<(), Error>;
    async fn update(&self, lab: Laboratory) -> Result<(), Error>;
    async fn remove(&self, id: LaboratoryId) -> Result<bool, Error>;
    /// Keyword/building filtering and name ordering; paging happens above.
    async fn search(&self, filter: &LaboratoryFilter) -> Result<Vec<Laboratory>, Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, Error>;
    async fn get_by_ra(&self, ra: &str) -> Result<Option<User>, Error>;
    async fn insert(&self, user: User) -> Result<(), Error>;
    async fn update(&self, user: User) -> Result<(), Error>;
    async fn remove(&self, id: UserId) -> Result<bool, Error>;
    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, Error>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>, Error>;
    /// Same-laboratory, same-day rows feeding the conflict check and the
    /// reserved-times projection, ascending by start. `exclude` drops the
    /// reservation re-validating itself on update.
    async fn list_by_lab_and_date(
        &self,
        laboratory_id: LaboratoryId,
        date: NaiveDate,
        exclude: Option<ReservationId>,
        exclude_cancelled: bool,
    ) -> Result<Vec<Reservation>, Error>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, Error>;
    async fn insert(&self, reservation: Reservation) -> Result<(), Error>;
    async fn update(&self, reservation: Reservation) -> Result<(), Error>;
    async fn remove(&self, id: ReservationId) -> Result<bool, Error>;
    /// Inclusive date-range scan, ordered by (date, start) per `order`.
    /// Keyword filtering needs the joined display names, so it lives in the
    /// engine, not here.
    async fn search(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        order: SortOrder,
    ) -> Result<Vec<Reservation>, Error>;
}

/// Process-local store backing tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryStore {
    laboratories: DashMap<LaboratoryId, Laboratory>,
    users: DashMap<UserId, User>,
    reservations: DashMap<ReservationId, Reservation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl LaboratoryStore for InMemoryStore {
    async fn get(&self, id: LaboratoryId) -> Result<Option<Laboratory>, Error> {
        Ok(self.laboratories.get(&id).map(|e| e.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Laboratory>, Error> {
        let mut labs: Vec<Laboratory> =
            self.laboratories.iter().map(|e| e.value().clone()).collect();
        labs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labs)
    }

    async fn insert(&self, lab: Laboratory) -> Result<(), Error> {
        self.laboratories.insert(lab.id, lab);
        Ok(())
    }

    async fn update(&self, lab: Laboratory) -> Result<(), Error> {
        self.laboratories.insert(lab.id, lab);
        Ok(())
    }

    async fn remove(&self, id: LaboratoryId) -> Result<bool, Error> {
        Ok(self.laboratories.remove(&id).is_some())
    }

    async fn search(&self, filter: &LaboratoryFilter) -> Result<Vec<Laboratory>, Error> {
        let mut labs: Vec<Laboratory> = self
            .laboratories
            .iter()
            .map(|e| e.value().clone())
            .filter(|lab| {
                filter
                    .keyword
                    .as_deref()
                    .is_none_or(|kw| contains_ci(&lab.name, kw))
            })
            .filter(|lab| {
                filter
                    .building
                    .as_deref()
                    .is_none_or(|b| lab.building.eq_ignore_ascii_case(b))
            })
            .collect();
        labs.sort_by(|a, b| a.name.cmp(&b.name));
        if filter.order == SortOrder::Desc {
            labs.reverse();
        }
        Ok(labs)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, Error> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn get_by_ra(&self, ra: &str) -> Result<Option<User>, Error> {
        Ok(self
            .users
            .iter()
            .find(|e| e.value().ra == ra)
            .map(|e| e.value().clone()))
    }

    async fn insert(&self, user: User) -> Result<(), Error> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn update(&self, user: User) -> Result<(), Error> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn remove(&self, id: UserId) -> Result<bool, Error> {
        Ok(self.users.remove(&id).is_some())
    }

    async fn search(&self, filter: &UserFilter) -> Result<Vec<User>, Error> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|e| e.value().clone())
            .filter(|u| {
                filter.keyword.as_deref().is_none_or(|kw| {
                    contains_ci(&u.name, kw) || contains_ci(&u.email, kw) || contains_ci(&u.phone, kw)
                })
            })
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        if filter.order == SortOrder::Desc {
            users.reverse();
        }
        Ok(users)
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>, Error> {
        Ok(self.reservations.get(&id).map(|e| e.value().clone()))
    }

    async fn list_by_lab_and_date(
        &self,
        laboratory_id: LaboratoryId,
        date: NaiveDate,
        exclude: Option<ReservationId>,
        exclude_cancelled: bool,
    ) -> Result<Vec<Reservation>, Error> {
        let mut rows: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|e| e.value().clone())
            .filter(|r| r.laboratory_id == laboratory_id && r.date == date)
            .filter(|r| exclude != Some(r.id))
            .filter(|r| !exclude_cancelled || r.is_active())
            .collect();
        rows.sort_by_key(|r| r.slot.start);
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, Error> {
        let mut rows: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|e| e.value().clone())
            .filter(|r| r.user_id == user_id)
            .collect();
        rows.sort_by_key(|r| (r.date, r.slot.start));
        Ok(rows)
    }

    async fn insert(&self, reservation: Reservation) -> Result<(), Error> {
        self.reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn update(&self, reservation: Reservation) -> Result<(), Error> {
        self.reservations.insert(reservation.id, reservation);
        Ok(())
    }

    async fn remove(&self, id: ReservationId) -> Result<bool, Error> {
        Ok(self.reservations.remove(&id).is_some())
    }

    async fn search(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        order: SortOrder,
    ) -> Result<Vec<Reservation>, Error> {
        let mut rows: Vec<Reservation> = self
            .reservations
            .iter()
            .map(|e| e.value().clone())
            .filter(|r| start_date.is_none_or(|d| r.date >= d))
            .filter(|r| end_date.is_none_or(|d| r.date <= d))
            .collect();
        rows.sort_by_key(|r| (r.date, r.slot.start));
        if order == SortOrder::Desc {
            rows.reverse();
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReservationStatus, TimeSlot};
    use ulid::Ulid;

    fn lab(name: &str, building: &str) -> Laboratory {
        Laboratory {
            id: Ulid::new(),
            name: name.into(),
            building: building.into(),
            room: "101".into(),
            capacity: 20,
        }
    }

    fn reservation(lab_id: LaboratoryId, date: NaiveDate, h1: u32, h2: u32) -> Reservation {
        Reservation {
            id: Ulid::new(),
            laboratory_id: lab_id,
            user_id: Ulid::new(),
            date,
            slot: TimeSlot::new(
                date.and_hms_opt(h1, 0, 0).unwrap(),
                date.and_hms_opt(h2, 0, 0).unwrap(),
            ),
            status: ReservationStatus::Active,
            created_at: date.and_hms_opt(0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn lab_search_filters_building() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            LaboratoryStore::insert(&store, lab("Chemistry A", "H10")).await.unwrap();
            LaboratoryStore::insert(&store, lab("Chemistry B", "H11")).await.unwrap();

            let filter = LaboratoryFilter {
                keyword: Some("chemistry".into()),
                building: Some("h10".into()),
                order: SortOrder::Asc,
                ..Default::default()
            };
            let found = LaboratoryStore::search(&store, &filter).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].building, "H10");
        });
    }

    #[test]
    fn day_listing_excludes_other_days_and_cancelled() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let lab_id = Ulid::new();
            let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

            let r1 = reservation(lab_id, date, 9, 10);
            let mut r2 = reservation(lab_id, date, 10, 11);
            r2.status = ReservationStatus::Cancelled;
            let r3 = reservation(lab_id, date.succ_opt().unwrap(), 9, 10);
            for r in [&r1, &r2, &r3] {
                ReservationStore::insert(&store, r.clone()).await.unwrap();
            }

            let rows = store
                .list_by_lab_and_date(lab_id, date, None, true)
                .await
                .unwrap();
            assert_eq!(rows, vec![r1.clone()]);

            // With cancelled rows included, both of the day's rows come back.
            let rows = store
                .list_by_lab_and_date(lab_id, date, None, false)
                .await
                .unwrap();
            assert_eq!(rows.len(), 2);

            // Self-exclusion drops the excluded id.
            let rows = store
                .list_by_lab_and_date(lab_id, date, Some(r1.id), true)
                .await
                .unwrap();
            assert!(rows.is_empty());
        });
    }

    #[test]
    fn range_search_orders_by_date() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let lab_id = Ulid::new();
            let d1 = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
            let d2 = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
            ReservationStore::insert(&store, reservation(lab_id, d2, 9, 10)).await.unwrap();
            ReservationStore::insert(&store, reservation(lab_id, d1, 9, 10)).await.unwrap();

            let asc = ReservationStore::search(&store, None, None, SortOrder::Asc).await.unwrap();
            assert_eq!(asc[0].date, d1);
            let desc = ReservationStore::search(&store, None, None, SortOrder::Desc).await.unwrap();
            assert_eq!(desc[0].date, d2);

            let only_first = ReservationStore::search(&store, Some(d1), Some(d1), SortOrder::Asc)
                .await
                .unwrap();
            assert_eq!(only_first.len(), 1);
            assert_eq!(only_first[0].date, d1);
        });
    }
}
