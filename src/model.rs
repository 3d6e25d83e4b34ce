use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub type LaboratoryId = Ulid;
pub type UserId = Ulid;
pub type ReservationId = Ulid;

/// Half-open time window `[start, end)` on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "TimeSlot start must be before end");
        Self { start, end }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Half-open overlap: back-to-back slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Professor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Professor => "Professor",
            Role::Student => "Student",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            s if s.eq_ignore_ascii_case("admin") => Some(Role::Admin),
            s if s.eq_ignore_ascii_case("professor") => Some(Role::Professor),
            s if s.eq_ignore_ascii_case("student") => Some(Role::Student),
            _ => None,
        }
    }
}

/// The authenticated caller, as extracted from a session token at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Laboratory {
    pub id: LaboratoryId,
    pub name: String,
    pub building: String,
    pub room: String,
    /// Seats in the room. Not a concurrency limit: one reservation owns the
    /// whole laboratory for its slot.
    pub capacity: u32,
}

/// Postal address resolved from a postal-code lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Registration number, unique across users; doubles as the login id.
    pub ra: String,
    pub password_hash: Option<String>,
    /// False until the user completes the password-setup flow.
    pub is_active: bool,
    pub phone: String,
    pub postal_code: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub laboratory_id: LaboratoryId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Reservation projection with laboratory and user display names joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
    pub id: ReservationId,
    pub laboratory_id: LaboratoryId,
    pub laboratory_name: String,
    pub user_id: UserId,
    pub user_name: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub status: ReservationStatus,
}

impl ReservationView {
    pub fn from_parts(r: &Reservation, laboratory_name: String, user_name: String) -> Self {
        Self {
            id: r.id,
            laboratory_id: r.laboratory_id,
            laboratory_name,
            user_id: r.user_id,
            user_name,
            date: r.date,
            slot: r.slot,
            status: r.status,
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub laboratory_id: LaboratoryId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratoryRequest {
    pub name: String,
    pub building: String,
    pub room: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub ra: String,
    pub phone: String,
    pub postal_code: Option<String>,
}

// ── Search filters ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilter {
    /// Case-insensitive substring over laboratory and user names.
    pub keyword: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub order: SortOrder,
    pub page: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaboratoryFilter {
    pub keyword: Option<String>,
    /// Exact building match when set.
    pub building: Option<String>,
    pub order: SortOrder,
    pub page: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    /// Case-insensitive substring over name, email and phone.
    pub keyword: Option<String>,
    pub order: SortOrder,
    pub page: usize,
    pub size: usize,
}

// ── Pagination envelope ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total_count: usize,
    pub page_size: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub previous_page: bool,
    pub next_page: bool,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-sorted result set into one page.
    /// Page numbers are 1-based; out-of-range inputs are clamped.
    pub fn slice(items: Vec<T>, page: usize, size: usize) -> Page<T> {
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        let total_count = items.len();
        let total_pages = total_count.div_ceil(size);
        let results: Vec<T> = items
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .collect();
        Page {
            results,
            total_count,
            page_size: size,
            current_page: page,
            total_pages,
            previous_page: page > 1,
            next_page: page < total_pages,
        }
    }
}

/// Normalize raw paging input: zero means "not provided".
pub fn paging_or_default(page: usize, size: usize) -> (usize, usize) {
    let page = if page == 0 { 1 } else { page };
    let size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
    (page, size.min(MAX_PAGE_SIZE))
}
