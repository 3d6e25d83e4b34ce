//! Input bounds enforced by the engine before touching any collaborator.

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_RA_LEN: usize = 32;
pub const MAX_KEYWORD_LEN: usize = 120;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

pub const MIN_PASSWORD_LEN: usize = 8;
