pub mod auth;
pub mod config;
pub mod engine;
pub mod limits;
pub mod lookup;
pub mod model;
pub mod notify;
pub mod observability;

pub use auth::{AuthConfig, CredentialHasher, LoginResponse, TokenIssuer};
pub use engine::{
    Action, Engine, Entity, Error, InMemoryStore, LaboratoryStore, Registry, ReservationStore,
    UserStore,
};
pub use lookup::AddressLookup;
pub use notify::NotificationSender;
