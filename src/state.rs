use std::path::PathBuf;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::token::TokenService;
use crate::config::Config;
use crate::models::location::LocationUpdate;
use crate::models::parcel::Parcel;
use crate::models::user::{User, UserSummary};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub users: DashMap<Uuid, User>,
    /// Normalized email -> user id. The entry API on this map is what keeps
    /// emails unique.
    pub user_emails: DashMap<String, Uuid>,
    pub parcels: DashMap<Uuid, Parcel>,
    pub location_events_tx: broadcast::Sender<LocationUpdate>,
    pub tokens: TokenService,
    pub metrics: Metrics,
    pub bcrypt_cost: u32,
    pub allow_admin_registration: bool,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (location_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));

        Self {
            users: DashMap::new(),
            user_emails: DashMap::new(),
            parcels: DashMap::new(),
            location_events_tx,
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl_hours),
            metrics: Metrics::new(),
            bcrypt_cost: config.bcrypt_cost,
            allow_admin_registration: config.allow_admin_registration,
            static_dir: PathBuf::from(&config.static_dir),
        }
    }

    pub fn user_summary(&self, id: Uuid) -> Option<UserSummary> {
        self.users.get(&id).map(|entry| UserSummary::from(entry.value()))
    }
}
