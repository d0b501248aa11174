//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod settings;
pub mod users;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub settings: settings::SettingsService,
    pub circulation: circulation::CirculationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let settings = settings::SettingsService::new(repository.clone());
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository, settings.clone()),
            settings,
        }
    }
}
