use std::sync::Arc;

use crate::catalog::{self, TechniqueCatalog};
use crate::datastore::Datastore;
use crate::generator::ContentGenerator;
use crate::identity::IdentityProvider;
use crate::remix_store::RemixStore;
use crate::requirement_store::RequirementStore;
use crate::result_store::ResultStore;

/// Process-wide clients shared by every handler through `web::Data`
pub struct AppState {
    pub catalog: TechniqueCatalog,
    pub requirements: RequirementStore,
    pub results: ResultStore,
    pub remixes: RemixStore,
    pub identity: Arc<dyn IdentityProvider>,
    pub generator: ContentGenerator,
}

impl AppState {
    pub fn new(datastore: Arc<dyn Datastore>, identity: Arc<dyn IdentityProvider>, generator: ContentGenerator) -> Self {
        Self {
            catalog: catalog::builtin().clone(),
            requirements: RequirementStore::new(datastore.clone()),
            results: ResultStore::new(datastore.clone()),
            remixes: RemixStore::new(datastore),
            identity,
            generator,
        }
    }

    pub fn with_catalog(mut self, catalog: TechniqueCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}
