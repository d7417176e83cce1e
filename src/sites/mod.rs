//! Site creation: draft validation, the add-site dialog state machine, and
//! the persistence seam it submits through.

mod form;
mod validation;

pub use form::*;
pub use validation::*;

use crate::db::{DbError, NewSite, Store};

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`SitesService`].
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
}

/// The `addSite` operation the dialog submits through.
pub trait SitesService: Send + Sync {
    fn add_site(&self, site: &NewSite) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// [`SitesService`] backed by the SQLite store.
#[derive(Clone)]
pub struct StoreSites {
    store: Arc<Store>,
}

impl StoreSites {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl SitesService for StoreSites {
    async fn add_site(&self, site: &NewSite) -> Result<(), PersistenceError> {
        let stored = self.store.add_site(site)?;
        tracing::info!(id = stored.id, name = %stored.name, "Site added");
        Ok(())
    }
}
