//! Connection lifecycle and collection access

use docwright_common::{DocwrightError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::collection::CollectionHandle;
use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::mongo::MongoDriver;
use crate::schema::{ModelRef, Schema, ValidatedCollectionName};

/// Owns the driver session and hands out collection handles.
///
/// The connected flag is a plain atomic: concurrent `connect`/`close` calls
/// are not serialized and the last one to finish wins.
pub struct ConnectionManager {
    config: ConnectionConfig,
    driver: Arc<dyn Driver>,
    connected: AtomicBool,
    models: RwLock<HashMap<String, ModelRef>>,
}

impl ConnectionManager {
    /// Manage an arbitrary driver
    pub fn new(config: ConnectionConfig, driver: Arc<dyn Driver>) -> Self {
        Self {
            config,
            driver,
            connected: AtomicBool::new(false),
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Manage a [`MongoDriver`] built from `config`
    pub fn mongodb(config: ConnectionConfig) -> Self {
        let driver = Arc::new(MongoDriver::new(config.clone()));
        Self::new(config, driver)
    }

    /// [`mongodb`](Self::mongodb) with [`ConnectionConfig::from_env`]
    pub fn from_env() -> Self {
        Self::mongodb(ConnectionConfig::from_env())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Establish the driver session; a no-op when already connected.
    ///
    /// # Errors
    ///
    /// Any driver failure is reported as `Connection` and leaves the manager
    /// disconnected.
    #[instrument(skip(self), fields(database = ?self.config.database))]
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        info!("Connecting");
        self.driver.connect().await.map_err(into_connection_error)?;
        self.connected.store(true, Ordering::SeqCst);
        info!("Connected");
        Ok(())
    }

    /// Tear down the driver session; a no-op when not connected
    #[instrument(skip(self), fields(database = ?self.config.database))]
    pub async fn close(&self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        self.driver.close().await.map_err(into_connection_error)?;
        self.connected.store(false, Ordering::SeqCst);
        info!("Connection closed");
        Ok(())
    }

    /// Ask the server to answer, connecting first if needed
    pub async fn ping(&self) -> Result<()> {
        self.connect().await?;
        self.driver.ping().await.map_err(into_connection_error)
    }

    /// Handle on collection `name`, connecting first if needed.
    ///
    /// The handle is bound to the schema registered for `name`, if any.
    #[instrument(skip(self))]
    pub async fn get_collection(&self, name: &str) -> Result<CollectionHandle> {
        let name = ValidatedCollectionName::new(name)?;
        self.connect().await?;

        let schema = self
            .models
            .read()
            .get(name.as_str())
            .map(|model| model.schema().clone());
        Ok(CollectionHandle::new(name, self.driver.clone(), schema))
    }

    /// Register `schema` as the model for collection `name`.
    ///
    /// Local only; no connection is needed. Registering a name again
    /// replaces the previous model. Handles obtained earlier keep the schema
    /// they were created with.
    pub fn create_collection(&self, name: &str, schema: Schema) -> Result<ModelRef> {
        let model = ModelRef::new(ValidatedCollectionName::new(name)?, schema);
        self.models
            .write()
            .insert(model.name().to_string(), model.clone());
        Ok(model)
    }

    /// Registered model for `name`
    pub fn model(&self, name: &str) -> Option<ModelRef> {
        self.models.read().get(name).cloned()
    }
}

fn into_connection_error(err: DocwrightError) -> DocwrightError {
    match err {
        DocwrightError::Connection(_) => err,
        other => DocwrightError::Connection(other.to_string()),
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("database", &self.config.database)
            .field("connected", &self.is_connected())
            .field("models", &self.models.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
