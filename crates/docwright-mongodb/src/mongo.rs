//! MongoDB driver backed by the official `mongodb` crate

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use futures::TryStreamExt;
use mongodb::{
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument,
        ServerApi, ServerApiVersion,
    },
    Client, Collection, Database,
};
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::config::{ConnectionConfig, PoolConfig};
use crate::driver::{normalize_update, DeleteOutcome, Driver, ReadOptions, UpdateOptions};

/// Client plus the database it was resolved against
struct Session {
    client: Client,
    database: Database,
}

/// [`Driver`] over a `mongodb::Client`.
///
/// The client is created by [`Driver::connect`] and shut down by
/// [`Driver::close`]; pooling is left to the client. At most one client is
/// held at a time.
pub struct MongoDriver {
    config: ConnectionConfig,
    session: RwLock<Option<Session>>,
}

impl MongoDriver {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The live client, if connected
    pub fn client(&self) -> Option<Client> {
        self.session.read().as_ref().map(|s| s.client.clone())
    }

    /// Name of the database in use, if connected
    pub fn database_name(&self) -> Option<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.database.name().to_string())
    }

    /// Store `session`, returning the one it replaces
    fn install(&self, session: Session) -> Option<Session> {
        self.session.write().replace(session)
    }

    fn database(&self) -> Result<Database> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.database.clone())
            .ok_or_else(|| DocwrightError::Connection("Not connected".to_string()))
    }

    fn collection(&self, name: &str) -> Result<Collection<BsonDocument>> {
        Ok(self.database()?.collection(name))
    }
}

async fn client_options(uri: &str, config: &PoolConfig) -> Result<ClientOptions> {
    let mut client_options = ClientOptions::parse(uri)
        .await
        .map_err(|e| DocwrightError::Connection(e.to_string()))?;

    // Apply pool configuration
    if let Some(min) = config.min_pool_size {
        client_options.min_pool_size = Some(min);
    }
    if let Some(max) = config.max_pool_size {
        client_options.max_pool_size = Some(max);
    }
    if let Some(idle) = config.max_idle_time {
        client_options.max_idle_time = Some(idle);
    }
    if let Some(connect) = config.connect_timeout {
        client_options.connect_timeout = Some(connect);
    }
    if let Some(server_sel) = config.server_selection_timeout {
        client_options.server_selection_timeout = Some(server_sel);
    }
    if let Some(app) = &config.app_name {
        client_options.app_name = Some(app.clone());
    }

    // Set stable API version for compatibility
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    Ok(client_options)
}

fn find_options(projection: Option<BsonDocument>, options: ReadOptions) -> FindOptions {
    FindOptions::builder()
        .projection(projection)
        .sort(options.sort)
        .skip(options.skip)
        .limit(options.limit)
        .build()
}

#[async_trait]
impl Driver for MongoDriver {
    #[instrument(skip(self), fields(database = ?self.config.database))]
    async fn connect(&self) -> Result<()> {
        if self.session.read().is_some() {
            return Ok(());
        }

        let options = client_options(&self.config.uri, &self.config.pool).await?;
        let database_name = self
            .config
            .resolve_database(options.default_database.as_deref());
        let client =
            Client::with_options(options).map_err(|e| DocwrightError::Connection(e.to_string()))?;
        let database = client.database(&database_name);

        // Client creation is lazy; make sure a server actually answers
        if let Err(e) = database.run_command(doc! { "ping": 1 }).await {
            warn!(error = %e, "Ping failed during connect");
            client.shutdown().await;
            return Err(DocwrightError::Connection(format!("Ping failed: {}", e)));
        }

        // A concurrent connect may have installed a client meanwhile
        if let Some(replaced) = self.install(Session { client, database }) {
            replaced.client.shutdown().await;
        }
        info!(database = %database_name, "MongoDB client connected");
        Ok(())
    }

    #[instrument(skip(self), fields(database = ?self.config.database))]
    async fn close(&self) -> Result<()> {
        let session = self.session.write().take();
        if let Some(session) = session {
            session.client.shutdown().await;
            info!("MongoDB client shut down");
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.database()?
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocwrightError::Connection(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    async fn insert(&self, collection: &str, mut document: BsonDocument) -> Result<BsonDocument> {
        let result = self.collection(collection)?.insert_one(&document).await?;
        document.insert("_id", result.inserted_id);
        Ok(document)
    }

    async fn find_by_id(&self, collection: &str, id: &Bson) -> Result<Option<BsonDocument>> {
        let found = self
            .collection(collection)?
            .find_one(doc! { "_id": id.clone() })
            .await?;
        Ok(found)
    }

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Vec<BsonDocument>> {
        let cursor = self
            .collection(collection)?
            .find(filter)
            .with_options(find_options(projection, options))
            .await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(docs)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Option<BsonDocument>> {
        let find_one_options = FindOneOptions::builder()
            .projection(projection)
            .sort(options.sort)
            .skip(options.skip)
            .build();
        let found = self
            .collection(collection)?
            .find_one(filter)
            .with_options(find_one_options)
            .await?;
        Ok(found)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>> {
        let return_document = if options.return_new {
            ReturnDocument::After
        } else {
            ReturnDocument::Before
        };
        let update_options = FindOneAndUpdateOptions::builder()
            .upsert(options.upsert)
            .return_document(return_document)
            .build();
        let updated = self
            .collection(collection)?
            .find_one_and_update(filter, normalize_update(update))
            .with_options(update_options)
            .await?;
        Ok(updated)
    }

    async fn delete_one(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        let result = self.collection(collection)?.delete_one(filter).await?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        let result = self.collection(collection)?.delete_many(filter).await?;
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }
}
