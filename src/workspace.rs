// Process-wide facade. The embedding shell constructs one Workspace at
// startup and calls everything through it; tests isolate state by
// constructing over a fresh data root.
use serde::Serialize;
use tracing::error;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    AppSettings, ConnectionSettings, EntryPatch, GeneratedQuery, QueryLogEntry, QueryOutput,
    TableSchema,
};
use crate::services::ai::{self, AiService, GenerationContext};
use crate::services::database::Dialect;
use crate::services::{QueryDispatcher, SchemaService};
use crate::store::{ConnectionStore, FavoritesStore, HistoryStore, SettingsStore};

/// Inline-error envelope for operations whose failures the UI renders next
/// to the result pane; exactly one of the two fields is set. Everything
/// else signals failure through `Result` and leaves presentation to the
/// caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> From<Result<T, AppError>> for Response<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self {
                error: None,
                data: Some(data),
            },
            Err(e) => {
                error!("{}", e);
                Self {
                    error: Some(e.to_string()),
                    data: None,
                }
            }
        }
    }
}

pub struct Workspace {
    connections: ConnectionStore,
    history: HistoryStore,
    favorites: FavoritesStore,
    settings: SettingsStore,
    dispatcher: QueryDispatcher,
    schema: SchemaService,
    ai: AiService,
}

impl Workspace {
    /// Opens the data root, runs the legacy-history migration, and wires up
    /// every store and service.
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let data_dir = &config.storage.data_dir;
        tokio::fs::create_dir_all(data_dir).await?;

        let settings = SettingsStore::new(data_dir);
        settings.migrate_legacy_history().await?;

        let connections = ConnectionStore::new(data_dir);
        Ok(Self {
            history: HistoryStore::new(data_dir),
            favorites: FavoritesStore::new(data_dir),
            dispatcher: QueryDispatcher::new(connections.clone()),
            schema: SchemaService::new(connections.clone()),
            ai: AiService::new(&config.ai),
            settings,
            connections,
        })
    }

    // Connections

    pub async fn create_connection(
        &self,
        name: &str,
        settings: ConnectionSettings,
    ) -> Result<(), AppError> {
        self.connections.create(name, settings).await
    }

    pub async fn edit_connection(
        &self,
        name: &str,
        settings: ConnectionSettings,
    ) -> Result<(), AppError> {
        self.connections.edit(name, settings).await
    }

    pub async fn get_connection(&self, name: &str) -> Result<ConnectionSettings, AppError> {
        self.connections.get(name).await
    }

    pub async fn list_connections(&self) -> Result<Vec<String>, AppError> {
        self.connections.list().await
    }

    /// Deletes the connection along with its history and favorites.
    pub async fn delete_connection(&self, name: &str) -> Result<(), AppError> {
        self.connections.delete(name).await
    }

    pub async fn connection_prompt_extension(
        &self,
        name: &str,
    ) -> Result<Option<String>, AppError> {
        self.connections.prompt_extension(name).await
    }

    // History

    pub async fn history(&self, connection_name: &str) -> Result<Vec<QueryLogEntry>, AppError> {
        self.history.list(connection_name).await
    }

    pub async fn append_history(
        &self,
        connection_name: &str,
        entry: QueryLogEntry,
    ) -> Result<(), AppError> {
        self.history.append(connection_name, entry).await
    }

    pub async fn update_history(
        &self,
        connection_name: &str,
        id: &str,
        patch: EntryPatch,
    ) -> Result<(), AppError> {
        self.history.update(connection_name, id, patch).await
    }

    // Favorites

    pub async fn favorites(&self, connection_name: &str) -> Result<Vec<QueryLogEntry>, AppError> {
        self.favorites.list(connection_name).await
    }

    pub async fn add_favorite(
        &self,
        connection_name: &str,
        entry: QueryLogEntry,
    ) -> Result<(), AppError> {
        self.favorites.add(connection_name, entry).await
    }

    pub async fn remove_favorite(&self, connection_name: &str, id: &str) -> Result<(), AppError> {
        self.favorites.remove(connection_name, id).await
    }

    pub async fn update_favorite(
        &self,
        connection_name: &str,
        id: &str,
        patch: EntryPatch,
    ) -> Result<(), AppError> {
        self.favorites.update(connection_name, id, patch).await
    }

    // Global settings

    pub async fn app_settings(&self) -> Result<AppSettings, AppError> {
        self.settings.read().await
    }

    pub async fn update_app_settings(&self, settings: &AppSettings) -> Result<(), AppError> {
        self.settings.write(settings).await
    }

    // Query, schema, and generation calls deliver the inline-error envelope.

    /// Runs SQL against the named connection. Recording the run in history
    /// is the caller's separate step, mirroring the editor flow.
    pub async fn run_query(&self, connection_name: &str, sql: &str) -> Response<QueryOutput> {
        self.dispatcher.run(connection_name, sql).await.into()
    }

    pub async fn fetch_schema(&self, connection_name: &str) -> Response<Vec<TableSchema>> {
        self.schema.describe(connection_name).await.into()
    }

    /// The pseudo-DDL rendering of the catalog, as fed to the model.
    pub async fn fetch_schema_ddl(&self, connection_string: &str) -> Response<String> {
        self.schema.render_ddl(connection_string).await.into()
    }

    pub async fn test_connection(&self, connection_string: &str) -> Response<bool> {
        self.dispatcher
            .test_connection(connection_string)
            .await
            .map(|()| true)
            .into()
    }

    pub async fn generate_query(
        &self,
        connection_name: &str,
        prompt: &str,
        current_query: Option<&str>,
    ) -> Response<GeneratedQuery> {
        self.generate(connection_name, prompt, current_query)
            .await
            .into()
    }

    async fn generate(
        &self,
        connection_name: &str,
        prompt: &str,
        current_query: Option<&str>,
    ) -> Result<GeneratedQuery, AppError> {
        let settings = self.settings.read().await?;
        // A missing API key fails before any introspection round trip.
        ai::ensure_configured(&settings)?;

        let connection = self.connections.get(connection_name).await?;
        let dialect = Dialect::infer(&connection.connection_string)?;
        let schema_ddl = self.schema.render_ddl(&connection.connection_string).await?;

        let context = GenerationContext {
            dialect,
            schema_ddl,
            prompt_extension: connection.prompt_extension,
            current_query: current_query.map(str::to_string),
        };
        self.ai.generate(&settings, &context, prompt).await
    }
}
