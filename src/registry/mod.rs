//! Named service instances.
//!
//! A [`ServiceRegistry`] hands out one [`ServiceHandle`] per service
//! name for its whole lifetime, so each name has exactly one OAuth flow
//! and one client/paginator pair.

use crate::auth::{
    AuthorizationCallback, CredentialProvider, InMemoryTokenStore, OAuthCredentialProvider,
    TokenStore,
};
use crate::client::{ApiClient, ApiRequest, ApiResponse};
use crate::config::{ClientConfig, ConfigResolver, EnvConfigResolver, FlowKind};
use crate::errors::{AuthenticationError, SlackError, SlackResult};
use crate::pagination::{MergedResponse, Paginator};
use crate::tabulate::{extract_records, project, Table};
use crate::transport::{HttpTransport, ReqwestTransport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

const NO_FIELDS: [&str; 0] = [];

/// Result of routing an authorization callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Token obtained and stored
    Authorized {
        /// Service name
        service: String,
    },
    /// User denied, or the callback could not be completed
    Denied {
        /// Service name
        service: String,
    },
}

impl AuthorizationOutcome {
    /// Text shown to the user on the callback page
    pub fn message(&self) -> String {
        match self {
            Self::Authorized { service } => {
                format!("Success! {} is authorized. You can close this tab.", service)
            }
            Self::Denied { .. } => "Denied. You can close this tab".to_string(),
        }
    }

    /// Whether authorization succeeded
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

/// Everything bound to one service name
pub struct ServiceHandle {
    name: String,
    flow_kind: FlowKind,
    credentials: Arc<dyn CredentialProvider>,
    client: Arc<ApiClient>,
    paginator: Paginator,
}

impl ServiceHandle {
    /// Assemble a handle around an existing client
    pub fn new(
        name: impl Into<String>,
        flow_kind: FlowKind,
        credentials: Arc<dyn CredentialProvider>,
        client: Arc<ApiClient>,
    ) -> Self {
        let paginator = Paginator::new(client.clone());
        Self {
            name: name.into(),
            flow_kind,
            credentials,
            client,
            paginator,
        }
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OAuth variant of this service
    pub fn flow_kind(&self) -> FlowKind {
        self.flow_kind
    }

    /// The single-call client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// The paginator
    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// URL the user visits to grant access
    pub fn authorization_url(&self) -> SlackResult<String> {
        self.credentials.authorization_url()
    }

    /// Complete the consent flow for this service
    pub async fn handle_authorization_callback(
        &self,
        callback: &AuthorizationCallback,
    ) -> SlackResult<bool> {
        self.credentials.handle_authorization_callback(callback).await
    }

    /// Forget the stored credential
    pub async fn reset(&self) -> SlackResult<()> {
        self.credentials.reset().await
    }

    /// Whether a credential is stored, without calling Slack
    pub async fn has_access(&self) -> bool {
        self.credentials.has_access().await
    }

    /// One non-paginated call
    pub async fn get(&self, request: &ApiRequest) -> SlackResult<ApiResponse> {
        self.client.call(request).await
    }

    /// [`get`](Self::get) with cancellation
    pub async fn get_with_cancellation(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> SlackResult<ApiResponse> {
        self.client.call_with_cancellation(request, cancel).await
    }

    /// Every page of a list call, merged
    pub async fn get_paginated(&self, request: &ApiRequest) -> SlackResult<MergedResponse> {
        self.paginator.fetch_all(request).await
    }

    /// [`get_paginated`](Self::get_paginated) with cancellation
    pub async fn get_paginated_with_cancellation(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> SlackResult<MergedResponse> {
        self.paginator
            .fetch_all_with_cancellation(request, cancel)
            .await
    }

    /// Paginate, descend along `key_path`, project to `fields` and flatten
    pub async fn fetch_table<K, F>(
        &self,
        request: &ApiRequest,
        key_path: &[K],
        fields: &[F],
    ) -> SlackResult<Table>
    where
        K: AsRef<str>,
        F: AsRef<str>,
    {
        self.fetch_table_with_cancellation(request, key_path, fields, &CancellationToken::new())
            .await
    }

    /// [`fetch_table`](Self::fetch_table) with cancellation
    #[instrument(skip_all, fields(service = %self.name, endpoint = %request.endpoint()))]
    pub async fn fetch_table_with_cancellation<K, F>(
        &self,
        request: &ApiRequest,
        key_path: &[K],
        fields: &[F],
        cancel: &CancellationToken,
    ) -> SlackResult<Table>
    where
        K: AsRef<str>,
        F: AsRef<str>,
    {
        let merged = self
            .paginator
            .fetch_all_with_cancellation(request, cancel)
            .await?;
        debug!(pages = merged.pages(), "Flattening response");

        let records = extract_records(merged.into_body(), key_path);
        Ok(Table::from_records(&project(&records, fields)))
    }

    /// `conversations.list` as a table of channels
    pub async fn conversations_list<I, K, V>(&self, params: I) -> SlackResult<Table>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = ApiRequest::new("conversations.list").params(params);
        self.fetch_table(&request, &["channels"], &NO_FIELDS).await
    }

    /// `conversations.history` as a table of messages
    pub async fn conversations_history<I, K, V>(&self, params: I) -> SlackResult<Table>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let request = ApiRequest::new("conversations.history").params(params);
        self.fetch_table(&request, &["messages"], &NO_FIELDS).await
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.name)
            .field("flow_kind", &self.flow_kind)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

/// Process-wide map from service name to handle
pub struct ServiceRegistry {
    resolver: Arc<dyn ConfigResolver>,
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
    handles: Mutex<HashMap<String, Arc<ServiceHandle>>>,
}

impl ServiceRegistry {
    /// Create a new registry builder
    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::new()
    }

    /// Registry configured from environment variables
    pub fn from_env() -> SlackResult<Self> {
        Self::builder()
            .config(ClientConfig::from_env()?)
            .resolver(Arc::new(EnvConfigResolver))
            .build()
    }

    /// The client configuration shared by all handles
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle for `name`, created on first use.
    ///
    /// The map stays locked while a new handle is assembled, so
    /// concurrent callers for one name always get the same instance.
    #[instrument(skip(self))]
    pub fn get_or_create(&self, name: &str) -> SlackResult<Arc<ServiceHandle>> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(name) {
            return Ok(handle.clone());
        }

        let service_config = self.resolver.resolve(name)?;
        let flow_kind = service_config.flow_kind();

        let credentials: Arc<dyn CredentialProvider> = Arc::new(OAuthCredentialProvider::new(
            name,
            service_config,
            self.config.clone(),
            self.store.clone(),
            self.transport.clone(),
        ));
        let client = Arc::new(ApiClient::new(
            self.transport.clone(),
            credentials.clone(),
            self.config.clone(),
        ));
        let handle = Arc::new(ServiceHandle::new(name, flow_kind, credentials, client));

        info!(flow = ?flow_kind, "Service registered");
        handles.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Handle for `name` if it was already created
    pub fn get(&self, name: &str) -> Option<Arc<ServiceHandle>> {
        self.handles.lock().get(name).cloned()
    }

    /// Number of created handles
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Whether no handle was created yet
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Names of created handles, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handles.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Route a callback to the service it names and complete the flow
    pub async fn handle_callback(
        &self,
        callback: &AuthorizationCallback,
    ) -> SlackResult<AuthorizationOutcome> {
        let service = callback
            .service()
            .ok_or(SlackError::Authentication(AuthenticationError::UnroutableCallback))?
            .to_string();

        let handle = self.get_or_create(&service)?;
        let outcome = if handle.handle_authorization_callback(callback).await? {
            AuthorizationOutcome::Authorized { service }
        } else {
            AuthorizationOutcome::Denied { service }
        };
        Ok(outcome)
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for ServiceRegistry
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    resolver: Option<Arc<dyn ConfigResolver>>,
    store: Option<Arc<dyn TokenStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
    config: Option<ClientConfig>,
}

impl ServiceRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Where service registrations come from (default: environment)
    pub fn resolver(mut self, resolver: Arc<dyn ConfigResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Where tokens are kept (default: in memory)
    pub fn store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// HTTP transport (default: reqwest)
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Client configuration (default: [`ClientConfig::default`])
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the registry
    pub fn build(self) -> SlackResult<ServiceRegistry> {
        let config = self.config.unwrap_or_default();
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.timeout)?),
        };

        Ok(ServiceRegistry {
            resolver: self.resolver.unwrap_or_else(|| Arc::new(EnvConfigResolver)),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryTokenStore::new())),
            transport,
            config: Arc::new(config),
            handles: Mutex::new(HashMap::new()),
        })
    }
}
