//! Application state

use std::sync::Arc;

use tw_core::agent::{HttpReasoningClient, ReasoningBackend, ReasoningConfig};
use tw_core::run::{CoordinatorConfig, EventQueueStore, RunCoordinator, ToolResultSink};
use tw_core::tool::{ToolGateway, ToolGatewayConfig, ToolHandlers};

use crate::config::SidecarConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SidecarConfig,
    store: EventQueueStore,
    coordinator: RunCoordinator,
    result_sink: ToolResultSink,
    gateway: ToolGateway,
    tool_handlers: ToolHandlers,
}

impl AppState {
    /// Create state wired to the HTTP reasoning backend at `NODE_URL`
    pub fn new(config: SidecarConfig) -> tw_core::Result<Self> {
        let backend: Option<Arc<dyn ReasoningBackend>> = if config.reasoning_enabled {
            let mut reasoning = ReasoningConfig::new(config.node_url.clone());
            reasoning.timeout = config.reasoning_timeout;
            Some(Arc::new(HttpReasoningClient::new(reasoning)?))
        } else {
            tracing::info!("Reasoning backend disabled, runs will use the fallback reply");
            None
        };
        Self::with_backend(config, backend)
    }

    /// Create state with an explicit reasoning backend
    pub fn with_backend(
        config: SidecarConfig,
        backend: Option<Arc<dyn ReasoningBackend>>,
    ) -> tw_core::Result<Self> {
        let store = EventQueueStore::with_capacity(config.queue_capacity);

        let coordinator = RunCoordinator::new(
            store.clone(),
            backend,
            CoordinatorConfig {
                default_model: config.default_model.clone(),
                reasoning_timeout: config.reasoning_timeout,
                act_grace: config.act_grace,
                ..Default::default()
            },
        );

        let mut gateway_config =
            ToolGatewayConfig::new(config.node_url.clone(), config.shared_token.clone());
        gateway_config.timeout = config.tool_timeout;
        let gateway = ToolGateway::new(gateway_config)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                result_sink: ToolResultSink::new(store.clone()),
                tool_handlers: ToolHandlers::with_defaults(gateway.clone()),
                config,
                store,
                coordinator,
                gateway,
            }),
        })
    }

    pub fn config(&self) -> &SidecarConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &EventQueueStore {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &RunCoordinator {
        &self.inner.coordinator
    }

    pub fn result_sink(&self) -> &ToolResultSink {
        &self.inner.result_sink
    }

    pub fn gateway(&self) -> &ToolGateway {
        &self.inner.gateway
    }

    pub fn tool_handlers(&self) -> &ToolHandlers {
        &self.inner.tool_handlers
    }
}
