//! Application state wiring.
//!
//! Every shared handle (HTTP clients, model provider, memory session
//! manager, embedder, vector index) is built once here and passed into the
//! services that use it.

use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;
use tracing::warn;

use firecmd_core::agent::factory::AgentFactory;
use firecmd_core::memory::box_store::BoxMemoryStore;
use firecmd_core::memory::session::MemorySessionManager;
use firecmd_core::tool::ToolRegistry;
use firecmd_core::tool::news::NewsAgentTool;
use firecmd_core::tool::station::FireStationTool;
use firecmd_core::tool::weather::WeatherTool;
use firecmd_core::tool::wiki::WikipediaTool;
use firecmd_core::vector::box_embedder::BoxEmbedder;
use firecmd_core::vector::box_index::BoxVectorIndex;
use firecmd_infra::aws::{AwsAuth, AwsClient};
use firecmd_infra::config::{Secrets, require_memory_id};
use firecmd_infra::llm::create_provider;
use firecmd_infra::memory::agentcore::AgentCoreMemory;
use firecmd_infra::runtime_client::RuntimeClient;
use firecmd_infra::vector::s3vectors::S3VectorIndex;
use firecmd_infra::vector::titan::TitanEmbedder;
use firecmd_infra::web::browser::HttpBrowser;
use firecmd_infra::web::nominatim::NominatimClient;
use firecmd_infra::web::wikipedia::WikipediaClient;
use firecmd_infra::web::windy::{self, WindyClient};
use firecmd_types::config::AssistantConfig;
use firecmd_types::vector::IndexRef;

/// AWS client from environment credentials.
pub fn aws_client(config: &AssistantConfig, http: reqwest::Client) -> anyhow::Result<AwsClient> {
    let auth = AwsAuth::from_env().context(
        "no AWS credentials: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or AWS_BEARER_TOKEN_BEDROCK",
    )?;
    if auth.kind() == "bearer" {
        warn!("Using a Bedrock API key; memory and vector index calls need IAM credentials");
    }
    Ok(AwsClient::new(http, auth, config.region()))
}

/// Embedder and index used by the station tool and the loaders.
pub fn vector_services(config: &AssistantConfig, aws: &AwsClient) -> (Arc<BoxEmbedder>, Arc<BoxVectorIndex>) {
    let embedder = BoxEmbedder::new(TitanEmbedder::new(aws.clone(), &config.station.embedding_model_id));
    let index = BoxVectorIndex::new(S3VectorIndex::new(aws.clone()));
    (Arc::new(embedder), Arc::new(index))
}

/// Shared state of the agent runtime: one factory for every invocation.
#[derive(Clone)]
pub struct RuntimeState {
    pub factory: Arc<AgentFactory>,
}

impl RuntimeState {
    pub fn init(config: &AssistantConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::new();
        let aws = aws_client(config, http.clone())?;
        let provider = Arc::new(create_provider(aws.clone()));

        let memory_id = require_memory_id(config)?;
        let store = Arc::new(BoxMemoryStore::new(AgentCoreMemory::new(aws.clone(), memory_id)));
        let sessions = Arc::new(MemorySessionManager::new(store));

        let (embedder, index) = vector_services(config, &aws);
        let api_key = Secrets::from_env().windy_api_key.unwrap_or_else(|| {
            warn!("{} is not set; weather lookups will fail", windy::API_KEY_VAR);
            SecretString::from(String::new())
        });

        let encoding = config.event_encoding;
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FireStationTool::new(
            embedder,
            index,
            IndexRef::new(&config.station.bucket, &config.station.index),
            config.station.top_k,
            encoding,
        )));
        tools.register(Arc::new(WeatherTool::new(
            Arc::new(WindyClient::new(http.clone(), &config.weather, api_key)),
            Arc::new(NominatimClient::new(http.clone(), &config.geocoder)),
            encoding,
        )));
        tools.register(Arc::new(WikipediaTool::new(
            Arc::new(WikipediaClient::new(http.clone(), &config.encyclopedia.language)),
            config.encyclopedia.summary_chars,
            config.encyclopedia.max_options,
        )));
        tools.register(Arc::new(NewsAgentTool::new(
            Arc::clone(&provider),
            Arc::new(HttpBrowser::new(http)),
            &config.news,
        )));

        let factory = AgentFactory::new(
            &config.agent,
            &config.memory,
            encoding,
            provider,
            sessions,
            Arc::new(tools),
        );
        Ok(Self {
            factory: Arc::new(factory),
        })
    }
}

/// Shared state of the HTTP gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub runtime: Arc<RuntimeClient>,
}

impl GatewayState {
    pub fn init(config: &AssistantConfig) -> anyhow::Result<Self> {
        let local = config
            .gateway
            .runtime_endpoint
            .as_deref()
            .is_some_and(|e| !e.is_empty());
        // A local runtime needs no credentials.
        let aws = if local {
            None
        } else {
            Some(aws_client(config, reqwest::Client::new())?)
        };
        let runtime = RuntimeClient::from_settings(&config.gateway, aws.as_ref())?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}
