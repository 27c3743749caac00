//! # Weather Cache Connector
//!
//! Connects to the remote cache server and gets or creates the two weather
//! caches:
//!
//! - `weather-simple`: location key to temperature (`f32`)
//! - `weather-query`: location key to [`LocationWeather`], queryable
//!
//! Both caches are volatile and use the distributed-synchronous template.
//! The lifecycle is `connect`, then any number of cache lookups, then
//! `shutdown`.

use std::sync::Arc;

use weather_domain::LocationWeather;

use crate::admin::{AdminFlag, DefaultTemplate};
use crate::cache::RemoteCache;
use crate::config::ConnectionConfig;
use crate::error::{CacheError, Result};
use crate::manager::RemoteCacheManager;
use crate::marshalling::MarshallingContext;
use crate::transport::RemoteCacheTransport;

/// Name of the temperature cache
pub const SIMPLE_CACHE_NAME: &str = "weather-simple";

/// Name of the queryable weather cache
pub const QUERY_CACHE_NAME: &str = "weather-query";

/// Template both caches are created from
pub const CACHE_TEMPLATE: DefaultTemplate = DefaultTemplate::DistSync;

/// Owns the connection to the cache server
#[derive(Debug, Default)]
pub struct CacheConnector {
    config: ConnectionConfig,
    manager: Option<RemoteCacheManager>,
}

impl CacheConnector {
    pub const fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            manager: None,
        }
    }

    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub const fn is_connected(&self) -> bool {
        self.manager.is_some()
    }

    /// Open a connection to the configured servers
    pub async fn connect(&mut self) -> Result<()> {
        tracing::info!(servers = ?self.config.servers, "Connecting to remote cache server");
        let manager = RemoteCacheManager::connect(self.config.clone()).await?;
        self.replace_manager(manager).await
    }

    /// Open a connection over a caller-provided transport
    pub async fn connect_with(&mut self, transport: Arc<dyn RemoteCacheTransport>) -> Result<()> {
        let manager = RemoteCacheManager::start(self.config.clone(), transport).await?;
        self.replace_manager(manager).await
    }

    async fn replace_manager(&mut self, manager: RemoteCacheManager) -> Result<()> {
        if let Some(previous) = self.manager.replace(manager) {
            tracing::warn!("Already connected, stopping the previous connection");
            previous.stop().await?;
        }
        Ok(())
    }

    /// The open connection
    pub fn manager(&self) -> Result<&RemoteCacheManager> {
        self.manager.as_ref().ok_or(CacheError::NotConnected)
    }

    /// Get or create the temperature cache
    pub async fn get_simple_cache(&self) -> Result<RemoteCache<f32>> {
        let manager = self.manager()?;

        tracing::info!(cache = SIMPLE_CACHE_NAME, "Get or create the weather cache");
        manager
            .administration()
            .with_flags(&[AdminFlag::Volatile])
            .get_or_create_cache(SIMPLE_CACHE_NAME, CACHE_TEMPLATE)
            .await
    }

    /// Get or create the queryable weather cache. The `LocationWeather`
    /// schema is registered first so the server can index its values.
    pub async fn get_query_cache(&self) -> Result<RemoteCache<LocationWeather>> {
        let manager = self.manager()?;

        MarshallingContext::init_serialization_context::<LocationWeather>(manager).await?;

        tracing::info!(cache = QUERY_CACHE_NAME, "Get or create the queryable weather cache");
        manager
            .administration()
            .with_flags(&[AdminFlag::Volatile])
            .get_or_create_cache(QUERY_CACHE_NAME, CACHE_TEMPLATE)
            .await
    }

    /// Close the connection. Cache handles obtained before stop working.
    pub async fn shutdown(&mut self) -> Result<()> {
        let manager = self.manager.take().ok_or(CacheError::NotConnected)?;
        tracing::info!("Shutting down remote cache connection");
        manager.stop().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InMemoryTransport, TransportCall};
    use tokio_test::assert_ok;
    use weather_domain::{Location, WeatherCondition};

    async fn connected() -> (CacheConnector, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        let mut connector = CacheConnector::default();
        connector.connect_with(transport.clone()).await.unwrap();
        (connector, transport)
    }

    fn creations(calls: &[TransportCall]) -> Vec<&TransportCall> {
        calls
            .iter()
            .filter(|c| matches!(c, TransportCall::CreateCache { .. }))
            .collect()
    }

    #[tokio::test]
    async fn test_simple_cache_requires_connect() {
        let connector = CacheConnector::default();
        assert!(matches!(
            connector.get_simple_cache().await,
            Err(CacheError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_query_cache_requires_connect() {
        let connector = CacheConnector::default();
        assert!(matches!(
            connector.get_query_cache().await,
            Err(CacheError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_requires_connect() {
        let mut connector = CacheConnector::default();
        assert!(matches!(connector.shutdown().await, Err(CacheError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_fails_when_unreachable() {
        let mut connector = CacheConnector::default();
        let result = connector
            .connect_with(Arc::new(InMemoryTransport::unreachable()))
            .await;
        assert!(matches!(result, Err(CacheError::Transport(_))));
        assert!(!connector.is_connected());
    }

    #[tokio::test]
    async fn test_simple_cache_is_created_once() {
        let (connector, transport) = connected().await;

        let first = connector.get_simple_cache().await.unwrap();
        let second = connector.get_simple_cache().await.unwrap();
        assert_eq!(first.name(), SIMPLE_CACHE_NAME);
        assert_eq!(second.name(), SIMPLE_CACHE_NAME);

        let calls = transport.calls().await;
        assert_eq!(
            creations(&calls),
            vec![&TransportCall::CreateCache {
                name: SIMPLE_CACHE_NAME.to_string(),
                template: DefaultTemplate::DistSync,
                flags: vec![AdminFlag::Volatile],
            }]
        );
        assert_eq!(transport.cache_names().await, vec![SIMPLE_CACHE_NAME.to_string()]);

        // both handles point at the same server-side cache
        first.put("Rome, Italy", &25.0).await.unwrap();
        assert_eq!(second.get("Rome, Italy").await.unwrap(), Some(25.0));
    }

    #[tokio::test]
    async fn test_query_cache_registers_schema_before_provisioning() {
        let (connector, transport) = connected().await;

        let cache = connector.get_query_cache().await.unwrap();
        assert_eq!(cache.name(), QUERY_CACHE_NAME);

        let calls = transport.calls().await;
        assert_eq!(
            calls,
            vec![
                TransportCall::Ping,
                TransportCall::RegisterSchema("weather.proto".to_string()),
                TransportCall::CacheExists(QUERY_CACHE_NAME.to_string()),
                TransportCall::CreateCache {
                    name: QUERY_CACHE_NAME.to_string(),
                    template: DefaultTemplate::DistSync,
                    flags: vec![AdminFlag::Volatile],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_query_cache_stores_location_weather() {
        let (connector, _transport) = connected().await;
        let cache = connector.get_query_cache().await.unwrap();

        let location = Location::new("Toronto", "Canada");
        let weather = LocationWeather::new(-3.5, WeatherCondition::Snowy, &location);
        cache.put(&location.key(), &weather).await.unwrap();

        assert_eq!(cache.get(&location.key()).await.unwrap(), Some(weather));
    }

    #[tokio::test]
    async fn test_both_caches_are_distinct() {
        let (connector, transport) = connected().await;
        assert_ok!(connector.get_simple_cache().await);
        assert_ok!(connector.get_query_cache().await);

        assert_eq!(
            transport.cache_names().await,
            vec![QUERY_CACHE_NAME.to_string(), SIMPLE_CACHE_NAME.to_string()]
        );
        assert_eq!(
            transport.cache_definition(QUERY_CACHE_NAME).await,
            Some((DefaultTemplate::DistSync, vec![AdminFlag::Volatile]))
        );
    }

    #[tokio::test]
    async fn test_shutdown_leaves_connection_unusable() {
        let (mut connector, transport) = connected().await;
        let cache = connector.get_simple_cache().await.unwrap();

        assert_ok!(connector.shutdown().await);
        assert!(!connector.is_connected());
        assert_eq!(transport.calls().await.last(), Some(&TransportCall::Close));

        assert!(matches!(
            connector.get_simple_cache().await,
            Err(CacheError::NotConnected)
        ));
        assert!(matches!(connector.shutdown().await, Err(CacheError::NotConnected)));
        assert!(matches!(cache.get("Rome, Italy").await, Err(CacheError::Stopped)));
    }

    #[tokio::test]
    async fn test_reconnect_stops_previous_connection() {
        let (mut connector, first) = connected().await;
        let stale = connector.get_simple_cache().await.unwrap();

        let second = Arc::new(InMemoryTransport::new());
        connector.connect_with(second.clone()).await.unwrap();

        assert_eq!(first.calls().await.last(), Some(&TransportCall::Close));
        assert!(matches!(stale.size().await, Err(CacheError::Stopped)));
        assert_ok!(connector.get_simple_cache().await);
    }

    #[tokio::test]
    async fn test_lifecycle_over_rest() {
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const BASIC_AUTH: &str = "Basic YWRtaW46cGFzcw==";

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v2/server"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v2/caches/weather-simple"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v2/caches/weather-simple"))
            .and(query_param("template", "org.infinispan.DIST_SYNC"))
            .and(header("flags", "VOLATILE"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v2/caches/weather-simple/Rome"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_string("24.5"))
            .expect(1)
            .mount(&server)
            .await;

        let address = server.address();
        let config = ConnectionConfig::builder()
            .add_server(address.ip().to_string(), address.port())
            .authentication("admin", "pass")
            .build()
            .unwrap();

        let mut connector = CacheConnector::new(config);
        connector.connect().await.unwrap();
        assert!(connector.is_connected());

        let cache = connector.get_simple_cache().await.unwrap();
        assert_eq!(cache.get("Rome").await.unwrap(), Some(24.5));

        assert_ok!(connector.shutdown().await);
        assert!(matches!(cache.get("Rome").await, Err(CacheError::Stopped)));
    }
}
