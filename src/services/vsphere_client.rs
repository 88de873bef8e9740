//! Thin HTTP session client for the management server's REST surface.
//!
//! Implements the provider traits the core consumes. The session token is
//! obtained once at connect time and held for the client lifetime; there is
//! no retry or backoff here, transport failures propagate to the caller.

use crate::config::ConnectionConfig;
use crate::models::{
    CounterInfo, Datacenter, EntityMetrics, HostInfo, ManagedEntity, ProviderSummary, VmInfo,
};
use crate::services::provider::{InventoryProvider, PerfProvider};
use crate::services::query_builder::QuerySpec;
use crate::utils::{MonitorError, MonitorResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;

const SESSION_HEADER: &str = "vmware-api-session-id";

pub struct VSphereClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    session: RwLock<Option<String>>,
}

impl VSphereClient {
    pub fn new(config: &ConnectionConfig) -> MonitorResult<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if config.insecure {
            // Lab servers commonly run self-signed certificates.
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: format!("https://{}:{}", config.host, config.port),
            username: config.username.clone(),
            password: config.password.clone(),
            session: RwLock::new(None),
        })
    }

    /// Authenticate and store the session token used by every later
    /// request.
    pub async fn connect(&self) -> MonitorResult<()> {
        let url = format!("{}/api/session", self.base_url);
        let response =
            self.http.post(&url).basic_auth(&self.username, Some(&self.password)).send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::session(format!(
                "login to {} failed with status {}",
                self.base_url,
                response.status()
            )));
        }

        let token: String = response.json().await?;
        *self.session.write().await = Some(token);
        tracing::info!("connected to {}", self.base_url);
        Ok(())
    }

    /// Invalidate the session server-side. A client that never connected
    /// is a no-op.
    pub async fn disconnect(&self) -> MonitorResult<()> {
        let Some(token) = self.session.write().await.take() else {
            return Ok(());
        };
        let url = format!("{}/api/session", self.base_url);
        self.http.delete(&url).header(SESSION_HEADER, &token).send().await?;
        tracing::info!("disconnected from {}", self.base_url);
        Ok(())
    }

    async fn session_token(&self) -> MonitorResult<String> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| MonitorError::session("not connected, call connect() first"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> MonitorResult<T> {
        let token = self.session_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(SESSION_HEADER, &token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MonitorError::protocol(format!(
                "GET {} returned status {}",
                path,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> MonitorResult<T> {
        let token = self.session_token().await?;
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(SESSION_HEADER, &token)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MonitorError::protocol(format!(
                "POST {} returned status {}",
                path,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl InventoryProvider for VSphereClient {
    async fn datacenters(&self) -> MonitorResult<Vec<Datacenter>> {
        self.get_json("/api/vcenter/datacenter").await
    }

    async fn hosts(&self) -> MonitorResult<Vec<HostInfo>> {
        self.get_json("/api/vcenter/host").await
    }

    async fn virtual_machines(&self) -> MonitorResult<Vec<VmInfo>> {
        self.get_json("/api/vcenter/vm").await
    }
}

#[async_trait]
impl PerfProvider for VSphereClient {
    async fn counter_catalog(&self) -> MonitorResult<Vec<CounterInfo>> {
        self.get_json("/api/stats/counters").await
    }

    async fn historical_intervals(&self) -> MonitorResult<Vec<i32>> {
        self.get_json("/api/stats/intervals").await
    }

    async fn provider_summary(&self, entity: &ManagedEntity) -> MonitorResult<ProviderSummary> {
        self.get_json(&format!("/api/stats/provider-summary/{}", entity.moid)).await
    }

    async fn available_counters(&self, entity: &ManagedEntity) -> MonitorResult<Vec<i32>> {
        self.get_json(&format!("/api/stats/available/{}", entity.moid)).await
    }

    async fn query_perf(&self, specs: &[QuerySpec]) -> MonitorResult<Vec<EntityMetrics>> {
        self.post_json("/api/stats/query", specs).await
    }

    async fn current_time(&self) -> MonitorResult<DateTime<Utc>> {
        self.get_json("/api/system/time").await
    }
}
