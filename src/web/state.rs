// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::config::Config;
use crate::pipeline::RunOutput;
use crate::statements::ScreenerClient;
use crate::yahoo::YahooClient;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A finished run kept for preview and download
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub id: Uuid,
    pub output: RunOutput,
}

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub market: Arc<YahooClient>,
    pub statements: Arc<ScreenerClient>,
    latest: Arc<RwLock<Option<StoredRun>>>,
}

impl AppState {
    pub fn new(config: Config, market: YahooClient, statements: ScreenerClient) -> Self {
        Self {
            config: Arc::new(config),
            market: Arc::new(market),
            statements: Arc::new(statements),
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the provider clients from the config
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let market = YahooClient::new()?;
        let statements = ScreenerClient::new(&config.statements_url, config.scrape_timeout())?;
        Ok(Self::new(config, market, statements))
    }

    /// Replace the latest run and return its fresh id
    pub async fn store(&self, output: RunOutput) -> Uuid {
        let id = Uuid::new_v4();
        *self.latest.write().await = Some(StoredRun { id, output });
        id
    }

    /// The latest run, only if it still carries `id`
    pub async fn get(&self, id: Uuid) -> Option<StoredRun> {
        self.latest
            .read()
            .await
            .as_ref()
            .filter(|run| run.id == id)
            .cloned()
    }
}
