// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SurrealDB storage for clients and the leads they receive.

use crate::config::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use surrealdb::{
    engine::any::{self, Any},
    opt::auth::Root,
    Surreal,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Failed to read clients file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid clients file: {0}")]
    SeedFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A business that receives lead notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    /// Address lead notifications are emailed to
    pub email: String,
    /// Number lead notifications are texted to
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub verified: bool,
    /// Soft-delete marker (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Entry of the clients seed file.
#[derive(Debug, Deserialize)]
struct SeedClient {
    id: Uuid,
    #[serde(flatten)]
    client: Client,
}

/// A recorded lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub client_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Channels that delivered the notification
    pub delivered: Vec<String>,
    pub created_at: String,
}

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    db: Surreal<Any>,
}

impl Database {
    /// Connect using the service configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = any::connect(config.url.as_str()).await?;

        if let (Some(username), Some(password)) = (&config.user, &config.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }

        db.use_ns(config.namespace.as_str())
            .use_db(config.name.as_str())
            .await?;

        Self::init_schema(&db).await?;

        Ok(Self { db })
    }

    /// Embedded in-memory database with default namespace.
    pub async fn memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::default()).await
    }

    async fn init_schema(db: &Surreal<Any>) -> Result<()> {
        db.query(
            r#"
            DEFINE TABLE IF NOT EXISTS clients SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS name ON clients TYPE string;
            DEFINE FIELD IF NOT EXISTS email ON clients TYPE string;
            DEFINE FIELD IF NOT EXISTS phone ON clients TYPE string;
            DEFINE FIELD IF NOT EXISTS website ON clients TYPE option<string>;
            DEFINE FIELD IF NOT EXISTS verified ON clients TYPE bool;
            DEFINE FIELD IF NOT EXISTS deleted_at ON clients TYPE option<string>;
        "#,
        )
        .await?
        .check()?;

        db.query(
            r#"
            DEFINE TABLE IF NOT EXISTS leads SCHEMAFULL;
            DEFINE FIELD IF NOT EXISTS client_id ON leads TYPE string;
            DEFINE FIELD IF NOT EXISTS name ON leads TYPE string;
            DEFINE FIELD IF NOT EXISTS email ON leads TYPE string;
            DEFINE FIELD IF NOT EXISTS phone ON leads TYPE string;
            DEFINE FIELD IF NOT EXISTS message ON leads TYPE option<string>;
            DEFINE FIELD IF NOT EXISTS delivered ON leads TYPE array<string>;
            DEFINE FIELD IF NOT EXISTS created_at ON leads TYPE string;

            DEFINE INDEX IF NOT EXISTS client_idx ON leads COLUMNS client_id;
        "#,
        )
        .await?
        .check()?;

        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        self.db.query("RETURN true").await?.check()?;
        Ok(())
    }

    /// Insert or replace a client.
    pub async fn upsert_client(&self, id: &Uuid, client: &Client) -> Result<()> {
        let _: Option<Client> = self
            .db
            .upsert(("clients", id.to_string()))
            .content(client.clone())
            .await?;
        Ok(())
    }

    /// Look up a client that has not been soft-deleted.
    pub async fn find_active_client(&self, id: &Uuid) -> Result<Option<Client>> {
        let client: Option<Client> = self.db.select(("clients", id.to_string())).await?;
        Ok(client.filter(|c| c.deleted_at.is_none()))
    }

    /// Record a lead.
    pub async fn record_lead(&self, lead: &Lead) -> Result<()> {
        let _: Option<Lead> = self.db.create("leads").content(lead.clone()).await?;
        Ok(())
    }

    /// All leads recorded for a client, oldest first.
    pub async fn leads_for_client(&self, client_id: &Uuid) -> Result<Vec<Lead>> {
        let mut response = self
            .db
            .query("SELECT * FROM leads WHERE client_id = $client_id ORDER BY created_at ASC")
            .bind(("client_id", client_id.to_string()))
            .await?;
        Ok(response.take(0)?)
    }

    /// Upsert every client listed in a JSON seed file.
    pub async fn seed_clients(&self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<SeedClient> = serde_json::from_str(&raw)?;

        for entry in &entries {
            self.upsert_client(&entry.id, &entry.client).await?;
        }

        info!(count = entries.len(), path = %path.display(), "Seeded clients");
        Ok(entries.len())
    }
}
