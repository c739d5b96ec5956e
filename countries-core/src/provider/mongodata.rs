use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{config::FavoritesConfig, error::Result, http};

use super::{FavoriteStore, ProviderId};

const PROVIDER: ProviderId = ProviderId::MongoData;

/// Favourites collection reached through the document store's HTTP Data API.
#[derive(Debug, Clone)]
pub struct MongoDataStore {
    base_url: String,
    api_key: String,
    data_source: String,
    database: String,
    collection: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct MdRequest<'a> {
    #[serde(rename = "dataSource")]
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    #[serde(flatten)]
    body: Value,
}

#[derive(Debug, Deserialize)]
struct MdDocument {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MdFindResponse {
    documents: Vec<MdDocument>,
}

impl MongoDataStore {
    pub fn new(http: Client, config: &FavoritesConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key,
            data_source: config.data_source.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            http,
        }
    }

    async fn action(&self, action: &str, body: Value) -> Result<reqwest::Response> {
        let url = format!("{}/action/{action}", self.base_url.trim_end_matches('/'));
        let request = self
            .http
            .post(url)
            .header("api-key", self.api_key.as_str())
            .json(&MdRequest {
                data_source: &self.data_source,
                database: &self.database,
                collection: &self.collection,
                body,
            });

        http::send(PROVIDER, action, request).await
    }
}

#[async_trait]
impl FavoriteStore for MongoDataStore {
    async fn insert(&self, name: &str) -> Result<()> {
        let res = self.action("insertOne", json!({ "document": { "name": name } })).await?;
        http::success_body(PROVIDER, "insertOne", res).await?;
        Ok(())
    }

    async fn upsert(&self, name: &str) -> Result<()> {
        let body = json!({
            "filter": { "name": name },
            "update": { "$set": { "name": name } },
            "upsert": true,
        });
        let res = self.action("updateOne", body).await?;
        http::success_body(PROVIDER, "updateOne", res).await?;
        Ok(())
    }

    async fn delete_one(&self, name: &str) -> Result<()> {
        let res = self.action("deleteOne", json!({ "filter": { "name": name } })).await?;
        http::success_body(PROVIDER, "deleteOne", res).await?;
        Ok(())
    }

    async fn names(&self) -> Result<Vec<String>> {
        let body = json!({ "filter": {}, "projection": { "name": 1 } });
        let res = self.action("find", body).await?;
        let parsed: MdFindResponse = http::success_json(PROVIDER, "find", res).await?;

        Ok(parsed.documents.into_iter().map(|d| d.name).collect())
    }
}
