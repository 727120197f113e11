//! Typed access to one gateway collection (`services`, `routes`, ...)

use std::marker::PhantomData;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gateway::ActionExecutor;
use crate::model::Page;

pub struct Collection<T> {
    executor: ActionExecutor,
    path: String,
    page_size: u32,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            path: self.path.clone(),
            page_size: self.page_size,
            _entity: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(executor: ActionExecutor, path: impl Into<String>, page_size: u32) -> Self {
        Self {
            executor,
            path: path.into(),
            page_size,
            _entity: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Every entity in the collection, following `next` links page by page
    pub async fn list(&self) -> Result<Vec<T>> {
        self.list_filtered(&[]).await
    }

    /// Like [`Collection::list`], with extra query filters such as `custom_id`
    pub async fn list_filtered(&self, filters: &[(&str, &str)]) -> Result<Vec<T>> {
        let size = self.page_size.to_string();
        let mut params = vec![("size", size.as_str())];
        params.extend_from_slice(filters);

        let mut next = Some(with_query(&self.executor.url_for(&self.path), &params)?);
        let mut items = Vec::new();
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let page: Page<T> = serde_json::from_value(self.executor.get(&url).await?)?;
            pages += 1;
            items.extend(page.data);

            if let Some(link) = page.next.filter(|l| !l.is_empty()) {
                let link = with_query(&self.executor.url_for(&link), &[("size", size.as_str())])?;
                if link == url {
                    warn!("Gateway returned the same page link twice for {}, stopping", self.path);
                    break;
                }
                next = Some(link);
            }
        }

        debug!("Listed {} item(s) from {} in {} page(s)", items.len(), self.path, pages);
        Ok(items)
    }

    /// `None` when the gateway answers 404
    pub async fn get(&self, id: &str) -> Result<Option<T>> {
        match self.executor.get(&self.item_path(id)).await {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(&self, entity: &T) -> Result<T> {
        let body = serde_json::to_value(entity)?;
        let created = self.executor.post(&self.path, body).await?;
        Ok(serde_json::from_value(created)?)
    }

    pub async fn update(&self, id: &str, entity: &T) -> Result<T> {
        self.update_fields(id, serde_json::to_value(entity)?).await
    }

    /// PATCH with a prepared body, for updates that must send explicit nulls
    pub async fn update_fields(&self, id: &str, body: Value) -> Result<T> {
        let updated = self.executor.patch(&self.item_path(id), body).await?;
        Ok(serde_json::from_value(updated)?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.executor.delete(&self.item_path(id)).await
    }
}

/// Append query parameters the URL does not already carry
fn with_query(raw: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url =
        Url::parse(raw).map_err(|e| Error::ConfigError(format!("invalid gateway URL '{raw}': {e}")))?;
    let existing: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let missing: Vec<&(&str, &str)> = params
        .iter()
        .filter(|(key, _)| !existing.iter().any(|e| e == key))
        .collect();

    if !missing.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in missing {
            pairs.append_pair(key, value);
        }
    }
    Ok(url.to_string())
}
