//! Per-project hub handle.
//!
//! # Responsibility
//! - Scope the per-project surfaces (wiki, datasets, webapps) under one key.
//! - Parse listing responses into typed list items.

use crate::client::CanopyClient;
use crate::dataset::{Dataset, DatasetListItem};
use crate::transport::{ApiCall, ApiError, ApiResult};
use crate::webapp::{Webapp, WebappListItem};
use crate::wiki::Wiki;
use serde_json::Value;
use std::fmt::{Debug, Formatter};

/// Handle on one project.
pub struct Project<'a> {
    client: &'a CanopyClient,
    project_key: String,
}

impl Debug for Project<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("project_key", &self.project_key)
            .finish_non_exhaustive()
    }
}

impl<'a> Project<'a> {
    pub(crate) fn new(client: &'a CanopyClient, project_key: String) -> Self {
        Self {
            client,
            project_key,
        }
    }

    /// Project key this handle is scoped to.
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Returns the wiki handle of this project. No call is made.
    pub fn wiki(&self) -> Wiki<'a> {
        Wiki::new(self.client, self.project_key.clone())
    }

    /// Returns a handle on one dataset. No call is made.
    pub fn dataset(&self, dataset_name: impl Into<String>) -> Dataset<'a> {
        Dataset::new(self.client, self.project_key.clone(), dataset_name.into())
    }

    /// Lists the datasets of this project.
    pub fn list_datasets(&self) -> ApiResult<Vec<DatasetListItem<'a>>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "datasets",
        ]))?;
        let Value::Array(entries) = value else {
            return Err(ApiError::InvalidResponse(
                "dataset listing is not an array".to_string(),
            ));
        };
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            items.push(DatasetListItem::from_entry(
                self.client,
                self.project_key.clone(),
                entry,
            )?);
        }
        Ok(items)
    }

    /// Returns a handle on one webapp. No call is made.
    pub fn webapp(&self, webapp_id: impl Into<String>) -> Webapp<'a> {
        Webapp::new(self.client, self.project_key.clone(), webapp_id.into())
    }

    /// Lists the webapps of this project.
    pub fn list_webapps(&self) -> ApiResult<Vec<WebappListItem<'a>>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "webapps",
        ]))?;
        let Value::Array(entries) = value else {
            return Err(ApiError::InvalidResponse(
                "webapp listing is not an array".to_string(),
            ));
        };
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            items.push(WebappListItem::from_entry(
                self.client,
                self.project_key.clone(),
                entry,
            )?);
        }
        Ok(items)
    }
}
