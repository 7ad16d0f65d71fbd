//! Project wiki surface: settings, article content, attachments.
//!
//! # Responsibility
//! - Fetch and persist the wiki settings document around the taxonomy.
//! - Manage article bodies, metadata, attachments, and deletion.
//!
//! # Invariants
//! - A fetched taxonomy is rejected when an article id appears twice.
//! - `save` sends the whole document and adopts the server's answer as the
//!   new local state.
//! - Document fields this crate does not model ride along untouched.
//!
//! # See also
//! - docs/architecture/wiki-taxonomy.md

use crate::client::CanopyClient;
use crate::taxonomy::{Taxonomy, TaxonomyError};
use crate::transport::{decode, ApiCall, ApiError, ApiResult, UploadFile};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{Debug, Formatter};

static ATTACHMENT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid attachment name regex"));

/// Handle on the wiki of one project.
pub struct Wiki<'a> {
    client: &'a CanopyClient,
    project_key: String,
}

impl Debug for Wiki<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiki")
            .field("project_key", &self.project_key)
            .finish_non_exhaustive()
    }
}

impl<'a> Wiki<'a> {
    pub(crate) fn new(client: &'a CanopyClient, project_key: String) -> Self {
        Self {
            client,
            project_key,
        }
    }

    /// Project key this wiki belongs to.
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Fetches the settings document, taxonomy included.
    ///
    /// # Errors
    /// - `ApiError::InvalidResponse` when the document does not match the
    ///   settings shape, or when an article id appears twice in the taxonomy.
    pub fn settings(&self) -> ApiResult<WikiSettings<'a>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "wiki",
        ]))?;
        WikiSettings::from_response(self.client, self.project_key.clone(), value)
    }

    /// Returns a handle on one article. No call is made.
    pub fn article(&self, article_id: impl Into<String>) -> WikiArticle<'a> {
        WikiArticle {
            client: self.client,
            project_key: self.project_key.clone(),
            article_id: article_id.into(),
        }
    }

    /// Creates an article, optionally under a parent and with initial content.
    ///
    /// Content, when given, is written with a follow-up fetch and save of the
    /// new article.
    pub fn create_article(
        &self,
        article_id: &str,
        parent_id: Option<&str>,
        content: Option<&str>,
    ) -> ApiResult<WikiArticle<'a>> {
        let body = json!({
            "projectKey": self.project_key,
            "id": article_id,
            "parent": parent_id,
        });
        self.client.transport().perform_json(
            &ApiCall::post(&["projects", self.project_key.as_str(), "wiki"]).with_body(body),
        )?;

        let article = self.article(article_id);
        if let Some(content) = content {
            let mut data = article.data()?;
            data.set_body(content);
            data.save()?;
        }
        Ok(article)
    }

    /// Handles on every article of the wiki, in taxonomy pre-order.
    pub fn list_articles(&self) -> ApiResult<Vec<WikiArticle<'a>>> {
        let settings = self.settings()?;
        Ok(settings
            .taxonomy()
            .flatten()
            .into_iter()
            .map(|article_id| self.article(article_id))
            .collect())
    }
}

/// Wire shape of the wiki settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSettingsDocument {
    /// The article forest.
    #[serde(default)]
    pub taxonomy: Taxonomy,
    /// Article shown on the wiki landing page. Nullable, always serialized.
    #[serde(rename = "homeArticleId")]
    pub home_article_id: Option<String>,
    /// Server-owned fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Owning store for the wiki settings of one project.
///
/// The store holds the document exclusively between fetch and save. Edits
/// stay local until [`WikiSettings::save`] persists the whole document.
pub struct WikiSettings<'a> {
    client: &'a CanopyClient,
    project_key: String,
    document: WikiSettingsDocument,
}

impl Debug for WikiSettings<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiSettings")
            .field("project_key", &self.project_key)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl<'a> WikiSettings<'a> {
    fn from_response(
        client: &'a CanopyClient,
        project_key: String,
        value: Value,
    ) -> ApiResult<Self> {
        let document: WikiSettingsDocument = decode("wiki settings", value)?;
        if let Some(duplicate) = document.taxonomy.first_duplicate_id() {
            return Err(ApiError::InvalidResponse(format!(
                "taxonomy lists article id `{duplicate}` more than once"
            )));
        }
        Ok(Self {
            client,
            project_key,
            document,
        })
    }

    /// Whole settings document.
    pub fn document(&self) -> &WikiSettingsDocument {
        &self.document
    }

    /// The article forest.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.document.taxonomy
    }

    /// Mutable access to the article forest.
    pub fn taxonomy_mut(&mut self) -> &mut Taxonomy {
        &mut self.document.taxonomy
    }

    /// Replaces the whole forest.
    pub fn set_taxonomy(&mut self, taxonomy: Taxonomy) {
        self.document.taxonomy = taxonomy;
    }

    /// Article shown on the wiki landing page.
    pub fn home_article_id(&self) -> Option<&str> {
        self.document.home_article_id.as_deref()
    }

    /// Sets or clears the landing-page article.
    pub fn set_home_article_id(&mut self, home_article_id: Option<String>) {
        self.document.home_article_id = home_article_id;
    }

    /// Moves an article, with its whole subtree, under a new parent.
    ///
    /// Only the local document changes; call [`WikiSettings::save`] to
    /// persist. See [`Taxonomy::move_article`] for the failure contract.
    pub fn move_article(
        &mut self,
        article_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        self.document.taxonomy.move_article(article_id, new_parent_id)
    }

    /// Persists the whole document and adopts the server's answer.
    ///
    /// The server may normalize or reorder what it stores; whatever comes
    /// back becomes the new local state.
    pub fn save(&mut self) -> ApiResult<()> {
        let body = serde_json::to_value(&self.document).map_err(|err| {
            ApiError::InvalidRequest(format!("wiki settings cannot be serialized: {err}"))
        })?;
        let value = self.client.transport().perform_json(
            &ApiCall::put(&["projects", self.project_key.as_str(), "wiki"]).with_body(body),
        )?;
        self.document = decode("wiki settings", value)?;
        Ok(())
    }
}

/// Handle on one wiki article.
pub struct WikiArticle<'a> {
    client: &'a CanopyClient,
    project_key: String,
    article_id: String,
}

impl Debug for WikiArticle<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiArticle")
            .field("project_key", &self.project_key)
            .field("article_id", &self.article_id)
            .finish_non_exhaustive()
    }
}

impl<'a> WikiArticle<'a> {
    /// Article id this handle points at.
    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    /// Fetches the article content and metadata.
    pub fn data(&self) -> ApiResult<WikiArticleData<'a>> {
        let value = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "wiki",
            self.article_id.as_str(),
        ]))?;
        Ok(WikiArticleData {
            client: self.client,
            project_key: self.project_key.clone(),
            article_id: self.article_id.clone(),
            document: decode("wiki article", value)?,
        })
    }

    /// Uploads a file and attaches it to this article.
    ///
    /// The file name is reduced to `A-Za-z0-9._-` before upload; the server
    /// derives the attachment type from the remaining extension. Returns the
    /// server's attachment descriptor.
    ///
    /// # Errors
    /// - `ApiError::InvalidRequest` when nothing is left of `file_name`
    ///   after sanitization. No request is sent in that case.
    pub fn upload_attachment(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<Value> {
        let cleaned = sanitize_attachment_name(file_name)?;
        let call = ApiCall::post(&[
            "projects",
            self.project_key.as_str(),
            "wiki",
            self.article_id.as_str(),
            "upload",
        ]);
        self.client.transport().perform_upload(
            &call,
            &UploadFile {
                file_name: cleaned,
                bytes,
            },
        )
    }

    /// Deletes the article.
    pub fn delete(&self) -> ApiResult<()> {
        self.client.transport().perform_empty(&ApiCall::delete(&[
            "projects",
            self.project_key.as_str(),
            "wiki",
            self.article_id.as_str(),
        ]))
    }
}

/// Wire shape of one article's content document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiArticleDocument {
    /// Markdown body of the article.
    #[serde(default)]
    pub payload: String,
    /// Article metadata block (name, tags, attachments).
    #[serde(default)]
    pub article: Value,
    /// Server-owned fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Owning store for one article's content and metadata.
pub struct WikiArticleData<'a> {
    client: &'a CanopyClient,
    project_key: String,
    article_id: String,
    document: WikiArticleDocument,
}

impl Debug for WikiArticleData<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiArticleData")
            .field("article_id", &self.article_id)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl WikiArticleData<'_> {
    /// Article id this data belongs to.
    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    /// Markdown body.
    pub fn body(&self) -> &str {
        &self.document.payload
    }

    /// Replaces the markdown body. Local until [`WikiArticleData::save`].
    pub fn set_body(&mut self, content: impl Into<String>) {
        self.document.payload = content.into();
    }

    /// Article metadata block.
    pub fn metadata(&self) -> &Value {
        &self.document.article
    }

    /// Replaces the metadata block. Local until [`WikiArticleData::save`].
    pub fn set_metadata(&mut self, metadata: Value) {
        self.document.article = metadata;
    }

    /// Persists the whole document and adopts the server's answer.
    pub fn save(&mut self) -> ApiResult<()> {
        let body = serde_json::to_value(&self.document).map_err(|err| {
            ApiError::InvalidRequest(format!("wiki article cannot be serialized: {err}"))
        })?;
        let value = self.client.transport().perform_json(
            &ApiCall::put(&[
                "projects",
                self.project_key.as_str(),
                "wiki",
                self.article_id.as_str(),
            ])
            .with_body(body),
        )?;
        self.document = decode("wiki article", value)?;
        Ok(())
    }
}

fn sanitize_attachment_name(file_name: &str) -> ApiResult<String> {
    let cleaned = ATTACHMENT_NAME_RE.replace_all(file_name, "").into_owned();
    if cleaned.is_empty() {
        return Err(ApiError::InvalidRequest(format!(
            "attachment file name `{file_name}` has no usable characters"
        )));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::sanitize_attachment_name;

    #[test]
    fn sanitize_attachment_name_strips_unsafe_characters() {
        let cleaned = sanitize_attachment_name("q3 report (final).pdf")
            .expect("name with usable characters should pass");
        assert_eq!(cleaned, "q3reportfinal.pdf");
    }

    #[test]
    fn sanitize_attachment_name_rejects_fully_stripped_names() {
        let error = sanitize_attachment_name("???")
            .expect_err("name with no usable characters must be rejected");
        assert!(error.to_string().contains("no usable characters"));
    }
}
