//! Blocking client library for the Canopy platform REST API.
//!
//! Handles are thin wrappers over documents the server owns: fetch a
//! document, edit it locally, persist it whole. The one rich piece of local
//! state is the wiki taxonomy, an ordered article forest with structural
//! move guarantees.

pub mod apinode;
pub mod client;
pub mod dataset;
pub mod fleet;
pub mod logging;
pub mod project;
pub mod taxonomy;
pub mod transport;
pub mod webapp;
pub mod wiki;

pub use apinode::{ApiNodeClient, Dispatch};
pub use client::{CanopyClient, ClientConfig};
pub use dataset::{Dataset, DatasetListItem, DatasetSettings, StorageFamily};
pub use fleet::vnet::{
    AwsVirtualNetworkCreator, AzureVirtualNetworkCreator, DeployerManagement, HttpsStrategy,
    VirtualNetwork,
};
pub use fleet::FleetClient;
pub use logging::{default_log_level, init_logging, logging_status};
pub use project::Project;
pub use taxonomy::{ArticleNode, Taxonomy, TaxonomyError};
pub use transport::{
    ApiCall, ApiError, ApiResult, HttpMethod, HttpTransport, RecordedCall, StubTransport,
    Transport, UploadFile,
};
pub use webapp::{Webapp, WebappBackendState, WebappListItem};
pub use wiki::{
    Wiki, WikiArticle, WikiArticleData, WikiArticleDocument, WikiSettings, WikiSettingsDocument,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the client crate version.
pub fn client_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{client_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn client_version_is_not_empty() {
        assert!(!client_version().is_empty());
    }
}
