//! Fleet-manager client surface.
//!
//! # Responsibility
//! - Scope every fleet call under one tenant.
//! - Hand out virtual network creators and handles.
//!
//! # Invariants
//! - The tenant id never changes for the lifetime of a client.

pub mod vnet;

use crate::client::ClientConfig;
use crate::fleet::vnet::{AwsVirtualNetworkCreator, AzureVirtualNetworkCreator, VirtualNetwork};
use crate::transport::{ApiCall, ApiError, ApiResult, HttpTransport, Transport};
use serde_json::Value;
use std::fmt::{Debug, Formatter};

/// Entry point for the fleet-manager REST API of one tenant.
pub struct FleetClient {
    transport: Box<dyn Transport>,
    tenant_id: String,
}

impl Debug for FleetClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClient")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

impl FleetClient {
    /// Opens a fleet client over a blocking HTTP transport.
    ///
    /// # Errors
    /// - Returns `ApiError::InvalidBaseUrl` or `ApiError::Connection` when
    ///   the transport cannot be built. No request is sent here.
    pub fn open(config: &ClientConfig, tenant_id: impl Into<String>) -> ApiResult<Self> {
        let transport =
            HttpTransport::new(&config.base_url, config.api_key.clone(), config.timeout)?;
        Ok(Self::with_transport(Box::new(transport), tenant_id))
    }

    /// Wraps an existing transport. Used by tests and offline wiring.
    pub fn with_transport(transport: Box<dyn Transport>, tenant_id: impl Into<String>) -> Self {
        Self {
            transport,
            tenant_id: tenant_id.into(),
        }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Tenant this client is scoped to.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Starts a creator for a virtual network on AWS.
    pub fn new_aws_virtual_network_creator(&self, label: &str) -> AwsVirtualNetworkCreator<'_> {
        AwsVirtualNetworkCreator::new(self, label)
    }

    /// Starts a creator for a virtual network on Azure.
    pub fn new_azure_virtual_network_creator(&self, label: &str) -> AzureVirtualNetworkCreator<'_> {
        AzureVirtualNetworkCreator::new(self, label)
    }

    /// Fetches one virtual network by id.
    pub fn virtual_network(&self, vn_id: &str) -> ApiResult<VirtualNetwork<'_>> {
        let value = self.transport.perform_json(&ApiCall::get(&[
            "tenants",
            self.tenant_id.as_str(),
            "virtual-networks",
            vn_id,
        ]))?;
        VirtualNetwork::from_document(self, value)
    }

    /// Lists the virtual networks of this tenant.
    pub fn list_virtual_networks(&self) -> ApiResult<Vec<VirtualNetwork<'_>>> {
        let value = self.transport.perform_json(&ApiCall::get(&[
            "tenants",
            self.tenant_id.as_str(),
            "virtual-networks",
        ]))?;
        let Value::Array(entries) = value else {
            return Err(ApiError::InvalidResponse(
                "virtual network listing is not an array".to_string(),
            ));
        };
        let mut networks = Vec::with_capacity(entries.len());
        for entry in entries {
            networks.push(VirtualNetwork::from_document(self, entry)?);
        }
        Ok(networks)
    }
}
