//! Virtual network creators and handles.
//!
//! # Responsibility
//! - Build creation payloads for AWS and Azure virtual networks.
//! - Edit and persist network documents: fleet management, HTTPS, DNS.
//!
//! # Invariants
//! - Creator and setter edits stay local until `create` or `save`.
//! - `save` persists the whole document, then refetches the server's copy.

use crate::fleet::FleetClient;
use crate::transport::{ApiCall, ApiError, ApiResult};
use serde_json::{Map, Value};
use std::fmt::{Debug, Formatter};

/// Deployer layout for the managed nodes directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployerManagement {
    /// No managed deployer.
    NoManagedDeployer,
    /// One central deployer node for the whole directory.
    CentralDeployer,
    /// Each design node embeds its own deployer.
    EachDesignNode,
}

impl DeployerManagement {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoManagedDeployer => "NO_MANAGED_DEPLOYER",
            Self::CentralDeployer => "CENTRAL_DEPLOYER",
            Self::EachDesignNode => "EACH_DESIGN_NODE",
        }
    }
}

/// HTTPS strategy applied to every instance inside one virtual network.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpsStrategy {
    fields: Map<String, Value>,
}

impl HttpsStrategy {
    fn build(mut fields: Map<String, Value>, https_strategy: &str, http_redirect: bool) -> Self {
        fields.insert(
            "httpsStrategy".to_string(),
            Value::String(https_strategy.to_string()),
        );
        let http_strategy = if http_redirect { "REDIRECT" } else { "DISABLE" };
        fields.insert(
            "httpStrategy".to_string(),
            Value::String(http_strategy.to_string()),
        );
        Self { fields }
    }

    /// Plain HTTP only.
    pub fn disable() -> Self {
        Self::build(Map::new(), "NONE", false)
    }

    /// Self-signed certificate on each instance.
    pub fn self_signed(http_redirect: bool) -> Self {
        Self::build(Map::new(), "SELF_SIGNED", http_redirect)
    }

    /// Custom certificate on each instance.
    pub fn custom_cert(http_redirect: bool) -> Self {
        Self::build(Map::new(), "CUSTOM_CERTIFICATE", http_redirect)
    }

    /// Let's Encrypt certificates. HTTP always redirects to HTTPS.
    pub fn lets_encrypt(contact_mail: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(
            "contactMail".to_string(),
            Value::String(contact_mail.to_string()),
        );
        Self::build(fields, "LETSENCRYPT", true)
    }

    pub(crate) fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[derive(Debug)]
struct CreatorCore {
    data: Map<String, Value>,
    use_default_values: bool,
}

impl CreatorCore {
    fn new(label: &str) -> Self {
        let mut data = Map::new();
        data.insert("label".to_string(), Value::String(label.to_string()));
        data.insert(
            "mode".to_string(),
            Value::String("EXISTING_MONOTENANT".to_string()),
        );
        Self {
            data,
            use_default_values: false,
        }
    }

    fn set_internet_access_mode(&mut self, mode: &str) -> ApiResult<()> {
        if !matches!(mode, "YES" | "NO" | "EGRESS_ONLY") {
            return Err(ApiError::InvalidRequest(format!(
                "internet access mode must be YES, NO, or EGRESS_ONLY, got `{mode}`"
            )));
        }
        self.data
            .insert("internetAccessMode".to_string(), Value::String(mode.to_string()));
        Ok(())
    }

    fn create<'a>(self, fleet: &'a FleetClient) -> ApiResult<VirtualNetwork<'a>> {
        let value = fleet.transport().perform_json(
            &ApiCall::post(&["tenants", fleet.tenant_id(), "virtual-networks"])
                .with_query(
                    "useDefaultValues",
                    if self.use_default_values { "true" } else { "false" },
                )
                .with_body(Value::Object(self.data)),
        )?;
        VirtualNetwork::from_document(fleet, value)
    }
}

/// Builder for a virtual network on AWS.
pub struct AwsVirtualNetworkCreator<'a> {
    fleet: &'a FleetClient,
    core: CreatorCore,
}

impl Debug for AwsVirtualNetworkCreator<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsVirtualNetworkCreator")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<'a> AwsVirtualNetworkCreator<'a> {
    pub(crate) fn new(fleet: &'a FleetClient, label: &str) -> Self {
        Self {
            fleet,
            core: CreatorCore::new(label),
        }
    }

    /// Sets the internet access mode: `YES`, `NO`, or `EGRESS_ONLY`.
    pub fn with_internet_access_mode(mut self, mode: &str) -> ApiResult<Self> {
        self.core.set_internet_access_mode(mode)?;
        Ok(self)
    }

    /// Lets the server fill unset fields with tenant defaults.
    pub fn with_default_values(mut self) -> Self {
        self.core.use_default_values = true;
        self
    }

    /// Places the network in an existing VPC and subnet.
    pub fn with_vpc(mut self, aws_vpc_id: &str, aws_subnet_id: &str) -> Self {
        self.core
            .data
            .insert("awsVpcId".to_string(), Value::String(aws_vpc_id.to_string()));
        self.core.data.insert(
            "awsSubnetId".to_string(),
            Value::String(aws_subnet_id.to_string()),
        );
        self
    }

    /// Lets the platform create and manage the security groups.
    pub fn with_auto_create_security_groups(mut self) -> Self {
        self.core
            .data
            .insert("awsAutoCreateSecurityGroups".to_string(), Value::Bool(true));
        self
    }

    /// Uses existing security groups instead of auto-created ones. Up to
    /// five group ids.
    pub fn with_security_groups(mut self, security_group_ids: &[&str]) -> Self {
        self.core
            .data
            .insert("awsAutoCreateSecurityGroups".to_string(), Value::Bool(false));
        self.core.data.insert(
            "awsSecurityGroups".to_string(),
            Value::Array(
                security_group_ids
                    .iter()
                    .map(|id| Value::String(id.to_string()))
                    .collect(),
            ),
        );
        self
    }

    /// Creates the virtual network.
    pub fn create(self) -> ApiResult<VirtualNetwork<'a>> {
        self.core.create(self.fleet)
    }
}

/// Builder for a virtual network on Azure.
pub struct AzureVirtualNetworkCreator<'a> {
    fleet: &'a FleetClient,
    core: CreatorCore,
}

impl Debug for AzureVirtualNetworkCreator<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureVirtualNetworkCreator")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<'a> AzureVirtualNetworkCreator<'a> {
    pub(crate) fn new(fleet: &'a FleetClient, label: &str) -> Self {
        Self {
            fleet,
            core: CreatorCore::new(label),
        }
    }

    /// Sets the internet access mode: `YES`, `NO`, or `EGRESS_ONLY`.
    pub fn with_internet_access_mode(mut self, mode: &str) -> ApiResult<Self> {
        self.core.set_internet_access_mode(mode)?;
        Ok(self)
    }

    /// Lets the server fill unset fields with tenant defaults.
    pub fn with_default_values(mut self) -> Self {
        self.core.use_default_values = true;
        self
    }

    /// Places the network in an existing Azure virtual network and subnet.
    pub fn with_virtual_network(mut self, azure_vn_id: &str, azure_subnet_id: &str) -> Self {
        self.core
            .data
            .insert("azureVnId".to_string(), Value::String(azure_vn_id.to_string()));
        self.core.data.insert(
            "azureSubnetId".to_string(),
            Value::String(azure_subnet_id.to_string()),
        );
        self
    }

    /// Whether the platform keeps the network security groups up to date.
    pub fn with_auto_update_security_groups(mut self, auto_update: bool) -> Self {
        self.core.data.insert(
            "azureAutoUpdateSecurityGroups".to_string(),
            Value::Bool(auto_update),
        );
        self
    }

    /// Creates the virtual network.
    pub fn create(self) -> ApiResult<VirtualNetwork<'a>> {
        self.core.create(self.fleet)
    }
}

/// Handle on one virtual network, holding its settings document.
pub struct VirtualNetwork<'a> {
    fleet: &'a FleetClient,
    vn_id: String,
    document: Map<String, Value>,
}

impl Debug for VirtualNetwork<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualNetwork")
            .field("vn_id", &self.vn_id)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl<'a> VirtualNetwork<'a> {
    pub(crate) fn from_document(fleet: &'a FleetClient, value: Value) -> ApiResult<Self> {
        let Value::Object(document) = value else {
            return Err(ApiError::InvalidResponse(
                "virtual network document is not an object".to_string(),
            ));
        };
        let vn_id = document
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::InvalidResponse("virtual network document has no id".to_string())
            })?;
        Ok(Self {
            fleet,
            vn_id,
            document,
        })
    }

    /// Virtual network id.
    pub fn vn_id(&self) -> &str {
        &self.vn_id
    }

    /// Display label, when set.
    pub fn label(&self) -> Option<&str> {
        self.document.get("label").and_then(Value::as_str)
    }

    /// Raw settings document.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Enables or disables the managed nodes directory.
    ///
    /// `event_server` names the node receiving audit events; `None` clears
    /// it. All three directory fields are rewritten on every call.
    pub fn set_fleet_management(
        &mut self,
        enable: bool,
        event_server: Option<&str>,
        deployer_management: DeployerManagement,
    ) -> &mut Self {
        self.document
            .insert("managedNodesDirectory".to_string(), Value::Bool(enable));
        self.document.insert(
            "eventServerNodeLabel".to_string(),
            opt_string(event_server),
        );
        self.document.insert(
            "nodesDirectoryDeployerMode".to_string(),
            Value::String(deployer_management.as_str().to_string()),
        );
        self
    }

    /// Applies an HTTPS strategy to the network document.
    pub fn set_https_strategy(&mut self, strategy: &HttpsStrategy) -> &mut Self {
        for (key, value) in strategy.fields() {
            self.document.insert(key.clone(), value.clone());
        }
        self
    }

    /// AWS networks: assigns or clears a Route 53 DNS strategy.
    ///
    /// With `assign_domain_name`, instances get domain names in the given
    /// private and public zones. Without it, instances get IP addresses only.
    pub fn set_aws_dns_strategy(
        &mut self,
        assign_domain_name: bool,
        private_zone53_id: Option<&str>,
        public_zone53_id: Option<&str>,
    ) -> &mut Self {
        if assign_domain_name {
            self.document.insert(
                "dnsStrategy".to_string(),
                Value::String("VN_SPECIFIC_CLOUD_DNS_SERVICE".to_string()),
            );
            self.document.insert(
                "awsRoute53PrivateIPZoneId".to_string(),
                opt_string(private_zone53_id),
            );
            self.document.insert(
                "awsRoute53PublicIPZoneId".to_string(),
                opt_string(public_zone53_id),
            );
        } else {
            self.document
                .insert("dnsStrategy".to_string(), Value::String("NONE".to_string()));
        }
        self
    }

    /// Azure networks: assigns or clears an Azure DNS zone strategy.
    pub fn set_azure_dns_strategy(
        &mut self,
        assign_domain_name: bool,
        dns_zone_id: Option<&str>,
    ) -> &mut Self {
        if assign_domain_name {
            self.document.insert(
                "dnsStrategy".to_string(),
                Value::String("VN_SPECIFIC_CLOUD_DNS_SERVICE".to_string()),
            );
            self.document
                .insert("azureDnsZoneId".to_string(), opt_string(dns_zone_id));
        } else {
            self.document
                .insert("dnsStrategy".to_string(), Value::String("NONE".to_string()));
        }
        self
    }

    /// Persists the whole document, then adopts the server's stored copy.
    pub fn save(&mut self) -> ApiResult<()> {
        self.fleet.transport().perform_empty(
            &ApiCall::put(&[
                "tenants",
                self.fleet.tenant_id(),
                "virtual-networks",
                self.vn_id.as_str(),
            ])
            .with_body(Value::Object(self.document.clone())),
        )?;
        let value = self.fleet.transport().perform_json(&ApiCall::get(&[
            "tenants",
            self.fleet.tenant_id(),
            "virtual-networks",
            self.vn_id.as_str(),
        ]))?;
        let Value::Object(document) = value else {
            return Err(ApiError::InvalidResponse(
                "virtual network document is not an object".to_string(),
            ));
        };
        self.document = document;
        Ok(())
    }

    /// Deletes the virtual network. Returns the raw descriptor of the
    /// server-side deletion task.
    pub fn delete(&self) -> ApiResult<Value> {
        self.fleet.transport().perform_json(&ApiCall::delete(&[
            "tenants",
            self.fleet.tenant_id(),
            "virtual-networks",
            self.vn_id.as_str(),
        ]))
    }
}

fn opt_string(value: Option<&str>) -> Value {
    match value {
        Some(value) => Value::String(value.to_string()),
        None => Value::Null,
    }
}
