//! Input records decoded from stack configuration.
//!
//! Every record is an immutable value keyed by a `name` that is unique within
//! its category. References to other records are plain strings naming the
//! target; they are resolved later, in declaration order, by the binder.

use serde::{Deserialize, Serialize};

/// A configuration record that is addressed by name.
pub trait Named {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty => $kind:literal),+ $(,)?) => {
        $(
            impl Named for $ty {
                const KIND: &'static str = $kind;

                fn name(&self) -> &str {
                    &self.name
                }
            }
        )+
    };
}

/// The single resource group every other resource is placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupInput {
    pub name: String,
    pub location: String,
}

/// Application security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSecurityGroupInput {
    pub name: String,
}

/// Network security rule. Rules are attached inline to the security groups
/// that list them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecurityRuleInput {
    pub name: String,
    pub access: String,
    #[serde(default)]
    pub description: Option<String>,
    pub direction: String,
    pub priority: u32,
    pub protocol: String,
    #[serde(default)]
    pub source_address_prefix: Option<String>,
    #[serde(default)]
    pub source_port_range: Option<String>,
    #[serde(default)]
    pub destination_address_prefix: Option<String>,
    #[serde(default)]
    pub destination_port_ranges: Vec<String>,
    /// Application security groups the rule targets, by name.
    #[serde(default)]
    pub destination_app_security_groups: Vec<String>,
}

/// Network security group made of named rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecurityGroupInput {
    pub name: String,
    #[serde(default)]
    pub security_rules: Vec<String>,
}

/// Subnet of a virtual network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetInput {
    pub name: String,
    pub address_prefix: String,
    /// Network security group guarding the subnet, by name.
    #[serde(default)]
    pub security_group: Option<String>,
}

/// Virtual network and the subnets it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkInput {
    pub name: String,
    pub cidr: String,
    #[serde(default)]
    pub subnets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySetInput {
    pub name: String,
    #[serde(default = "default_true")]
    pub managed: bool,
    pub platform_fault_domain_count: u32,
    pub platform_update_domain_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfileInput {
    pub name: String,
    #[serde(default)]
    pub admin_username: String,
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default)]
    pub custom_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfileLinuxInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "DisablePasswordAuthentication")]
    pub disable_password_authentication: bool,
    #[serde(default, alias = "SSHKeyData")]
    pub ssh_key_data: Option<String>,
    #[serde(default, alias = "SSHKeyPath")]
    pub ssh_key_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageImageReferenceInput {
    pub name: String,
    pub offer: String,
    pub publisher: String,
    pub sku: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOsDiskInput {
    pub name: String,
    pub create_option: String,
    #[serde(rename = "diskSizeGB", alias = "diskSizeGb", default)]
    pub disk_size_gb: Option<u32>,
    pub os_type: String,
}

/// IP configuration profile referenced by network interface profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationInput {
    pub name: String,
    #[serde(default = "default_true")]
    pub primary: bool,
    #[serde(rename = "privateIPAddressAllocation", alias = "privateIpAddressAllocation")]
    pub private_ip_address_allocation: String,
    #[serde(rename = "privateIPAddressVersion", alias = "privateIpAddressVersion")]
    pub private_ip_address_version: String,
}

impl IpConfigurationInput {
    /// Profile used when a virtual machine names no network interface.
    pub fn primary_dynamic_ipv4() -> Self {
        Self {
            name: "primary-dynamic-ipv4".to_string(),
            primary: true,
            private_ip_address_allocation: "Dynamic".to_string(),
            private_ip_address_version: "IPv4".to_string(),
        }
    }
}

/// Network interface profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceInput {
    pub name: String,
    pub ip_configuration: String,
}

/// How the instances of one virtual machine input are spread over subnets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubnetAssignment {
    /// Every instance is placed in the named subnet.
    Named(String),
    /// Instance `i` is placed in subnet `i mod n` of the virtual network.
    RoundRobin,
}

/// Virtual machine template, expanded into `count` instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInput {
    pub name: String,
    #[serde(default = "default_count")]
    pub count: u32,
    pub virtual_network: String,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub app_sec_group: Option<String>,
    #[serde(default)]
    pub availability_set: Option<String>,
    #[serde(default)]
    pub network_interface: Option<String>,
    pub os_profile: String,
    #[serde(default)]
    pub os_profile_linux: Option<String>,
    pub storage_image_reference: String,
    #[serde(rename = "storageOSDisk", alias = "storageOsDisk")]
    pub storage_os_disk: String,
    #[serde(default)]
    pub custom_data: Option<String>,
    pub vm_size: String,
}

impl VirtualMachineInput {
    pub fn subnet_assignment(&self) -> SubnetAssignment {
        match &self.subnet {
            Some(subnet) => SubnetAssignment::Named(subnet.clone()),
            None => SubnetAssignment::RoundRobin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpInput {
    pub name: String,
    pub allocation_method: String,
    #[serde(default = "default_ip_version")]
    pub ip_version: String,
    #[serde(default)]
    pub sku: Option<String>,
}

/// Load balancer fronted by a public IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerInput {
    pub name: String,
    #[serde(rename = "publicIP", alias = "publicIp")]
    pub public_ip: String,
    pub virtual_network: String,
    pub subnet: String,
    pub frontend_port: u16,
    pub backend_port: u16,
    /// Virtual machine inputs whose instances join the backend pool.
    #[serde(default)]
    pub backend_hosts: Vec<String>,
    pub protocol: String,
    pub probe_port: u16,
    pub probe_protocol: String,
    #[serde(default)]
    pub probe_request_path: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionHostInput {
    pub name: String,
    #[serde(rename = "publicIP", alias = "publicIp")]
    pub public_ip: String,
    pub virtual_network: String,
}

impl_named! {
    ResourceGroupInput => "resource group",
    ApplicationSecurityGroupInput => "application security group",
    NetworkSecurityRuleInput => "network security rule",
    NetworkSecurityGroupInput => "network security group",
    SubnetInput => "subnet",
    VirtualNetworkInput => "virtual network",
    AvailabilitySetInput => "availability set",
    OsProfileInput => "os profile",
    OsProfileLinuxInput => "linux os profile",
    StorageImageReferenceInput => "storage image reference",
    StorageOsDiskInput => "storage os disk",
    IpConfigurationInput => "ip configuration",
    NetworkInterfaceInput => "network interface",
    VirtualMachineInput => "virtual machine",
    PublicIpInput => "public IP",
    LoadBalancerInput => "load balancer",
    BastionHostInput => "bastion host",
}

fn default_true() -> bool {
    true
}

fn default_count() -> u32 {
    1
}

fn default_ip_version() -> String {
    "IPv4".to_string()
}
