//! The assembled topology configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::models::*;
use crate::reader::Config;

/// Configuration keys, one per entity category.
pub mod keys {
    pub const RESOURCE_GROUP: &str = "resourceGroup";
    pub const APP_SECURITY_GROUPS: &str = "appSecurityGroups";
    pub const NETWORK_SECURITY_RULES: &str = "networkSecurityRules";
    pub const NETWORK_SECURITY_GROUPS: &str = "networkSecurityGroups";
    pub const SUBNETS: &str = "subnets";
    pub const VIRTUAL_NETWORKS: &str = "virtualNetworks";
    pub const AVAILABILITY_SETS: &str = "availabilitySets";
    pub const OS_PROFILES: &str = "osProfiles";
    pub const OS_PROFILES_LINUX: &str = "osProfilesLinux";
    pub const STORAGE_IMAGE_REFERENCE: &str = "storageImageReference";
    pub const STORAGE_OS_DISK: &str = "storageOSDisk";
    pub const IP_CONFIGURATION: &str = "ipConfiguration";
    pub const NETWORK_INTERFACES: &str = "networkInterfaces";
    pub const VIRTUAL_MACHINES: &str = "virtualMachines";
    pub const PUBLIC_IP: &str = "publicIP";
    pub const LOAD_BALANCERS: &str = "loadBalancers";
    pub const BASTION_HOSTS: &str = "bastionHosts";
}

/// Every input record of one stack, decoded and checked for duplicate names.
///
/// Cross-references are not checked here; they are resolved in declaration
/// order by the binder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub resource_group: ResourceGroupInput,
    pub app_security_groups: Vec<ApplicationSecurityGroupInput>,
    pub network_security_rules: Vec<NetworkSecurityRuleInput>,
    pub network_security_groups: Vec<NetworkSecurityGroupInput>,
    pub subnets: Vec<SubnetInput>,
    pub virtual_networks: Vec<VirtualNetworkInput>,
    pub availability_sets: Vec<AvailabilitySetInput>,
    pub os_profiles: Vec<OsProfileInput>,
    pub os_profiles_linux: Vec<OsProfileLinuxInput>,
    pub storage_image_references: Vec<StorageImageReferenceInput>,
    pub storage_os_disks: Vec<StorageOsDiskInput>,
    pub ip_configurations: Vec<IpConfigurationInput>,
    pub network_interfaces: Vec<NetworkInterfaceInput>,
    pub virtual_machines: Vec<VirtualMachineInput>,
    pub public_ips: Vec<PublicIpInput>,
    pub load_balancers: Vec<LoadBalancerInput>,
    pub bastion_hosts: Vec<BastionHostInput>,
}

impl TopologyConfig {
    /// Topology with only a resource group.
    pub fn new(resource_group: ResourceGroupInput) -> Self {
        Self {
            resource_group,
            app_security_groups: Vec::new(),
            network_security_rules: Vec::new(),
            network_security_groups: Vec::new(),
            subnets: Vec::new(),
            virtual_networks: Vec::new(),
            availability_sets: Vec::new(),
            os_profiles: Vec::new(),
            os_profiles_linux: Vec::new(),
            storage_image_references: Vec::new(),
            storage_os_disks: Vec::new(),
            ip_configurations: Vec::new(),
            network_interfaces: Vec::new(),
            virtual_machines: Vec::new(),
            public_ips: Vec::new(),
            load_balancers: Vec::new(),
            bastion_hosts: Vec::new(),
        }
    }

    /// Decode every category from `config`.
    ///
    /// Only `resourceGroup` is required; absent categories are empty.
    pub fn load(config: &Config<'_>) -> ConfigResult<Self> {
        info!("Loading topology from namespace {}", config.namespace());

        let topology = Self {
            resource_group: config.require_object(keys::RESOURCE_GROUP)?,
            app_security_groups: config.object_or_default(keys::APP_SECURITY_GROUPS)?,
            network_security_rules: config.object_or_default(keys::NETWORK_SECURITY_RULES)?,
            network_security_groups: config.object_or_default(keys::NETWORK_SECURITY_GROUPS)?,
            subnets: config.object_or_default(keys::SUBNETS)?,
            virtual_networks: config.object_or_default(keys::VIRTUAL_NETWORKS)?,
            availability_sets: config.object_or_default(keys::AVAILABILITY_SETS)?,
            os_profiles: config.object_or_default(keys::OS_PROFILES)?,
            os_profiles_linux: config.object_or_default(keys::OS_PROFILES_LINUX)?,
            storage_image_references: config.object_or_default(keys::STORAGE_IMAGE_REFERENCE)?,
            storage_os_disks: config.object_or_default(keys::STORAGE_OS_DISK)?,
            ip_configurations: config.object_or_default(keys::IP_CONFIGURATION)?,
            network_interfaces: config.object_or_default(keys::NETWORK_INTERFACES)?,
            virtual_machines: config.object_or_default(keys::VIRTUAL_MACHINES)?,
            public_ips: config.object_or_default(keys::PUBLIC_IP)?,
            load_balancers: config.object_or_default(keys::LOAD_BALANCERS)?,
            bastion_hosts: config.object_or_default(keys::BASTION_HOSTS)?,
        };

        topology.check_unique_names()?;
        debug!(
            "Loaded {} subnets, {} virtual networks, {} virtual machines",
            topology.subnets.len(),
            topology.virtual_networks.len(),
            topology.virtual_machines.len()
        );
        Ok(topology)
    }

    /// Fail on the first category holding two records with the same name.
    pub fn check_unique_names(&self) -> ConfigResult<()> {
        unique(&self.app_security_groups)?;
        unique(&self.network_security_rules)?;
        unique(&self.network_security_groups)?;
        unique(&self.subnets)?;
        unique(&self.virtual_networks)?;
        unique(&self.availability_sets)?;
        unique(&self.os_profiles)?;
        unique(&self.os_profiles_linux)?;
        unique(&self.storage_image_references)?;
        unique(&self.storage_os_disks)?;
        unique(&self.ip_configurations)?;
        unique(&self.network_interfaces)?;
        unique(&self.virtual_machines)?;
        unique(&self.public_ips)?;
        unique(&self.load_balancers)?;
        unique(&self.bastion_hosts)?;
        Ok(())
    }
}

fn unique<T: Named>(records: &[T]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.name()) {
            return Err(ConfigError::DuplicateName {
                kind: T::KIND.to_string(),
                name: record.name().to_string(),
            });
        }
    }
    Ok(())
}
