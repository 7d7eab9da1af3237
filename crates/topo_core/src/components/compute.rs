//! Availability sets, configuration profiles and virtual machines.

use topo_config::{
    AvailabilitySetInput, IpConfigurationInput, NetworkInterfaceInput, OsProfileInput,
    OsProfileLinuxInput, StorageImageReferenceInput, StorageOsDiskInput, TopologyConfig,
    VirtualMachineInput,
};
use topo_engine::{Output, ResourceArgs, ResourceHandle, ResourceKind};
use tracing::debug;

use crate::components::network::{SubnetMatch, VirtualNetworkBinding};
use crate::components::ResourceGroupBinding;
use crate::context::DeployContext;
use crate::error::CoreResult;
use crate::naming::{expand_instances, Instance};
use crate::resolver::{Bindings, ReferenceKind};

/// Profiles virtual machines refer to by name. None of them is a resource.
#[derive(Debug, Clone)]
pub struct Profiles {
    pub os: Bindings<OsProfileInput>,
    pub os_linux: Bindings<OsProfileLinuxInput>,
    pub images: Bindings<StorageImageReferenceInput>,
    pub os_disks: Bindings<StorageOsDiskInput>,
    pub ip_configurations: Bindings<IpConfigurationInput>,
    pub network_interfaces: Bindings<NetworkInterfaceInput>,
}

impl Profiles {
    pub fn bind(cx: &mut DeployContext<'_>, topology: &TopologyConfig) -> CoreResult<Self> {
        let profiles = Self {
            os: Bindings::from_records(ReferenceKind::OsProfile, &topology.os_profiles)?,
            os_linux: Bindings::from_records(
                ReferenceKind::OsProfileLinux,
                &topology.os_profiles_linux,
            )?,
            images: Bindings::from_records(
                ReferenceKind::StorageImageReference,
                &topology.storage_image_references,
            )?,
            os_disks: Bindings::from_records(
                ReferenceKind::StorageOsDisk,
                &topology.storage_os_disks,
            )?,
            ip_configurations: Bindings::from_records(
                ReferenceKind::IpConfiguration,
                &topology.ip_configurations,
            )?,
            network_interfaces: Bindings::from_records(
                ReferenceKind::NetworkInterface,
                &topology.network_interfaces,
            )?,
        };

        for (kind, names) in [
            (ReferenceKind::StorageImageReference, profiles.images.names()),
            (ReferenceKind::StorageOsDisk, profiles.os_disks.names()),
            (ReferenceKind::OsProfile, profiles.os.names()),
            (ReferenceKind::OsProfileLinux, profiles.os_linux.names()),
            (ReferenceKind::IpConfiguration, profiles.ip_configurations.names()),
            (ReferenceKind::NetworkInterface, profiles.network_interfaces.names()),
        ] {
            for name in names {
                cx.bound(kind, name);
            }
        }
        Ok(profiles)
    }

    /// IP configuration of the network interface profile a VM names, or the
    /// built-in primary profile when it names none.
    pub fn ip_configuration(
        &self,
        network_interface: Option<&str>,
    ) -> CoreResult<IpConfigurationInput> {
        match self.network_interfaces.resolve_opt(network_interface)? {
            Some(nic) => Ok(self.ip_configurations.resolve(&nic.ip_configuration)?.clone()),
            None => Ok(IpConfigurationInput::primary_dynamic_ipv4()),
        }
    }
}

/// One declared virtual machine instance.
#[derive(Debug, Clone)]
pub struct InstanceBinding {
    pub instance: Instance,
    pub network_interface: ResourceHandle,
    pub vm: ResourceHandle,
}

/// All instances declared for one virtual machine template.
#[derive(Debug, Clone)]
pub struct VirtualMachineBinding {
    pub instances: Vec<InstanceBinding>,
}

pub async fn declare_availability_sets(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[AvailabilitySetInput],
) -> CoreResult<Bindings<ResourceHandle>> {
    let mut sets = Bindings::new(ReferenceKind::AvailabilitySet);
    for input in inputs {
        let handle = cx
            .declare(
                ResourceKind::AvailabilitySet,
                &input.name,
                group
                    .placed()
                    .set("name", &input.name)
                    .set("managed", input.managed)
                    .set("platformFaultDomainCount", input.platform_fault_domain_count)
                    .set("platformUpdateDomainCount", input.platform_update_domain_count),
            )
            .await?;
        sets.bind(&input.name, handle)?;
    }
    Ok(sets)
}

/// Everything one template refers to, resolved before any instance is
/// declared.
struct Resolved<'b> {
    network: &'b VirtualNetworkBinding,
    app_security_group: Option<&'b ResourceHandle>,
    availability_set: Option<&'b ResourceHandle>,
    ip_configuration: IpConfigurationInput,
    os: &'b OsProfileInput,
    os_linux: Option<&'b OsProfileLinuxInput>,
    image: &'b StorageImageReferenceInput,
    os_disk: &'b StorageOsDiskInput,
}

pub async fn declare_virtual_machines(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    inputs: &[VirtualMachineInput],
    networks: &Bindings<VirtualNetworkBinding>,
    app_security_groups: &Bindings<ResourceHandle>,
    availability_sets: &Bindings<ResourceHandle>,
    profiles: &Profiles,
) -> CoreResult<Bindings<VirtualMachineBinding>> {
    let mut machines = Bindings::new(ReferenceKind::VirtualMachine);
    for input in inputs {
        let resolved = Resolved {
            network: networks.resolve(&input.virtual_network)?,
            app_security_group: app_security_groups.resolve_opt(input.app_sec_group.as_deref())?,
            availability_set: availability_sets.resolve_opt(input.availability_set.as_deref())?,
            ip_configuration: profiles.ip_configuration(input.network_interface.as_deref())?,
            os: profiles.os.resolve(&input.os_profile)?,
            os_linux: profiles.os_linux.resolve_opt(input.os_profile_linux.as_deref())?,
            image: profiles.images.resolve(&input.storage_image_reference)?,
            os_disk: profiles.os_disks.resolve(&input.storage_os_disk)?,
        };

        let instances = expand_instances(input, &resolved.network.subnets)?;
        debug!("Expanded {} into {} instances", input.name, instances.len());

        let mut declared = Vec::with_capacity(instances.len());
        for instance in instances {
            declared.push(declare_instance(cx, group, input, &resolved, instance).await?);
        }

        machines.bind(&input.name, VirtualMachineBinding { instances: declared })?;
    }
    Ok(machines)
}

async fn declare_instance(
    cx: &mut DeployContext<'_>,
    group: &ResourceGroupBinding,
    input: &VirtualMachineInput,
    resolved: &Resolved<'_>,
    instance: Instance,
) -> CoreResult<InstanceBinding> {
    let subnet_id = resolved
        .network
        .subnet_id(&SubnetMatch::Exact(instance.subnet.clone()))?;

    let ip = &resolved.ip_configuration;
    let network_interface = cx
        .declare(
            ResourceKind::NetworkInterface,
            &instance.nic_name(),
            group.placed().set("name", instance.nic_name()).set(
                "ipConfigurations",
                vec![ResourceArgs::new()
                    .set("name", instance.ip_configuration_name())
                    .set("primary", ip.primary)
                    .set("privateIpAddressAllocation", &ip.private_ip_address_allocation)
                    .set("privateIpAddressVersion", &ip.private_ip_address_version)
                    .set("subnetId", subnet_id)],
            ),
        )
        .await?;

    if let Some(app_security_group) = resolved.app_security_group {
        cx.declare(
            ResourceKind::NetworkInterfaceSecurityGroupAssociation,
            &instance.association_name(),
            ResourceArgs::new()
                .set("networkInterfaceId", network_interface.id())
                .set("ipConfigurationName", instance.ip_configuration_name())
                .set("applicationSecurityGroupId", app_security_group.id()),
        )
        .await?;
    }

    let vm = cx
        .declare(
            ResourceKind::VirtualMachine,
            &instance.name,
            vm_args(group, input, resolved, &instance, network_interface.id()),
        )
        .await?;

    Ok(InstanceBinding {
        instance,
        network_interface,
        vm,
    })
}

fn vm_args(
    group: &ResourceGroupBinding,
    input: &VirtualMachineInput,
    resolved: &Resolved<'_>,
    instance: &Instance,
    network_interface_id: Output<String>,
) -> ResourceArgs {
    let os = resolved.os;
    let custom_data = input.custom_data.as_ref().or(os.custom_data.as_ref());

    let os_profile = ResourceArgs::new()
        .set("adminUsername", &os.admin_username)
        .set_opt("adminPassword", os.admin_password.as_ref())
        .set("computerName", &instance.name)
        .set_opt("customData", custom_data);

    let image = resolved.image;
    let image_reference = ResourceArgs::new()
        .set("offer", &image.offer)
        .set("publisher", &image.publisher)
        .set("sku", &image.sku)
        .set("version", &image.version);

    let disk = resolved.os_disk;
    let os_disk = ResourceArgs::new()
        .set("name", &instance.name)
        .set("createOption", &disk.create_option)
        .set_opt("diskSizeGb", disk.disk_size_gb)
        .set("osType", &disk.os_type);

    group
        .placed()
        .set("name", &instance.name)
        .set("vmSize", &input.vm_size)
        .set_opt("availabilitySetId", resolved.availability_set.map(ResourceHandle::id))
        .set("networkInterfaceIds", vec![network_interface_id.clone()])
        .set("primaryNetworkInterfaceId", network_interface_id)
        .set("osProfile", os_profile)
        .set_opt("osProfileLinuxConfig", resolved.os_linux.map(linux_config))
        .set("storageImageReference", image_reference)
        .set("storageOsDisk", os_disk)
}

fn linux_config(profile: &OsProfileLinuxInput) -> ResourceArgs {
    let ssh_keys: Vec<ResourceArgs> = match (&profile.ssh_key_data, &profile.ssh_key_path) {
        (Some(data), Some(path)) => {
            vec![ResourceArgs::new().set("keyData", data).set("path", path)]
        }
        _ => Vec::new(),
    };

    ResourceArgs::new()
        .set("disablePasswordAuthentication", profile.disable_password_authentication)
        .set("sshKeys", ssh_keys)
}
