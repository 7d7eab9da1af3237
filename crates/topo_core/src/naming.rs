//! Instance expansion for virtual machine templates.
//!
//! A template with `count = N` becomes `N` instances named
//! `<base>-<i>`, `i` zero-padded to `round(N / 10) + 1` digits.

use serde::{Deserialize, Serialize};

use topo_config::{SubnetAssignment, VirtualMachineInput};

use crate::error::{CoreError, CoreResult};
use crate::resolver::ReferenceKind;

/// Digits used for instance indexes of a template with `count` instances.
pub fn pad_width(count: u32) -> usize {
    (f64::from(count) / 10.0).round() as usize + 1
}

/// Name of instance `index`.
pub fn instance_name(base: &str, index: u32, width: usize) -> String {
    format!("{}-{:0width$}", base, index, width = width)
}

/// Every instance name of a template, in index order.
pub fn expand(base: &str, count: u32) -> Vec<String> {
    let width = pad_width(count);
    (0..count).map(|i| instance_name(base, i, width)).collect()
}

/// One expanded virtual machine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub index: u32,
    /// Subnet of the owning virtual network the instance is placed in.
    pub subnet: String,
}

impl Instance {
    /// Name of the primary network interface.
    pub fn nic_name(&self) -> String {
        format!("{}-primary", self.name)
    }

    /// Name of the primary IP configuration.
    pub fn ip_configuration_name(&self) -> String {
        format!("{}-primary-ipconfig", self.name)
    }

    /// Name of the application security group association.
    pub fn association_name(&self) -> String {
        format!("{}-appsec-association", self.name)
    }
}

/// Expand `vm` against the subnets of its virtual network.
///
/// A named subnet must belong to the network. Without one, instances are
/// spread round-robin over the network's subnets.
pub fn expand_instances(
    vm: &VirtualMachineInput,
    subnets: &[String],
) -> CoreResult<Vec<Instance>> {
    let names = expand(&vm.name, vm.count);

    match vm.subnet_assignment() {
        SubnetAssignment::Named(subnet) => {
            if !subnets.iter().any(|s| *s == subnet) {
                return Err(CoreError::missing(subnet, ReferenceKind::Subnet));
            }
            Ok(names
                .into_iter()
                .zip(0..)
                .map(|(name, index)| Instance {
                    name,
                    index,
                    subnet: subnet.clone(),
                })
                .collect())
        }
        SubnetAssignment::RoundRobin => {
            if subnets.is_empty() && vm.count > 0 {
                return Err(CoreError::NoSubnets(vm.virtual_network.clone()));
            }
            Ok(names
                .into_iter()
                .zip(0..)
                .map(|(name, index)| Instance {
                    name,
                    index,
                    subnet: subnets[index as usize % subnets.len()].clone(),
                })
                .collect())
        }
    }
}
