//! Load-time validation of topology configuration.
//!
//! These checks look at records in isolation. Whether a reference names an
//! existing record is decided when the reference is bound.

use std::collections::HashMap;

use crate::models::{Named, NetworkSecurityRuleInput};
use crate::topology::TopologyConfig;

/// Priority range Azure accepts for network security rules.
pub const RULE_PRIORITY_RANGE: std::ops::RangeInclusive<u32> = 100..=4096;

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for topology configuration.
pub struct TopologyValidator;

impl TopologyValidator {
    pub fn validate(topology: &TopologyConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if topology.resource_group.name.is_empty() {
            result.add_error("Resource group name cannot be empty");
        }
        if topology.resource_group.location.is_empty() {
            result.add_error("Resource group location cannot be empty");
        }

        result.merge(Self::validate_names(&topology.app_security_groups));
        result.merge(Self::validate_names(&topology.network_security_rules));
        result.merge(Self::validate_names(&topology.network_security_groups));
        result.merge(Self::validate_names(&topology.subnets));
        result.merge(Self::validate_names(&topology.virtual_networks));
        result.merge(Self::validate_names(&topology.availability_sets));
        result.merge(Self::validate_names(&topology.os_profiles));
        result.merge(Self::validate_names(&topology.os_profiles_linux));
        result.merge(Self::validate_names(&topology.storage_image_references));
        result.merge(Self::validate_names(&topology.storage_os_disks));
        result.merge(Self::validate_names(&topology.ip_configurations));
        result.merge(Self::validate_names(&topology.network_interfaces));
        result.merge(Self::validate_names(&topology.virtual_machines));
        result.merge(Self::validate_names(&topology.public_ips));
        result.merge(Self::validate_names(&topology.load_balancers));
        result.merge(Self::validate_names(&topology.bastion_hosts));

        result.merge(Self::validate_rules(&topology.network_security_rules));
        result.merge(Self::validate_security_groups(topology));

        for vnet in &topology.virtual_networks {
            if vnet.subnets.is_empty() {
                result.add_warning(format!("Virtual network '{}' has no subnets", vnet.name));
            }
        }

        for vm in &topology.virtual_machines {
            if vm.count == 0 {
                result.add_warning(format!(
                    "Virtual machine '{}' has count 0 and declares no instances",
                    vm.name
                ));
            }
        }

        for lb in &topology.load_balancers {
            if lb.backend_hosts.is_empty() {
                result.add_warning(format!(
                    "Load balancer '{}' lists no backend hosts; a dedicated network interface joins its pool",
                    lb.name
                ));
            }
        }

        result
    }

    pub fn validate_names<T: Named>(records: &[T]) -> ValidationResult {
        let mut result = ValidationResult::new();
        for record in records {
            if record.name().trim().is_empty() {
                result.add_error(format!("{} name cannot be empty", T::KIND));
            }
        }
        result
    }

    pub fn validate_rules(rules: &[NetworkSecurityRuleInput]) -> ValidationResult {
        let mut result = ValidationResult::new();
        for rule in rules {
            if !RULE_PRIORITY_RANGE.contains(&rule.priority) {
                result.add_warning(format!(
                    "Rule '{}' priority {} is outside {}..={}",
                    rule.name,
                    rule.priority,
                    RULE_PRIORITY_RANGE.start(),
                    RULE_PRIORITY_RANGE.end()
                ));
            }
            if rule.destination_port_ranges.is_empty() {
                result.add_warning(format!("Rule '{}' has no destination port ranges", rule.name));
            }
        }
        result
    }

    /// Priority clashes inside one group are left to the provider, but are
    /// worth reporting early.
    pub fn validate_security_groups(topology: &TopologyConfig) -> ValidationResult {
        let mut result = ValidationResult::new();
        let rules: HashMap<&str, &NetworkSecurityRuleInput> = topology
            .network_security_rules
            .iter()
            .map(|r| (r.name.as_str(), r))
            .collect();

        for group in &topology.network_security_groups {
            if group.security_rules.is_empty() {
                result.add_warning(format!("Security group '{}' has no rules", group.name));
            }

            let mut priorities: HashMap<(&str, u32), &str> = HashMap::new();
            for rule in group.security_rules.iter().filter_map(|n| rules.get(n.as_str())) {
                let key = (rule.direction.as_str(), rule.priority);
                if let Some(other) = priorities.insert(key, &rule.name) {
                    result.add_warning(format!(
                        "Security group '{}': rules '{}' and '{}' share {} priority {}",
                        group.name, other, rule.name, rule.direction, rule.priority
                    ));
                }
            }
        }
        result
    }
}
