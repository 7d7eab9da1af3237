//! Name-keyed bindings for resolving references between records.
//!
//! Every category gets its own [`Bindings`] map. A stage fills the map for its
//! category while it declares or binds records, then hands it to later stages
//! by shared reference only, so a map never changes once its stage is done.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use topo_config::Named;

use crate::error::{CoreError, CoreResult};

/// Category a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    ResourceGroup,
    ApplicationSecurityGroup,
    NetworkSecurityRule,
    NetworkSecurityGroup,
    Subnet,
    VirtualNetwork,
    AvailabilitySet,
    OsProfile,
    OsProfileLinux,
    StorageImageReference,
    StorageOsDisk,
    IpConfiguration,
    NetworkInterface,
    VirtualMachine,
    PublicIp,
    LoadBalancer,
    BastionHost,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 17] = [
        Self::ResourceGroup,
        Self::ApplicationSecurityGroup,
        Self::NetworkSecurityRule,
        Self::NetworkSecurityGroup,
        Self::Subnet,
        Self::VirtualNetwork,
        Self::AvailabilitySet,
        Self::OsProfile,
        Self::OsProfileLinux,
        Self::StorageImageReference,
        Self::StorageOsDisk,
        Self::IpConfiguration,
        Self::NetworkInterface,
        Self::VirtualMachine,
        Self::PublicIp,
        Self::LoadBalancer,
        Self::BastionHost,
    ];

    /// Label used in messages. Matches the record kinds of `topo_config`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource group",
            Self::ApplicationSecurityGroup => "application security group",
            Self::NetworkSecurityRule => "network security rule",
            Self::NetworkSecurityGroup => "network security group",
            Self::Subnet => "subnet",
            Self::VirtualNetwork => "virtual network",
            Self::AvailabilitySet => "availability set",
            Self::OsProfile => "os profile",
            Self::OsProfileLinux => "linux os profile",
            Self::StorageImageReference => "storage image reference",
            Self::StorageOsDisk => "storage os disk",
            Self::IpConfiguration => "ip configuration",
            Self::NetworkInterface => "network interface",
            Self::VirtualMachine => "virtual machine",
            Self::PublicIp => "public IP",
            Self::LoadBalancer => "load balancer",
            Self::BastionHost => "bastion host",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name-keyed map for one category.
///
/// Names are bound at most once. Lookups of an unbound name fail with
/// [`CoreError::MissingReference`] carrying the name and this map's kind.
#[derive(Clone)]
pub struct Bindings<T> {
    kind: ReferenceKind,
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Bindings<T> {
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Bind `name`. Binding the same name twice is an error.
    pub fn bind(&mut self, name: impl Into<String>, value: T) -> CoreResult<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(CoreError::DuplicateBinding {
                name,
                kind: self.kind,
            });
        }
        debug!("Binding {}: {}", self.kind, name);
        self.order.push(name.clone());
        self.entries.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    /// Resolve one reference.
    pub fn resolve(&self, name: &str) -> CoreResult<&T> {
        self.get(name).ok_or_else(|| CoreError::missing(name, self.kind))
    }

    /// Resolve an optional reference; `None` stays `None`.
    pub fn resolve_opt(&self, name: Option<&str>) -> CoreResult<Option<&T>> {
        name.map(|n| self.resolve(n)).transpose()
    }

    /// Resolve several references, keeping their order. The first unbound
    /// name fails the whole lookup.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> CoreResult<Vec<&T>> {
        names.iter().map(|n| self.resolve(n.as_ref())).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bound names, in binding order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    /// Entries in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|n| self.entries.get(n).map(|v| (n.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Named + Clone> Bindings<T> {
    /// Bind configuration records that need no declaration of their own.
    pub fn from_records(kind: ReferenceKind, records: &[T]) -> CoreResult<Self> {
        let mut bindings = Self::new(kind);
        for record in records {
            bindings.bind(record.name(), record.clone())?;
        }
        Ok(bindings)
    }
}

impl<T> fmt::Debug for Bindings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("kind", &self.kind)
            .field("names", &self.order)
            .finish()
    }
}
