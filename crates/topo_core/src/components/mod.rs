//! Per-category binding and declaration.
//!
//! Each component resolves the references of its records against the
//! bindings of earlier stages, declares what needs declaring, and returns
//! the bindings of its own category.

pub mod app_security_group;
pub mod bastion;
pub mod compute;
pub mod load_balancer;
pub mod network;
pub mod public_ip;
pub mod resource_group;

pub use compute::{InstanceBinding, Profiles, VirtualMachineBinding};
pub use load_balancer::{LoadBalancerBinding, LoadBalancerNames};
pub use network::{BoundRule, BoundSubnet, SubnetMatch, VirtualNetworkBinding};
pub use resource_group::ResourceGroupBinding;
