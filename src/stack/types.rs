//! Resource descriptor types.
//!
//! These describe what should exist. They carry no behaviour of the cloud
//! provider; a provisioning collaborator turns them into real resources.

use serde::Serialize;

use crate::planner::{BootScriptPart, MachineImageRef};

/// The network the instance lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    /// Logical id.
    pub logical_id: String,
    /// CIDR block.
    pub cidr: String,
    /// Logical id of the internet gateway attached to the network.
    pub internet_gateway: String,
    /// The subnet the instance is launched into.
    pub subnet: SubnetDescriptor,
}

/// A public subnet routed to the internet gateway.
///
/// Session manager needs outbound HTTPS; the default route through the
/// gateway and a public address provide it without any ingress rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetDescriptor {
    /// Logical id.
    pub logical_id: String,
    /// CIDR block, inside the network's block.
    pub cidr: String,
    /// Logical id of the subnet's route table.
    pub route_table: String,
    /// Whether instances get a public address on launch.
    pub map_public_ip_on_launch: bool,
}

/// The role assumed by the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescriptor {
    /// Logical id.
    pub logical_id: String,
    /// Logical id of the instance profile wrapping the role.
    pub instance_profile: String,
    /// Role name.
    pub role_name: String,
    /// Service principal allowed to assume the role.
    pub assumed_by: String,
    /// Attached managed policies.
    pub managed_policies: Vec<String>,
}

/// The instance security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupDescriptor {
    /// Logical id.
    pub logical_id: String,
    /// Group name.
    pub name: String,
    /// Network the group belongs to.
    pub network: String,
    /// Whether all outbound traffic is allowed.
    pub allow_all_outbound: bool,
    /// Ingress rules. Always empty: access goes through session manager.
    pub ingress: Vec<String>,
}

/// A block device mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDeviceDescriptor {
    /// Device name.
    pub device_name: String,
    /// Volume size in GiB.
    pub volume_size_gib: u32,
}

/// The instance itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceDescriptor {
    /// Logical id.
    pub logical_id: String,
    /// Instance type.
    pub instance_type: String,
    /// Machine image.
    pub machine_image: MachineImageRef,
    /// Boot script parts.
    pub user_data: Vec<BootScriptPart>,
    /// Block devices.
    pub block_devices: Vec<BlockDeviceDescriptor>,
    /// Logical id of the network.
    pub network: String,
    /// Logical id of the subnet.
    pub subnet: String,
    /// Logical id of the role.
    pub role: String,
    /// Logical id of the security group.
    pub security_group: String,
}

/// The complete set of resources for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackDescriptor {
    /// Stack name.
    pub stack_name: String,
    /// Target region.
    pub region: String,
    /// Fingerprint of the plan the stack was assembled from.
    pub plan_hash: String,
    /// Network.
    pub network: NetworkDescriptor,
    /// Role.
    pub role: RoleDescriptor,
    /// Security group.
    pub security_group: SecurityGroupDescriptor,
    /// Instance.
    pub instance: InstanceDescriptor,
}

impl StackDescriptor {
    /// Returns logical ids in creation order.
    #[must_use]
    pub fn resource_ids(&self) -> Vec<&str> {
        vec![
            self.network.logical_id.as_str(),
            self.network.internet_gateway.as_str(),
            self.network.subnet.logical_id.as_str(),
            self.network.subnet.route_table.as_str(),
            self.role.logical_id.as_str(),
            self.role.instance_profile.as_str(),
            self.security_group.logical_id.as_str(),
            self.instance.logical_id.as_str(),
        ]
    }
}
