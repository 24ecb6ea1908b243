//! Stack assembly.
//!
//! Expands a resource plan into the full set of resource descriptors.

use tracing::debug;

use crate::config::StackSettings;
use crate::planner::{PlanHasher, ResourcePlan};

use super::types::{
    BlockDeviceDescriptor, InstanceDescriptor, NetworkDescriptor, RoleDescriptor,
    SecurityGroupDescriptor, StackDescriptor, SubnetDescriptor,
};

/// Logical id of the VPC.
pub const VPC_ID: &str = "ds-vpc";

/// Logical id of the internet gateway.
pub const INTERNET_GATEWAY_ID: &str = "ds-igw";

/// Logical id of the public subnet.
pub const SUBNET_ID: &str = "ds-public-subnet";

/// Logical id of the public subnet's route table.
pub const ROUTE_TABLE_ID: &str = "ds-public-route-table";

/// Logical id of the role.
pub const ROLE_ID: &str = "ds-ec2-role";

/// Logical id of the instance profile.
pub const INSTANCE_PROFILE_ID: &str = "ds-ec2-instance-profile";

/// Logical id of the security group.
pub const SECURITY_GROUP_ID: &str = "ds-security-group";

/// Logical id of the instance.
pub const INSTANCE_ID: &str = "ds-instance";

/// Largest prefix length of the public subnet.
const SUBNET_PREFIX: u32 = 24;

/// Assembles stacks from plans.
#[derive(Debug)]
pub struct StackAssembler<'a> {
    /// Stack settings.
    settings: &'a StackSettings,
    /// Plan hasher.
    hasher: PlanHasher,
}

impl<'a> StackAssembler<'a> {
    /// Creates a new assembler.
    #[must_use]
    pub const fn new(settings: &'a StackSettings) -> Self {
        Self {
            settings,
            hasher: PlanHasher::new(),
        }
    }

    /// Assembles the stack for a plan in the given region.
    #[must_use]
    pub fn assemble(&self, plan: &ResourcePlan, region: &str) -> StackDescriptor {
        let settings = self.settings;
        debug!(
            "Assembling stack {} for {}",
            settings.stack_name, plan.instance_type
        );

        let network = NetworkDescriptor {
            logical_id: String::from(VPC_ID),
            cidr: settings.vpc_cidr.clone(),
            internet_gateway: String::from(INTERNET_GATEWAY_ID),
            subnet: SubnetDescriptor {
                logical_id: String::from(SUBNET_ID),
                cidr: first_subnet(&settings.vpc_cidr)
                    .unwrap_or_else(|| settings.vpc_cidr.clone()),
                route_table: String::from(ROUTE_TABLE_ID),
                map_public_ip_on_launch: true,
            },
        };

        let role = RoleDescriptor {
            logical_id: String::from(ROLE_ID),
            instance_profile: String::from(INSTANCE_PROFILE_ID),
            role_name: settings.role_name.clone(),
            assumed_by: settings.assumed_by.clone(),
            managed_policies: settings.managed_policies.clone(),
        };

        let security_group = SecurityGroupDescriptor {
            logical_id: String::from(SECURITY_GROUP_ID),
            name: settings.security_group_name.clone(),
            network: String::from(VPC_ID),
            allow_all_outbound: settings.allow_all_outbound,
            ingress: Vec::new(),
        };

        let instance = InstanceDescriptor {
            logical_id: String::from(INSTANCE_ID),
            instance_type: plan.instance_type.clone(),
            machine_image: plan.machine_image.clone(),
            user_data: plan.boot_parts.clone(),
            block_devices: vec![BlockDeviceDescriptor {
                device_name: settings.root_device_name.clone(),
                volume_size_gib: plan.root_volume_size_gib(),
            }],
            network: String::from(VPC_ID),
            subnet: String::from(SUBNET_ID),
            role: String::from(ROLE_ID),
            security_group: String::from(SECURITY_GROUP_ID),
        };

        StackDescriptor {
            stack_name: settings.stack_name.clone(),
            region: region.to_string(),
            plan_hash: self.hasher.hash_plan(plan),
            network,
            role,
            security_group,
            instance,
        }
    }
}

/// Returns the first subnet block of a VPC CIDR: the VPC's network address
/// with a `/24` prefix, or the VPC block itself when it is already smaller.
fn first_subnet(vpc_cidr: &str) -> Option<String> {
    let (address, prefix) = vpc_cidr.split_once('/')?;
    let prefix: u32 = prefix.parse().ok().filter(|p| *p <= 32)?;

    let octets = address
        .split('.')
        .map(|o| o.parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    let octets: [u8; 4] = octets.try_into().ok()?;

    let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
    let network = std::net::Ipv4Addr::from(u32::from_be_bytes(octets) & mask);

    Some(format!("{network}/{}", prefix.max(SUBNET_PREFIX)))
}
