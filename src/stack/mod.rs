//! Stack module.
//!
//! Turns a resource plan into descriptors for every resource of the stack:
//! network, subnet, role, security group and instance.

mod assembler;
mod types;

pub use assembler::{
    StackAssembler, INSTANCE_ID, INSTANCE_PROFILE_ID, INTERNET_GATEWAY_ID, ROLE_ID,
    ROUTE_TABLE_ID, SECURITY_GROUP_ID, SUBNET_ID, VPC_ID,
};
pub use types::{
    BlockDeviceDescriptor, InstanceDescriptor, NetworkDescriptor, RoleDescriptor,
    SecurityGroupDescriptor, StackDescriptor, SubnetDescriptor,
};
