//! Configuration specification types for the planner.
//!
//! This module defines the structs that map to the optional `ds-ec2.yaml`
//! file, plus the immutable [`ProvisioningRequest`] handed to the planner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InputParseError;

/// Default instance type when none is configured.
pub const DEFAULT_INSTANCE_TYPE: &str = "c4.2xlarge";

/// Default location of the requirements file.
pub const DEFAULT_REQUIREMENTS_PATH: &str = "ds_ec2/requirements.txt";

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DsConfig {
    /// Settings for the resources surrounding the instance.
    #[serde(default)]
    pub stack: StackSettings,
    /// Instance selection.
    #[serde(default)]
    pub instance: InstanceConfig,
}

/// Settings for the network, role and security group around the instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackSettings {
    /// Name of the stack, used for output file names.
    #[serde(default = "default_stack_name")]
    pub stack_name: String,
    /// CIDR block of the VPC.
    #[serde(default = "default_vpc_cidr")]
    pub vpc_cidr: String,
    /// IAM role name.
    #[serde(default = "default_role_name")]
    pub role_name: String,
    /// Service principal allowed to assume the role.
    #[serde(default = "default_assumed_by")]
    pub assumed_by: String,
    /// Managed policies attached to the role.
    #[serde(default = "default_managed_policies")]
    pub managed_policies: Vec<String>,
    /// Security group name.
    #[serde(default = "default_security_group_name")]
    pub security_group_name: String,
    /// Whether all outbound traffic is allowed.
    #[serde(default = "default_allow_all_outbound")]
    pub allow_all_outbound: bool,
    /// Device name of the root volume.
    #[serde(default = "default_root_device_name")]
    pub root_device_name: String,
}

/// Instance selection, before environment and CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Target region.
    #[serde(default)]
    pub region: Option<String>,
    /// Instance type string (e.g. `c4.2xlarge`).
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    /// Custom machine image id, required for GPU instances.
    #[serde(default)]
    pub custom_image_id: Option<String>,
    /// Path to the requirements file.
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
}

/// The immutable input to planning, constructed once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningRequest {
    /// Target region.
    pub region: String,
    /// Instance type string.
    pub instance_type: String,
    /// Custom machine image id.
    pub custom_image_id: Option<String>,
    /// Packages to install, in order.
    pub required_packages: Vec<String>,
}

/// A syntactically checked instance type, `family.size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceType {
    /// Family part (e.g. `g4dn`).
    pub family: String,
    /// Size part (e.g. `xlarge`).
    pub size: String,
}

fn default_stack_name() -> String {
    String::from("ds-ec2")
}

fn default_vpc_cidr() -> String {
    String::from("10.0.0.0/16")
}

fn default_role_name() -> String {
    String::from("ds-ec2-role")
}

fn default_assumed_by() -> String {
    String::from("ec2.amazonaws.com")
}

fn default_managed_policies() -> Vec<String> {
    vec![String::from("AmazonSSMManagedInstanceCore")]
}

fn default_security_group_name() -> String {
    String::from("ds-security-group")
}

const fn default_allow_all_outbound() -> bool {
    true
}

fn default_root_device_name() -> String {
    String::from("/dev/xvda")
}

fn default_instance_type() -> String {
    String::from(DEFAULT_INSTANCE_TYPE)
}

fn default_requirements() -> PathBuf {
    PathBuf::from(DEFAULT_REQUIREMENTS_PATH)
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            stack_name: default_stack_name(),
            vpc_cidr: default_vpc_cidr(),
            role_name: default_role_name(),
            assumed_by: default_assumed_by(),
            managed_policies: default_managed_policies(),
            security_group_name: default_security_group_name(),
            allow_all_outbound: default_allow_all_outbound(),
            root_device_name: default_root_device_name(),
        }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            region: None,
            instance_type: default_instance_type(),
            custom_image_id: None,
            requirements: default_requirements(),
        }
    }
}

impl ProvisioningRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        instance_type: impl Into<String>,
        custom_image_id: Option<String>,
        required_packages: Vec<String>,
    ) -> Self {
        Self {
            region: region.into(),
            instance_type: instance_type.into(),
            custom_image_id,
            required_packages,
        }
    }
}

impl InstanceType {
    /// Parses an instance type like `g4dn.xlarge`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `family.size`, the family does
    /// not start with a lowercase letter, or either part has stray characters.
    pub fn parse(s: &str) -> Result<Self, InputParseError> {
        let Some((family, size)) = s.split_once('.') else {
            return Err(InputParseError::instance_type(s, "expected FAMILY.SIZE"));
        };

        if !family.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(InputParseError::instance_type(
                s,
                "family must start with a lowercase letter",
            ));
        }

        if !family
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(InputParseError::instance_type(
                s,
                "family must be lowercase alphanumeric",
            ));
        }

        if size.is_empty() || !size.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InputParseError::instance_type(
                s,
                "size must be non-empty alphanumeric",
            ));
        }

        Ok(Self {
            family: family.to_string(),
            size: size.to_string(),
        })
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.family, self.size)
    }
}
