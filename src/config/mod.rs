//! Configuration module for the ds-ec2 planner.
//!
//! This module handles all configuration-related functionality:
//! - Parsing the optional `ds-ec2.yaml` file
//! - Environment and command-line overrides
//! - Loading the requirements file
//! - Validation of configuration values

mod spec;
mod packages;
mod parser;
mod validator;

pub use spec::{
    DsConfig, InstanceConfig, InstanceType, ProvisioningRequest, StackSettings,
    DEFAULT_INSTANCE_TYPE, DEFAULT_REQUIREMENTS_PATH,
};
pub use packages::PackageListLoader;
pub use parser::{
    find_config_file, ConfigParser, InstanceOverrides, CUSTOM_IMAGE_ENV, INSTANCE_TYPE_ENV,
    REGION_ENV, REQUIREMENTS_ENV,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
