//! Configuration validation for planner inputs.
//!
//! Validation collects every problem it finds. Errors stop the run; warnings
//! are reported and planning carries on.

use crate::error::{ConfigError, DsEc2Error, Result};
use crate::planner::classify;
use tracing::debug;

use super::spec::{DsConfig, InstanceConfig, InstanceType, StackSettings};

/// Validator for planner configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

/// Smallest VPC prefix length accepted.
const MIN_VPC_PREFIX: u8 = 16;

/// Largest VPC prefix length accepted.
const MAX_VPC_PREFIX: u8 = 28;

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a planner configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error found if validation fails.
    pub fn validate(&self, config: &DsConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_stack(&config.stack, &mut result);
        Self::validate_instance(&config.instance, &mut result);

        if result.errors.is_empty() {
            debug!(
                "Configuration validation passed with {} warnings",
                result.warnings.len()
            );
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(DsEc2Error::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Validates the surrounding stack settings.
    fn validate_stack(stack: &StackSettings, result: &mut ValidationResult) {
        if stack.stack_name.is_empty() {
            result.error("stack.stack_name", "Stack name cannot be empty");
        }

        if let Err(message) = check_cidr(&stack.vpc_cidr) {
            result.error("stack.vpc_cidr", message);
        }

        if stack.role_name.is_empty() {
            result.error("stack.role_name", "Role name cannot be empty");
        }

        if stack.security_group_name.is_empty() {
            result.error(
                "stack.security_group_name",
                "Security group name cannot be empty",
            );
        }

        if !stack.root_device_name.starts_with('/') {
            result.error(
                "stack.root_device_name",
                format!(
                    "Root device name must be absolute: {}",
                    stack.root_device_name
                ),
            );
        }

        if stack.managed_policies.is_empty() {
            result.warnings.push(String::from(
                "stack.managed_policies: No managed policies; the instance will not be reachable through SSM",
            ));
        }
    }

    /// Validates instance selection.
    fn validate_instance(instance: &InstanceConfig, result: &mut ValidationResult) {
        if instance.region.as_deref().is_none_or(str::is_empty) {
            result.error("instance.region", "Region is not set (CDK_DEFAULT_REGION)");
        }

        let instance_type = instance.instance_type.as_str();
        if instance_type.is_empty() {
            result.error("instance.instance_type", "Instance type cannot be empty");
            return;
        }

        let is_gpu = classify(instance_type);

        if is_gpu && is_loose_gpu_match(instance_type) {
            result.warnings.push(format!(
                "instance.instance_type: '{instance_type}' is classified as GPU only because it contains the letter 'p'"
            ));
        }

        if let Some(image_id) = &instance.custom_image_id {
            if !is_gpu {
                result.warnings.push(format!(
                    "instance.custom_image_id: '{image_id}' is ignored for CPU instance '{instance_type}'"
                ));
            }
            if !image_id.starts_with("ami-") {
                result.warnings.push(format!(
                    "instance.custom_image_id: '{image_id}' does not look like a machine image id"
                ));
            }
        }
    }
}

/// True when only the bare `"p"` substring rule matched and the family does
/// not start with `p`.
fn is_loose_gpu_match(instance_type: &str) -> bool {
    if instance_type.contains("g5") || instance_type.contains("g4") {
        return false;
    }

    InstanceType::parse(instance_type).map_or(true, |parsed| !parsed.family.starts_with('p'))
}

/// Checks an IPv4 CIDR block of the form `a.b.c.d/n`.
fn check_cidr(cidr: &str) -> std::result::Result<(), String> {
    let Some((address, prefix)) = cidr.split_once('/') else {
        return Err(format!("VPC CIDR '{cidr}' is missing a prefix length"));
    };

    let octets: Vec<&str> = address.split('.').collect();
    if octets.len() != 4 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
        return Err(format!("VPC CIDR '{cidr}' has an invalid address"));
    }

    match prefix.parse::<u8>() {
        Ok(n) if (MIN_VPC_PREFIX..=MAX_VPC_PREFIX).contains(&n) => Ok(()),
        _ => Err(format!(
            "VPC CIDR '{cidr}' prefix must be between /{MIN_VPC_PREFIX} and /{MAX_VPC_PREFIX}"
        )),
    }
}

impl ValidationResult {
    /// Records an error for a field.
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
