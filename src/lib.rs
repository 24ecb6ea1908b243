// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # ds-ec2
//!
//! A deterministic planner for a single data-science EC2 instance.
//!
//! ## Overview
//!
//! Given a region, an instance type, an optional custom machine image and a
//! requirements file, ds-ec2 computes a resource plan:
//!
//! - CPU instance types get the latest Amazon Linux 2 image, a 25 GiB root
//!   volume, and boot commands that install python3.8, CPU-only torch and the
//!   required packages
//! - GPU instance types get the caller's deep learning image, a 60 GiB root
//!   volume, and one boot command installing the packages into the
//!   preinstalled `pytorch` environment
//!
//! The plan is then expanded into network, role, security group and instance
//! descriptors and handed to a provisioning collaborator. The bundled
//! collaborator writes a template document; nothing here calls a cloud API.
//!
//! ## Modules
//!
//! - [`config`]: Configuration sources, requirements loading and validation
//! - [`planner`]: GPU classification, resource planning and fingerprints
//! - [`stack`]: Resource descriptors for the whole stack
//! - [`provider`]: Provisioning collaborator boundary and template synthesis
//! - [`runner`]: End-to-end run
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use ds_ec2::config::ProvisioningRequest;
//! use ds_ec2::planner::ResourcePlanner;
//!
//! let request = ProvisioningRequest::new(
//!     "us-east-1",
//!     "c4.2xlarge",
//!     None,
//!     vec![String::from("pandas"), String::from("numpy")],
//! );
//! let plan = ResourcePlanner::default().plan(&request)?;
//! assert_eq!(plan.root_volume_size_gib(), 25);
//! # Ok::<(), ds_ec2::DsEc2Error>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod provider;
pub mod runner;
pub mod stack;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, DsConfig, PackageListLoader, ProvisioningRequest};
pub use error::{DsEc2Error, Result};
pub use planner::{classify, ComputeProfile, PlanHasher, ResourcePlan, ResourcePlanner};
pub use provider::{ProvisionOutcome, Provisioner, TemplateSynthesizer};
pub use runner::{PlanReport, Runner};
pub use stack::{StackAssembler, StackDescriptor};
