//! Provisioning collaborator boundary.
//!
//! This module defines the [`Provisioner`] trait and the bundled backend,
//! which renders the stack to a template document instead of calling a
//! cloud control plane.

mod synth;
mod template;
mod traits;
mod user_data;

pub use synth::{TemplateSynthesizer, DEFAULT_OUT_DIR};
pub use template::{logical_id, render_template};
pub use traits::{ProvisionOutcome, Provisioner};
pub use user_data::{render_multipart, BOUNDARY};

#[cfg(test)]
pub use traits::MockProvisioner;
