//! Planning module.
//!
//! This module classifies the instance type and turns a provisioning request
//! into a resource plan, plus a fingerprint of that plan.

mod classify;
mod hash;
mod plan;

pub use classify::{classify, GPU_MARKERS};
pub use hash::PlanHasher;
pub use plan::{
    install_command, AmazonLinuxGeneration, BootScriptPart, ComputeProfile, MachineImageRef,
    PlannerOptions, ProfileSettings, ResourcePlan, ResourcePlanner, INSTALL_PYTHON_CMD,
    TORCH_CPU_INDEX_URL,
};
