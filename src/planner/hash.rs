//! Plan fingerprints for change detection.
//!
//! Two runs that would materialize the same instance produce the same
//! fingerprint, so a caller can tell whether anything changed.

use sha2::{Digest, Sha256};

use super::plan::{MachineImageRef, ResourcePlan};

/// Hasher for computing plan fingerprints.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the hex SHA-256 fingerprint of a plan.
    #[must_use]
    pub fn hash_plan(&self, plan: &ResourcePlan) -> String {
        let mut hasher = Sha256::new();

        hasher.update(plan.profile.to_string().as_bytes());
        hasher.update(plan.instance_type.as_bytes());

        match &plan.machine_image {
            MachineImageRef::LatestAmazonLinux { generation } => {
                hasher.update(b"latest");
                hasher.update(generation.to_string().as_bytes());
            }
            MachineImageRef::Generic { region, image_id } => {
                hasher.update(b"generic");
                hasher.update(region.as_bytes());
                hasher.update(image_id.as_bytes());
            }
        }

        hasher.update(plan.root_volume_size_gib().to_be_bytes());

        // Separators keep ["a b"] and ["a", "b"] apart.
        for part in &plan.boot_parts {
            for line in &part.lines {
                hasher.update(line.as_bytes());
                hasher.update([0u8]);
            }
            hasher.update([1u8]);
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}
