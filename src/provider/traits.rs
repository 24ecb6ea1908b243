//! Provisioning collaborator interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::error::Result;
use crate::stack::StackDescriptor;

/// What a provisioner did with a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionOutcome {
    /// Backend that handled the stack.
    pub backend: String,
    /// Stack name.
    pub stack_name: String,
    /// Number of resources handed over.
    pub resource_count: usize,
    /// Plan fingerprint.
    pub plan_hash: String,
    /// Files written, if any.
    pub artifacts: Vec<PathBuf>,
    /// When the hand-off completed.
    pub completed_at: DateTime<Utc>,
}

/// Trait for provisioning collaborators.
///
/// Implementations materialize a stack; planning never depends on them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Hands the stack over for materialization.
    async fn provision(&self, stack: &StackDescriptor) -> Result<ProvisionOutcome>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
