//! Template synthesizer backend.
//!
//! Writes the template and the user data document into an output directory,
//! the way a provisioning framework's synth step would.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{DsEc2Error, ProvisionError, Result};
use crate::stack::StackDescriptor;

use super::template::render_template;
use super::traits::{ProvisionOutcome, Provisioner};
use super::user_data::render_multipart;

/// Default output directory.
pub const DEFAULT_OUT_DIR: &str = "cdk.out";

/// Writes templates to a local directory.
#[derive(Debug)]
pub struct TemplateSynthesizer {
    /// Output directory.
    out_dir: PathBuf,
}

impl TemplateSynthesizer {
    /// Creates a synthesizer writing into the given directory.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Returns the path of the template file for a stack.
    #[must_use]
    pub fn template_path(&self, stack_name: &str) -> PathBuf {
        self.out_dir.join(format!("{stack_name}.template.json"))
    }

    /// Returns the path of the user data file for a stack.
    #[must_use]
    pub fn user_data_path(&self, stack_name: &str) -> PathBuf {
        self.out_dir.join(format!("{stack_name}.user-data.txt"))
    }

    /// Ensures the output directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if !self.out_dir.exists() {
            debug!("Creating output directory: {}", self.out_dir.display());
            fs::create_dir_all(&self.out_dir).await.map_err(|e| {
                DsEc2Error::Provision(ProvisionError::write(
                    &self.out_dir,
                    format!("Failed to create output directory: {e}"),
                ))
            })?;
        }
        Ok(())
    }

    /// Writes a file.
    async fn write_file(path: &Path, content: &str) -> Result<()> {
        let mut file = fs::File::create(path).await.map_err(|e| {
            DsEc2Error::Provision(ProvisionError::write(path, e.to_string()))
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            DsEc2Error::Provision(ProvisionError::write(path, e.to_string()))
        })?;

        file.flush().await.map_err(|e| {
            DsEc2Error::Provision(ProvisionError::write(path, e.to_string()))
        })?;

        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl Default for TemplateSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_OUT_DIR)
    }
}

#[async_trait]
impl Provisioner for TemplateSynthesizer {
    async fn provision(&self, stack: &StackDescriptor) -> Result<ProvisionOutcome> {
        info!("Synthesizing stack {} into {}", stack.stack_name, self.out_dir.display());

        self.ensure_dir().await?;

        let template = render_template(stack);
        let resource_count = template["Resources"].as_object().map_or(0, Map::len);
        let content = serde_json::to_string_pretty(&template).map_err(|e| {
            DsEc2Error::Provision(ProvisionError::RenderFailed {
                stack: stack.stack_name.clone(),
                message: e.to_string(),
            })
        })?;

        let template_path = self.template_path(&stack.stack_name);
        Self::write_file(&template_path, &content).await?;

        let user_data_path = self.user_data_path(&stack.stack_name);
        Self::write_file(&user_data_path, &render_multipart(&stack.instance.user_data)).await?;

        info!("Synthesized {resource_count} resources");

        Ok(ProvisionOutcome {
            backend: String::from(self.backend_type()),
            stack_name: stack.stack_name.clone(),
            resource_count,
            plan_hash: stack.plan_hash.clone(),
            artifacts: vec![template_path, user_data_path],
            completed_at: Utc::now(),
        })
    }

    fn backend_type(&self) -> &'static str {
        "synth"
    }
}
