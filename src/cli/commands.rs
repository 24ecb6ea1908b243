//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::InstanceOverrides;
use crate::provider::DEFAULT_OUT_DIR;

/// ds-ec2 - plan a CPU or GPU data-science instance.
#[derive(Parser, Debug)]
#[command(name = "ds-ec2")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "DS_EC2_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Target region (overrides `CDK_DEFAULT_REGION`).
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Instance type (overrides `INSTANCE_TYPE`).
    #[arg(long, global = true)]
    pub instance_type: Option<String>,

    /// Custom machine image id (overrides `AWS_AMI`).
    #[arg(long, global = true)]
    pub image_id: Option<String>,

    /// Requirements file (overrides `DS_EC2_REQUIREMENTS`).
    #[arg(long, global = true)]
    pub requirements: Option<PathBuf>,

    /// Reject instance types that are not `family.size`.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute and display the resource plan.
    Plan,

    /// Plan, assemble the stack and write the template.
    Synth {
        /// Output directory.
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },

    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show how instance types are classified.
    Classify {
        /// Instance types to classify.
        #[arg(required = true)]
        instance_types: Vec<String>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Returns the instance overrides given on the command line.
    #[must_use]
    pub fn overrides(&self) -> InstanceOverrides {
        InstanceOverrides {
            region: self.region.clone(),
            instance_type: self.instance_type.clone(),
            custom_image_id: self.image_id.clone(),
            requirements: self.requirements.clone(),
        }
    }
}
