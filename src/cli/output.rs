//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::planner::ComputeProfile;
use crate::provider::ProvisionOutcome;
use crate::runner::PlanReport;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Boot command row for table display.
#[derive(Tabled)]
struct BootCommandRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Command")]
    command: String,
}

/// Classification row for table display.
#[derive(Tabled)]
struct ClassificationRow {
    #[tabled(rename = "Instance type")]
    instance_type: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Root volume")]
    volume: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan report for display.
    #[must_use]
    pub fn format_plan(&self, report: &PlanReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(report)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(report),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(report: &PlanReport) -> String {
        let plan = &report.plan;
        let mut output = String::new();

        let _ = writeln!(output, "\nResource Plan");
        let _ = writeln!(output, "   Plan hash: {}", &report.plan_hash[..8.min(report.plan_hash.len())]);
        let _ = writeln!(output, "   Region: {}", report.request.region);
        let _ = writeln!(
            output,
            "   Instance: {} ({})",
            plan.instance_type,
            Self::format_profile(plan.profile)
        );
        let _ = writeln!(output, "   Image: {}", plan.machine_image_ref());
        let _ = writeln!(output, "   Root volume: {} GiB", plan.root_volume_size_gib());
        let _ = writeln!(output, "   Activation prefix: {:?}\n", plan.activation_prefix());

        let rows: Vec<BootCommandRow> = plan
            .boot_commands()
            .into_iter()
            .enumerate()
            .map(|(i, command)| BootCommandRow {
                index: i + 1,
                command,
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if !report.warnings.is_empty() {
            let _ = write!(output, "\n{} Warnings:\n", "!".yellow());
            for warning in &report.warnings {
                let _ = writeln!(output, "   - {warning}");
            }
        }

        output
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Configuration is valid!\n", "✓".green());
                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "!".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats instance type classifications.
    #[must_use]
    pub fn format_classification(&self, instance_types: &[String]) -> String {
        let profiles: Vec<(&String, ComputeProfile)> = instance_types
            .iter()
            .map(|t| (t, ComputeProfile::for_instance_type(t)))
            .collect();

        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = profiles
                    .iter()
                    .map(|(t, profile)| {
                        serde_json::json!({
                            "instance_type": t,
                            "is_gpu": profile.is_gpu(),
                            "root_volume_size_gib": profile.settings().root_volume_size_gib,
                        })
                    })
                    .collect();
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let rows: Vec<ClassificationRow> = profiles
                    .iter()
                    .map(|(t, profile)| ClassificationRow {
                        instance_type: (*t).clone(),
                        profile: Self::format_profile(*profile),
                        volume: format!("{} GiB", profile.settings().root_volume_size_gib),
                    })
                    .collect();
                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats a provisioning outcome.
    #[must_use]
    pub fn format_outcome(&self, outcome: &ProvisionOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!(
                    "{} Stack {} synthesized ({} resources, {} backend)\n",
                    "✓".green(),
                    outcome.stack_name,
                    outcome.resource_count,
                    outcome.backend
                );
                for artifact in &outcome.artifacts {
                    let _ = writeln!(output, "   {}", artifact.display());
                }
                output
            }
        }
    }

    /// Formats a compute profile with color.
    fn format_profile(profile: ComputeProfile) -> String {
        match profile {
            ComputeProfile::Cpu => "cpu".cyan().to_string(),
            ComputeProfile::Gpu => "gpu".magenta().to_string(),
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson<'a> {
    plan_hash: &'a str,
    region: &'a str,
    instance_type: &'a str,
    is_gpu: bool,
    machine_image_ref: String,
    activation_prefix: &'static str,
    root_volume_size_gib: u32,
    boot_commands: Vec<String>,
    warnings: &'a [String],
}

impl<'a> From<&'a PlanReport> for PlanJson<'a> {
    fn from(report: &'a PlanReport) -> Self {
        let plan = &report.plan;
        Self {
            plan_hash: &report.plan_hash,
            region: &report.request.region,
            instance_type: &plan.instance_type,
            is_gpu: plan.is_gpu(),
            machine_image_ref: plan.machine_image_ref(),
            activation_prefix: plan.activation_prefix(),
            root_volume_size_gib: plan.root_volume_size_gib(),
            boot_commands: plan.boot_commands(),
            warnings: &report.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvisioningRequest;
    use crate::planner::{PlanHasher, ResourcePlanner};

    fn report() -> PlanReport {
        let request = ProvisioningRequest::new(
            "us-east-1",
            "p3.2xlarge",
            Some(String::from("ami-123")),
            vec![String::from("torch")],
        );
        let plan = ResourcePlanner::default().plan(&request).unwrap();
        let plan_hash = PlanHasher::new().hash_plan(&plan);
        PlanReport {
            request,
            plan,
            plan_hash,
            warnings: vec![],
        }
    }

    #[test]
    fn test_plan_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_plan(&report())).unwrap();

        assert_eq!(value["is_gpu"], true);
        assert_eq!(value["root_volume_size_gib"], 60);
        assert_eq!(value["machine_image_ref"], "us-east-1=ami-123");
        assert_eq!(
            value["boot_commands"][0],
            "source activate pytorch;  pip install torch"
        );
    }

    #[test]
    fn test_plan_text_lists_commands() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_plan(&report());

        assert!(text.contains("Root volume: 60 GiB"));
        assert!(text.contains("source activate pytorch;  pip install torch"));
    }

    #[test]
    fn test_classification_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let types = vec![String::from("c4.2xlarge"), String::from("g5.xlarge")];
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_classification(&types)).unwrap();

        assert_eq!(value[0]["is_gpu"], false);
        assert_eq!(value[1]["is_gpu"], true);
        assert_eq!(value[1]["root_volume_size_gib"], 60);
    }
}
