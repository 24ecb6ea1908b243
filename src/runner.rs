//! End-to-end run: configuration to plan to provisioning hand-off.
//!
//! The runner validates the configuration, builds the request, computes the
//! plan and, for `synth`, assembles the stack and passes it to a
//! [`Provisioner`].

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigParser, ConfigValidator, DsConfig, ProvisioningRequest};
use crate::error::Result;
use crate::planner::{PlanHasher, PlannerOptions, ResourcePlan, ResourcePlanner};
use crate::provider::{ProvisionOutcome, Provisioner};
use crate::stack::{StackAssembler, StackDescriptor};

/// Drives a single planning run.
#[derive(Debug)]
pub struct Runner<'a> {
    /// Configuration.
    config: &'a DsConfig,
    /// Parser used to build the request.
    parser: &'a ConfigParser,
    /// Resource planner.
    planner: ResourcePlanner,
    /// Plan hasher.
    hasher: PlanHasher,
}

/// Result of planning.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// The request the plan was computed from.
    pub request: ProvisioningRequest,
    /// The plan.
    pub plan: ResourcePlan,
    /// Plan fingerprint.
    pub plan_hash: String,
    /// Validation warnings.
    pub warnings: Vec<String>,
}

impl<'a> Runner<'a> {
    /// Creates a new runner.
    #[must_use]
    pub const fn new(config: &'a DsConfig, parser: &'a ConfigParser) -> Self {
        Self {
            config,
            parser,
            planner: ResourcePlanner::new(PlannerOptions {
                strict_instance_type: false,
            }),
            hasher: PlanHasher::new(),
        }
    }

    /// Sets planner options.
    #[must_use]
    pub const fn with_options(mut self, options: PlannerOptions) -> Self {
        self.planner = ResourcePlanner::new(options);
        self
    }

    /// Validates the configuration and computes the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, request construction or planning fails.
    pub fn plan(&self) -> Result<PlanReport> {
        let validation = ConfigValidator::new().validate(self.config)?;
        for warning in &validation.warnings {
            warn!("{warning}");
        }

        let request = self.parser.build_request(&self.config.instance)?;
        let plan = self.planner.plan(&request)?;
        let plan_hash = self.hasher.hash_plan(&plan);

        info!(
            "Planned {} instance {} ({})",
            plan.profile,
            plan.instance_type,
            self.hasher.short_hash(&plan_hash)
        );

        Ok(PlanReport {
            request,
            plan,
            plan_hash,
            warnings: validation.warnings,
        })
    }

    /// Assembles the stack for a plan report.
    #[must_use]
    pub fn assemble(&self, report: &PlanReport) -> StackDescriptor {
        StackAssembler::new(&self.config.stack).assemble(&report.plan, &report.request.region)
    }

    /// Plans, assembles and hands the stack to the provisioner.
    ///
    /// # Errors
    ///
    /// Returns an error if planning fails or the provisioner rejects the stack.
    pub async fn synth<P>(&self, provisioner: &P) -> Result<ProvisionOutcome>
    where
        P: Provisioner + ?Sized,
    {
        let report = self.plan()?;
        let stack = self.assemble(&report);

        info!(
            "Handing stack {} to {} backend",
            stack.stack_name,
            provisioner.backend_type()
        );
        provisioner.provision(&stack).await
    }
}
