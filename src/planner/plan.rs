//! Resource plan types and construction.
//!
//! A plan is computed once from a [`ProvisioningRequest`] and never mutated.
//! The CPU/GPU decision is carried by [`ComputeProfile`], which fixes the root
//! volume size, the activation prefix and the kind of machine image.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{InstanceType, ProvisioningRequest};
use crate::error::{ConfigError, Result};

use super::classify::classify;

/// Shell line installing the interpreter on the generic image.
pub const INSTALL_PYTHON_CMD: &str =
    "sudo yum update & sudo amazon-linux-extras install -y python3.8 ";

/// Package index serving CPU-only torch wheels.
pub const TORCH_CPU_INDEX_URL: &str = "https://download.pytorch.org/whl/cpu";

/// CPU or GPU software setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeProfile {
    /// Generic image; interpreter and CPU torch installed at boot.
    Cpu,
    /// Deep learning image with a preinstalled `pytorch` environment.
    Gpu,
}

/// Values fixed by a compute profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSettings {
    /// Root volume size in GiB.
    pub root_volume_size_gib: u32,
    /// Fragment activating the interpreter environment.
    pub activation_prefix: &'static str,
}

/// Generation of the generic Amazon Linux image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmazonLinuxGeneration {
    /// Amazon Linux 2.
    #[serde(rename = "amazon-linux-2")]
    AmazonLinux2,
}

/// Machine image selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MachineImageRef {
    /// The latest image of a fixed generation.
    LatestAmazonLinux {
        /// Image generation.
        generation: AmazonLinuxGeneration,
    },
    /// A caller-supplied image, keyed by region.
    Generic {
        /// Region the image lives in.
        region: String,
        /// Image identifier.
        image_id: String,
    },
}

/// One part of the multipart boot script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootScriptPart {
    /// Shell lines, run in order.
    pub lines: Vec<String>,
}

/// The output of planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePlan {
    /// Selected profile.
    pub profile: ComputeProfile,
    /// Instance type the plan was computed for.
    pub instance_type: String,
    /// Selected machine image.
    pub machine_image: MachineImageRef,
    /// Boot script parts; the last one installs the required packages.
    pub boot_parts: Vec<BootScriptPart>,
}

/// Planner options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Reject instance types that are not `family.size`.
    pub strict_instance_type: bool,
}

/// Computes resource plans.
#[derive(Debug, Default)]
pub struct ResourcePlanner {
    /// Planner options.
    options: PlannerOptions,
}

impl ComputeProfile {
    /// Selects the profile for an instance type.
    #[must_use]
    pub fn for_instance_type(instance_type: &str) -> Self {
        if classify(instance_type) {
            Self::Gpu
        } else {
            Self::Cpu
        }
    }

    /// Returns the values fixed by this profile.
    #[must_use]
    pub const fn settings(self) -> ProfileSettings {
        match self {
            Self::Cpu => ProfileSettings {
                root_volume_size_gib: 25,
                activation_prefix: "python3.8 -m ",
            },
            Self::Gpu => ProfileSettings {
                root_volume_size_gib: 60,
                activation_prefix: "source activate pytorch; ",
            },
        }
    }

    /// Returns true for the GPU profile.
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        matches!(self, Self::Gpu)
    }
}

impl BootScriptPart {
    /// Creates a part from shell lines.
    #[must_use]
    pub const fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Renders the part as a single command string.
    #[must_use]
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl ResourcePlanner {
    /// Creates a planner with the given options.
    #[must_use]
    pub const fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    /// Computes the plan for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the package list is empty, if a GPU instance is
    /// requested without a custom image, or, in strict mode, if the instance
    /// type is malformed.
    pub fn plan(&self, request: &ProvisioningRequest) -> Result<ResourcePlan> {
        if self.options.strict_instance_type {
            InstanceType::parse(&request.instance_type)?;
        }

        if request.required_packages.is_empty() {
            return Err(ConfigError::EmptyPackageList.into());
        }

        let profile = ComputeProfile::for_instance_type(&request.instance_type);
        debug!("Instance type {} classified as {:?}", request.instance_type, profile);

        let prefix = profile.settings().activation_prefix;

        let (machine_image, mut boot_parts) = match profile {
            ComputeProfile::Cpu => {
                let preamble = BootScriptPart::new(vec![
                    String::from(INSTALL_PYTHON_CMD),
                    format!("{prefix} pip install torch --extra-index-url {TORCH_CPU_INDEX_URL}"),
                ]);
                (
                    MachineImageRef::LatestAmazonLinux {
                        generation: AmazonLinuxGeneration::AmazonLinux2,
                    },
                    vec![preamble],
                )
            }
            ComputeProfile::Gpu => {
                let image_id = request
                    .custom_image_id
                    .clone()
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        ConfigError::MissingCustomImage {
                            instance_type: request.instance_type.clone(),
                        }
                    })?;
                (
                    MachineImageRef::Generic {
                        region: request.region.clone(),
                        image_id,
                    },
                    Vec::new(),
                )
            }
        };

        let install = install_command(prefix, &request.required_packages);
        info!("{install}");
        boot_parts.push(BootScriptPart::new(vec![install]));

        Ok(ResourcePlan {
            profile,
            instance_type: request.instance_type.clone(),
            machine_image,
            boot_parts,
        })
    }
}

/// Builds the dependency install command.
#[must_use]
pub fn install_command(prefix: &str, packages: &[String]) -> String {
    format!("{prefix} pip install {}", packages.join(" "))
}

impl ResourcePlan {
    /// Returns true if the plan targets a GPU instance.
    #[must_use]
    pub const fn is_gpu(&self) -> bool {
        self.profile.is_gpu()
    }

    /// Returns the root volume size in GiB.
    #[must_use]
    pub const fn root_volume_size_gib(&self) -> u32 {
        self.profile.settings().root_volume_size_gib
    }

    /// Returns the activation prefix.
    #[must_use]
    pub const fn activation_prefix(&self) -> &'static str {
        self.profile.settings().activation_prefix
    }

    /// Returns the machine image reference as a string.
    #[must_use]
    pub fn machine_image_ref(&self) -> String {
        self.machine_image.to_string()
    }

    /// Returns one rendered command per boot script part.
    #[must_use]
    pub fn boot_commands(&self) -> Vec<String> {
        self.boot_parts.iter().map(BootScriptPart::render).collect()
    }

    /// Returns the final dependency install command.
    #[must_use]
    pub fn install_command(&self) -> Option<String> {
        self.boot_parts.last().map(BootScriptPart::render)
    }
}

impl std::fmt::Display for ComputeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for AmazonLinuxGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AmazonLinux2 => write!(f, "amazon-linux-2"),
        }
    }
}

impl std::fmt::Display for MachineImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatestAmazonLinux { generation } => write!(f, "{generation}:latest"),
            Self::Generic { region, image_id } => write!(f, "{region}={image_id}"),
        }
    }
}

impl std::fmt::Display for ResourcePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Resource Plan ({}, {}):", self.instance_type, self.profile)?;
        writeln!(f, "  image: {}", self.machine_image)?;
        writeln!(f, "  root volume: {} GiB", self.root_volume_size_gib())?;
        for (i, command) in self.boot_commands().iter().enumerate() {
            writeln!(f, "  boot[{i}]: {}", command.replace('\n', " && "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DsEc2Error, InputParseError};

    fn request(instance_type: &str, image: Option<&str>, packages: &[&str]) -> ProvisioningRequest {
        ProvisioningRequest::new(
            "us-east-1",
            instance_type,
            image.map(String::from),
            packages.iter().map(|p| (*p).to_string()).collect(),
        )
    }

    #[test]
    fn test_cpu_plan() {
        let plan = ResourcePlanner::default()
            .plan(&request("c4.2xlarge", None, &["pandas", "numpy"]))
            .unwrap();

        assert!(!plan.is_gpu());
        assert_eq!(plan.root_volume_size_gib(), 25);
        assert_eq!(plan.activation_prefix(), "python3.8 -m ");
        assert_eq!(plan.machine_image_ref(), "amazon-linux-2:latest");

        let commands = plan.boot_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            "sudo yum update & sudo amazon-linux-extras install -y python3.8 \n\
             python3.8 -m  pip install torch --extra-index-url https://download.pytorch.org/whl/cpu"
        );
        assert_eq!(commands[1], "python3.8 -m  pip install pandas numpy");
    }

    #[test]
    fn test_gpu_plan() {
        let plan = ResourcePlanner::default()
            .plan(&request("p3.2xlarge", Some("ami-123"), &["torch"]))
            .unwrap();

        assert!(plan.is_gpu());
        assert_eq!(plan.root_volume_size_gib(), 60);
        assert_eq!(plan.machine_image_ref(), "us-east-1=ami-123");
        assert_eq!(
            plan.boot_commands(),
            vec!["source activate pytorch;  pip install torch"]
        );
    }

    #[test]
    fn test_package_order_preserved() {
        let plan = ResourcePlanner::default()
            .plan(&request("m5.large", None, &["zeta", "alpha", "mid"]))
            .unwrap();
        assert_eq!(
            plan.install_command().as_deref(),
            Some("python3.8 -m  pip install zeta alpha mid")
        );
    }

    #[test]
    fn test_empty_packages_fail() {
        let result = ResourcePlanner::default().plan(&request("c4.2xlarge", None, &[]));
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::EmptyPackageList))
        ));
    }

    #[test]
    fn test_gpu_without_image_fails() {
        let result = ResourcePlanner::default().plan(&request("g4dn.xlarge", None, &["torch"]));
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::MissingCustomImage { .. }))
        ));
    }

    #[test]
    fn test_gpu_with_empty_image_fails() {
        let result = ResourcePlanner::default().plan(&request("p3.2xlarge", Some(""), &["torch"]));
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::MissingCustomImage { .. }))
        ));
    }

    #[test]
    fn test_cpu_ignores_custom_image() {
        let plan = ResourcePlanner::default()
            .plan(&request("t3.micro", Some("ami-999"), &["pandas"]))
            .unwrap();
        assert_eq!(
            plan.machine_image,
            MachineImageRef::LatestAmazonLinux {
                generation: AmazonLinuxGeneration::AmazonLinux2
            }
        );
    }

    #[test]
    fn test_plan_is_pure() {
        let planner = ResourcePlanner::default();
        let req = request("g5.xlarge", Some("ami-1"), &["torch", "transformers"]);
        assert_eq!(planner.plan(&req).unwrap(), planner.plan(&req).unwrap());
    }

    #[test]
    fn test_strict_mode_rejects_malformed_type() {
        let lenient = ResourcePlanner::default().plan(&request("weird", None, &["x"]));
        assert!(lenient.is_ok());

        let strict = ResourcePlanner::new(PlannerOptions {
            strict_instance_type: true,
        })
        .plan(&request("weird", None, &["x"]));
        assert!(matches!(
            strict,
            Err(DsEc2Error::Input(InputParseError::InvalidInstanceType { .. }))
        ));
    }

    #[test]
    fn test_profile_settings_depend_only_on_profile() {
        for instance_type in ["c4.2xlarge", "m5.large", "p3.2xlarge", "g5.xlarge"] {
            let profile = ComputeProfile::for_instance_type(instance_type);
            let expected = if classify(instance_type) { 60 } else { 25 };
            assert_eq!(profile.settings().root_volume_size_gib, expected);
        }
    }
}
