//! Configuration parser for loading and merging configuration sources.
//!
//! Sources are applied in order: defaults, the YAML file, the `.env` file,
//! process environment variables and finally explicit overrides from the
//! command line.

use crate::error::{ConfigError, DsEc2Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::packages::PackageListLoader;
use super::spec::{DsConfig, InstanceConfig, ProvisioningRequest};

/// Environment variable holding the target region.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Environment variable holding the instance type.
pub const INSTANCE_TYPE_ENV: &str = "INSTANCE_TYPE";

/// Environment variable holding the custom machine image id.
pub const CUSTOM_IMAGE_ENV: &str = "AWS_AMI";

/// Environment variable holding the requirements file path.
pub const REQUIREMENTS_ENV: &str = "DS_EC2_REQUIREMENTS";

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["ds-ec2.yaml", "ds-ec2.yml"];

/// Explicit values that take precedence over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceOverrides {
    /// Region override.
    pub region: Option<String>,
    /// Instance type override.
    pub instance_type: Option<String>,
    /// Custom image id override.
    pub custom_image_id: Option<String>,
    /// Requirements path override.
    pub requirements: Option<PathBuf>,
}

/// Configuration parser for loading planner configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Directory searched for the `.env` file.
    base_path: Option<PathBuf>,
    /// Package list loader.
    loader: PackageListLoader,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_path: None,
            loader: PackageListLoader::new(),
        }
    }

    /// Sets the directory searched for the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DsConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(DsEc2Error::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            DsEc2Error::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let mut config = self.parse_yaml(&content, Some(path))?;

        // Relative paths in the file are relative to the file itself.
        if config.instance.requirements.is_relative() {
            if let Some(dir) = path.parent() {
                config.instance.requirements = dir.join(&config.instance.requirements);
            }
        }

        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DsConfig> {
        debug!("Parsing YAML configuration");

        // An empty document means "all defaults".
        if content.trim().is_empty() {
            return Ok(DsConfig::default());
        }

        let config: DsConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            DsEc2Error::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed configuration for stack: {}", config.stack.stack_name);
        Ok(config)
    }

    /// Loads the configuration file if one is given, defaults otherwise, and
    /// applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: Option<&Path>) -> Result<DsConfig> {
        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No configuration file, using defaults");
                DsConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        Ok(config)
    }

    /// Applies environment variable overrides using the given lookup.
    pub fn apply_env_overrides<F>(config: &mut DsConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let instance = &mut config.instance;

        if let Some(region) = lookup(REGION_ENV) {
            debug!("Overriding instance.region from {REGION_ENV}");
            instance.region = Some(region);
        }

        if let Some(instance_type) = lookup(INSTANCE_TYPE_ENV) {
            debug!("Overriding instance.instance_type from {INSTANCE_TYPE_ENV}");
            instance.instance_type = instance_type;
        }

        if let Some(image_id) = lookup(CUSTOM_IMAGE_ENV) {
            debug!("Overriding instance.custom_image_id from {CUSTOM_IMAGE_ENV}");
            instance.custom_image_id = Some(image_id);
        }

        if let Some(requirements) = lookup(REQUIREMENTS_ENV) {
            debug!("Overriding instance.requirements from {REQUIREMENTS_ENV}");
            instance.requirements = PathBuf::from(requirements);
        }
    }

    /// Applies explicit overrides on top of the configuration.
    pub fn apply_overrides(config: &mut DsConfig, overrides: &InstanceOverrides) {
        let instance = &mut config.instance;

        if let Some(region) = &overrides.region {
            instance.region = Some(region.clone());
        }
        if let Some(instance_type) = &overrides.instance_type {
            instance.instance_type.clone_from(instance_type);
        }
        if let Some(image_id) = &overrides.custom_image_id {
            instance.custom_image_id = Some(image_id.clone());
        }
        if let Some(requirements) = &overrides.requirements {
            instance.requirements.clone_from(requirements);
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                DsEc2Error::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Builds the immutable planning request: resolves the region and reads
    /// the requirements file. An empty image id counts as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is not set or the requirements file
    /// cannot be read.
    pub fn build_request(&self, instance: &InstanceConfig) -> Result<ProvisioningRequest> {
        let region = instance
            .region
            .clone()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                DsEc2Error::Config(ConfigError::MissingEnvVar {
                    name: String::from(REGION_ENV),
                })
            })?;

        let packages = self.loader.load(&instance.requirements)?;
        let custom_image_id = instance
            .custom_image_id
            .clone()
            .filter(|id| !id.is_empty());

        Ok(ProvisioningRequest::new(
            region,
            instance.instance_type.clone(),
            custom_image_id,
            packages,
        ))
    }
}

/// Looks for a configuration file in the given directory and its parents.
///
/// Unlike a missing requirements file, a missing configuration file is not an
/// error: every setting has a default.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
instance:
  region: us-east-1
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).unwrap();

        assert_eq!(config.instance.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.instance.instance_type, "c4.2xlarge");
        assert_eq!(config.stack.stack_name, "ds-ec2");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
stack:
  stack_name: research-box
  vpc_cidr: 10.1.0.0/20
  role_name: research-role
  managed_policies:
    - AmazonSSMManagedInstanceCore
    - AmazonS3ReadOnlyAccess
  security_group_name: research-sg
  allow_all_outbound: false
  root_device_name: /dev/sda1
instance:
  region: eu-west-1
  instance_type: g5.xlarge
  custom_image_id: ami-0abc
  requirements: reqs.txt
";
        let parser = ConfigParser::new();
        let config = parser.parse_yaml(yaml, None).unwrap();

        assert_eq!(config.stack.stack_name, "research-box");
        assert_eq!(config.stack.managed_policies.len(), 2);
        assert!(!config.stack.allow_all_outbound);
        assert_eq!(config.instance.instance_type, "g5.xlarge");
        assert_eq!(config.instance.custom_image_id.as_deref(), Some("ami-0abc"));
        assert_eq!(config.instance.requirements, PathBuf::from("reqs.txt"));
    }

    #[test]
    fn test_parse_empty_document() {
        let config = ConfigParser::new().parse_yaml("  \n", None).unwrap();
        assert_eq!(config, DsConfig::default());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ConfigParser::new().parse_yaml("stack: [unclosed", None);
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (REGION_ENV, "us-west-2"),
            (INSTANCE_TYPE_ENV, "p3.2xlarge"),
            (CUSTOM_IMAGE_ENV, "ami-123"),
        ]);

        let mut config = DsConfig::default();
        ConfigParser::apply_env_overrides(&mut config, |name| {
            env.get(name).map(|v| (*v).to_string())
        });

        assert_eq!(config.instance.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.instance.instance_type, "p3.2xlarge");
        assert_eq!(config.instance.custom_image_id.as_deref(), Some("ami-123"));
        assert_eq!(
            config.instance.requirements,
            PathBuf::from(crate::config::DEFAULT_REQUIREMENTS_PATH)
        );
    }

    #[test]
    fn test_instance_type_defaults_when_env_absent() {
        let mut config = DsConfig::default();
        ConfigParser::apply_env_overrides(&mut config, |_| None);
        assert_eq!(config.instance.instance_type, "c4.2xlarge");
    }

    #[test]
    fn test_cli_overrides_win_over_env() {
        let mut config = DsConfig::default();
        ConfigParser::apply_env_overrides(&mut config, |name| {
            (name == INSTANCE_TYPE_ENV).then(|| String::from("g4dn.xlarge"))
        });
        let overrides = InstanceOverrides {
            instance_type: Some(String::from("m5.large")),
            ..InstanceOverrides::default()
        };
        ConfigParser::apply_overrides(&mut config, &overrides);

        assert_eq!(config.instance.instance_type, "m5.large");
    }

    #[test]
    fn test_build_request_reads_requirements() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("requirements.txt"), "pandas\nnumpy\n")
            .expect("write failed");

        let instance = InstanceConfig {
            region: Some(String::from("us-east-1")),
            requirements: dir.path().join("requirements.txt"),
            ..InstanceConfig::default()
        };

        let request = ConfigParser::new().build_request(&instance).unwrap();
        assert_eq!(request.region, "us-east-1");
        assert_eq!(request.instance_type, "c4.2xlarge");
        assert_eq!(request.required_packages, vec!["pandas", "numpy"]);
    }

    #[test]
    fn test_build_request_treats_empty_image_as_unset() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("requirements.txt"), "torch\n").expect("write failed");

        let mut config = DsConfig::default();
        config.instance.requirements = dir.path().join("requirements.txt");
        ConfigParser::apply_env_overrides(&mut config, |name| match name {
            REGION_ENV => Some(String::from("us-east-1")),
            INSTANCE_TYPE_ENV => Some(String::from("p3.2xlarge")),
            CUSTOM_IMAGE_ENV => Some(String::new()),
            _ => None,
        });

        let request = ConfigParser::new().build_request(&config.instance).unwrap();
        assert!(request.custom_image_id.is_none());
    }

    #[test]
    fn test_file_requirements_relative_to_config_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = dir.path().join("ds-ec2.yaml");
        std::fs::write(&config_path, "instance:\n  requirements: reqs.txt\n")
            .expect("write failed");

        let config = ConfigParser::new().load_file(&config_path).unwrap();
        assert_eq!(config.instance.requirements, dir.path().join("reqs.txt"));
    }

    #[test]
    fn test_override_requirements_stay_relative_to_working_dir() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = dir.path().join("ds-ec2.yaml");
        std::fs::write(&config_path, "instance:\n  requirements: reqs.txt\n")
            .expect("write failed");

        let mut config = ConfigParser::new().load_file(&config_path).unwrap();
        ConfigParser::apply_env_overrides(&mut config, |name| {
            (name == REQUIREMENTS_ENV).then(|| String::from("env/reqs.txt"))
        });
        assert_eq!(config.instance.requirements, PathBuf::from("env/reqs.txt"));

        let overrides = InstanceOverrides {
            requirements: Some(PathBuf::from("cli/reqs.txt")),
            ..InstanceOverrides::default()
        };
        ConfigParser::apply_overrides(&mut config, &overrides);
        assert_eq!(config.instance.requirements, PathBuf::from("cli/reqs.txt"));
    }

    #[test]
    fn test_file_then_env_then_flags() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = dir.path().join("ds-ec2.yaml");
        std::fs::write(
            &config_path,
            "instance:\n  region: eu-west-1\n  instance_type: m5.large\n  custom_image_id: ami-file\n",
        )
        .expect("write failed");

        let mut config = ConfigParser::new().load_file(&config_path).unwrap();
        assert_eq!(config.instance.region.as_deref(), Some("eu-west-1"));

        ConfigParser::apply_env_overrides(&mut config, |name| match name {
            INSTANCE_TYPE_ENV => Some(String::from("g5.xlarge")),
            CUSTOM_IMAGE_ENV => Some(String::from("ami-env")),
            _ => None,
        });
        assert_eq!(config.instance.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.instance.instance_type, "g5.xlarge");
        assert_eq!(config.instance.custom_image_id.as_deref(), Some("ami-env"));

        let overrides = InstanceOverrides {
            region: Some(String::from("us-west-2")),
            custom_image_id: Some(String::from("ami-cli")),
            ..InstanceOverrides::default()
        };
        ConfigParser::apply_overrides(&mut config, &overrides);
        assert_eq!(config.instance.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.instance.instance_type, "g5.xlarge");
        assert_eq!(config.instance.custom_image_id.as_deref(), Some("ami-cli"));
    }

    #[test]
    fn test_load_dotenv_from_base_path() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join(".env"), "DS_EC2_DOTENV_TEST_MARKER=loaded\n")
            .expect("write failed");

        ConfigParser::new()
            .with_base_path(dir.path())
            .load_dotenv()
            .expect("Failed to load .env");

        assert_eq!(
            std::env::var("DS_EC2_DOTENV_TEST_MARKER").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = ConfigParser::new().with_base_path(dir.path()).load_dotenv();
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_request_requires_region() {
        let parser = ConfigParser::new();
        let result = parser.build_request(&InstanceConfig::default());
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::MissingEnvVar { ref name })) if name == REGION_ENV
        ));
    }

    #[test]
    fn test_find_config_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir failed");
        std::fs::write(dir.path().join("ds-ec2.yaml"), "").expect("write failed");

        let found = find_config_file(&nested);
        assert_eq!(found, Some(dir.path().join("ds-ec2.yaml")));
    }
}
