//! Configuration file management for studyplan.
//!
//! Provides a TOML-based config file at `~/.config/studyplan/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studyplan_core::runner::{InProcessRunner, PlanRunner, RunnerKind, SubprocessRunner};
use studyplan_db::config::DbConfig;

/// Environment variable selecting the runner kind.
pub const RUNNER_ENV_VAR: &str = "STUDYPLAN_RUNNER";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub planner: PlannerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// How plan generation is executed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerSection {
    #[serde(default)]
    pub runner: RunnerKind,
    /// Generator executable for the subprocess runner. Defaults to this
    /// binary, invoked as `studyplan generate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
    /// Arguments placed before `--date`. Defaults to `["generate"]` when
    /// `program` is unset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            runner: RunnerKind::default(),
            program: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5500
}

fn default_timeout_secs() -> u64 {
    30
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyplan config directory: `$XDG_CONFIG_HOME/studyplan` or
/// `~/.config/studyplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyplan")
}

/// Return the path to the studyplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the URL may carry a password.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StudyplanConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
    pub planner: PlannerSection,
}

impl StudyplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `STUDYPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Runner: `cli_runner` > `STUDYPLAN_RUNNER` > `planner.runner` > in-process
    pub fn resolve(cli_db_url: Option<&str>, cli_runner: Option<RunnerKind>) -> Result<Self> {
        Self::resolve_from(load_config().ok(), cli_db_url, cli_runner)
    }

    fn resolve_from(
        file_config: Option<ConfigFile>,
        cli_db_url: Option<&str>,
        cli_runner: Option<RunnerKind>,
    ) -> Result<Self> {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let (server, mut planner) = match file_config {
            Some(cfg) => (cfg.server, cfg.planner),
            None => (ServerSection::default(), PlannerSection::default()),
        };

        if let Some(kind) = cli_runner {
            planner.runner = kind;
        } else if let Ok(kind) = std::env::var(RUNNER_ENV_VAR) {
            planner.runner = kind
                .parse()
                .with_context(|| format!("{RUNNER_ENV_VAR} env var is invalid"))?;
        }

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server,
            planner,
        })
    }
}

impl PlannerSection {
    /// Build the configured runner.
    pub fn build_runner(&self) -> Result<Arc<dyn PlanRunner>> {
        match self.runner {
            RunnerKind::InProcess => Ok(Arc::new(InProcessRunner::new())),
            RunnerKind::Subprocess => {
                let (program, args) = match &self.program {
                    Some(program) => (program.clone(), self.args.clone()),
                    None => (
                        std::env::current_exe()
                            .context("failed to locate the studyplan executable")?,
                        vec!["generate".to_string()],
                    ),
                };
                Ok(Arc::new(
                    SubprocessRunner::new(program)
                        .with_args(args)
                        .with_timeout(Duration::from_secs(self.timeout_secs)),
                ))
            }
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn file(url: &str) -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: url.to_string(),
            },
            server: ServerSection::default(),
            planner: PlannerSection::default(),
        }
    }

    #[test]
    fn minimal_file_gets_section_defaults() {
        let cfg: ConfigFile = toml::from_str(
            r#"
[database]
url = "postgresql://db:5432/plans"
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.server.port, 5500);
        assert_eq!(cfg.planner.runner, RunnerKind::InProcess);
        assert_eq!(cfg.planner.timeout_secs, 30);
    }

    #[test]
    fn full_file_parses() {
        let cfg: ConfigFile = toml::from_str(
            r#"
[database]
url = "postgresql://db:5432/plans"

[server]
bind = "127.0.0.1"
port = 8080

[planner]
runner = "subprocess"
program = "/opt/planner/bin/generate"
args = ["--quiet"]
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.planner.runner, RunnerKind::Subprocess);
        assert_eq!(
            cfg.planner.program.as_deref(),
            Some(std::path::Path::new("/opt/planner/bin/generate"))
        );
        assert_eq!(cfg.planner.args, ["--quiet"]);
    }

    #[test]
    fn save_format_roundtrips() {
        let original = file("postgresql://testhost:5432/testdb");
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, toml::to_string_pretty(&original).unwrap()).unwrap();

        let loaded: ConfigFile =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.server, original.server);
        assert_eq!(loaded.planner, original.planner);
    }

    #[test]
    fn cli_flag_overrides_all() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };

        let config = StudyplanConfig::resolve_from(
            Some(file("postgresql://file:5432/filedb")),
            Some("postgresql://cli:5432/clidb"),
            None,
        )
        .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
    }

    #[test]
    fn env_var_overrides_config_file() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };

        let config =
            StudyplanConfig::resolve_from(Some(file("postgresql://file:5432/filedb")), None, None)
                .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");

        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
    }

    #[test]
    fn config_file_used_when_no_flag_or_env() {
        let _lock = lock_env();
        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };

        let config =
            StudyplanConfig::resolve_from(Some(file("postgresql://file:5432/filedb")), None, None)
                .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn defaults_when_nothing_set() {
        let _lock = lock_env();
        unsafe { std::env::remove_var(DbConfig::ENV_VAR) };
        unsafe { std::env::remove_var(RUNNER_ENV_VAR) };

        let config = StudyplanConfig::resolve_from(None, None, None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.server, ServerSection::default());
        assert_eq!(config.planner.runner, RunnerKind::InProcess);
    }

    #[test]
    fn runner_resolution_chain() {
        let _lock = lock_env();
        unsafe { std::env::set_var(RUNNER_ENV_VAR, "subprocess") };

        let from_env = StudyplanConfig::resolve_from(None, None, None).unwrap();
        assert_eq!(from_env.planner.runner, RunnerKind::Subprocess);

        let from_cli =
            StudyplanConfig::resolve_from(None, None, Some(RunnerKind::InProcess)).unwrap();
        assert_eq!(from_cli.planner.runner, RunnerKind::InProcess);

        unsafe { std::env::set_var(RUNNER_ENV_VAR, "carrier-pigeon") };
        let err = StudyplanConfig::resolve_from(None, None, None).unwrap_err();
        assert!(format!("{err:#}").contains(RUNNER_ENV_VAR));

        unsafe { std::env::remove_var(RUNNER_ENV_VAR) };
    }

    #[test]
    fn build_runner_picks_implementation() {
        let in_process = PlannerSection::default().build_runner().unwrap();
        assert_eq!(in_process.name(), "in_process");

        let subprocess = PlannerSection {
            runner: RunnerKind::Subprocess,
            program: Some(PathBuf::from("/bin/true")),
            ..PlannerSection::default()
        }
        .build_runner()
        .unwrap();
        assert_eq!(subprocess.name(), "subprocess");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("studyplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
