//! Runtime settings: `config.toml` merged with environment variables.
//!
//! Pipeline switches and the SQL address come from the environment, where a
//! `.env` file beside `config.toml` overrides the process environment. The result is an immutable [`Settings`] value built once at startup and
//! passed by reference into each pipeline.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "config.toml";
pub const DOTENV_FILE: &str = ".env";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOOKUP: &str = "docs/nwfs_lookup.csv";
const DEFAULT_OUTPUT: &str = "output";
const DEFAULT_QUERY: &str = "docs/pwr_extract.sql";

#[derive(Debug, Deserialize)]
struct ConfigFile {
    scope: ScopeSection,
    nhs_workforce_statistics: NwfsSection,
    pwr_trends: PwrSection,
    #[serde(default)]
    paths: PathsSection,
}

#[derive(Debug, Deserialize)]
struct ScopeSection {
    org_codes: Vec<String>,
    org_shorts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NwfsSection {
    rel_path: String,
    colname_ahp: String,
    colname_role: String,
    colname_band: String,
    #[serde(default)]
    snapshot: bool,
}

#[derive(Debug, Deserialize)]
struct PwrSection {
    database: String,
    query_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PathsSection {
    data_dir: Option<String>,
    lookup: Option<String>,
    output: Option<String>,
}

/// Organisations retained by the report, code and shorthand kept in step.
#[derive(Debug, Clone, PartialEq)]
pub struct OrgScope {
    codes: Vec<String>,
    shorts: Vec<String>,
}

impl OrgScope {
    pub fn new(codes: Vec<String>, shorts: Vec<String>) -> Result<Self, ConfigError> {
        if codes.len() != shorts.len() {
            return Err(ConfigError::Validation {
                field: "scope.org_shorts".to_string(),
                message: format!(
                    "expected {} shorthands to match org_codes, found {}",
                    codes.len(),
                    shorts.len()
                ),
            });
        }
        let mut seen = HashSet::new();
        for code in &codes {
            if !seen.insert(code.as_str()) {
                return Err(ConfigError::Validation {
                    field: "scope.org_codes".to_string(),
                    message: format!("duplicate organisation code '{}'", code),
                });
            }
        }
        Ok(Self { codes, shorts })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn shorthand(&self, code: &str) -> Option<&str> {
        self.codes
            .iter()
            .position(|c| c == code)
            .map(|i| self.shorts[i].as_str())
    }

    pub fn shorthands(&self) -> &[String] {
        &self.shorts
    }
}

/// Source column names for the NWFS extracts; these vary by extract vintage.
#[derive(Debug, Clone, PartialEq)]
pub struct NwfsColumns {
    pub staff_group: String,
    pub role: String,
    pub band: String,
}

#[derive(Debug, Clone)]
pub struct NwfsSettings {
    pub extract_dir: PathBuf,
    pub columns: NwfsColumns,
    pub snapshot: bool,
}

#[derive(Debug, Clone)]
pub struct PwrSettings {
    pub sql_address: Option<String>,
    pub database: String,
    pub query_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub pipeline_nwfs: bool,
    pub pipeline_pwr: bool,
    pub scope: OrgScope,
    pub nwfs: NwfsSettings,
    pub pwr: PwrSettings,
    pub lookup_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Load `config.toml` from `root` and overlay the environment, with
    /// `<root>/.env` taking precedence over the process environment.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file = parse_file(&content, &path.display().to_string())?;

        let dotenv_path = root.join(DOTENV_FILE);
        let dotenv = match std::fs::File::open(&dotenv_path) {
            Ok(f) => parse_dotenv(f, &dotenv_path.display().to_string())?,
            Err(_) => HashMap::new(),
        };
        let process = |name: &str| std::env::var(name).ok();
        let resolved = Self::resolve(file, root, &overlay(&dotenv, &process));
        resolved
    }

    /// Build settings from TOML text with an injected environment lookup.
    pub fn from_toml_str(
        content: &str,
        root: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = parse_file(content, "<string>")?;
        Self::resolve(file, root, env)
    }

    /// As [`Settings::from_toml_str`], with `dotenv` text layered over `env`.
    pub fn from_toml_str_with_dotenv(
        content: &str,
        dotenv: &str,
        root: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let vars = parse_dotenv(dotenv.as_bytes(), "<string>")?;
        let resolved = Self::from_toml_str(content, root, &overlay(&vars, env));
        resolved
    }

    fn resolve(
        file: ConfigFile,
        root: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let pipeline_nwfs = env_flag(env("PIPELINE_NWFS").as_deref());
        let pipeline_pwr = env_flag(env("PIPELINE_PWR").as_deref());
        let sql_address = env("SQL_ADDRESS").filter(|s| !s.trim().is_empty());
        if pipeline_pwr && sql_address.is_none() {
            return Err(ConfigError::MissingEnv("SQL_ADDRESS"));
        }

        let scope = OrgScope::new(file.scope.org_codes, file.scope.org_shorts)?;

        let data_dir = root.join(file.paths.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR));
        let nwfs = NwfsSettings {
            extract_dir: data_dir.join(&file.nhs_workforce_statistics.rel_path),
            columns: NwfsColumns {
                staff_group: file.nhs_workforce_statistics.colname_ahp,
                role: file.nhs_workforce_statistics.colname_role,
                band: file.nhs_workforce_statistics.colname_band,
            },
            snapshot: file.nhs_workforce_statistics.snapshot,
        };
        let pwr = PwrSettings {
            sql_address,
            database: file.pwr_trends.database,
            query_path: root.join(
                file.pwr_trends
                    .query_path
                    .as_deref()
                    .unwrap_or(DEFAULT_QUERY),
            ),
        };

        Ok(Self {
            pipeline_nwfs,
            pipeline_pwr,
            scope,
            nwfs,
            pwr,
            lookup_path: root.join(file.paths.lookup.as_deref().unwrap_or(DEFAULT_LOOKUP)),
            output_dir: root.join(file.paths.output.as_deref().unwrap_or(DEFAULT_OUTPUT)),
        })
    }
}

fn parse_file(content: &str, path: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// `KEY=VALUE` pairs from a dotenv source. Later keys replace earlier ones.
fn parse_dotenv<R: Read>(reader: R, path: &str) -> Result<HashMap<String, String>, ConfigError> {
    dotenvy::from_read_iter(reader)
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
}

fn overlay<'a>(
    dotenv: &'a HashMap<String, String>,
    env: &'a dyn Fn(&str) -> Option<String>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |name| dotenv.get(name).cloned().or_else(|| env(name))
}

fn env_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("True" | "true" | "1"))
}
