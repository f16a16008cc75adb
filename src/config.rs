use crate::services::github::DEFAULT_API_URL;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref GITHUB_URL_REGEX: Regex = Regex::new(r"github\.com/([^/]+)/([^/\s]+)").unwrap();
    static ref FULL_NAME_REGEX: Regex =
        Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").unwrap();
}

pub const DEFAULT_NUM_DAYS: u32 = 14;
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("OWNER '{owner}' conflicts with the owner of REPOSITORY '{repository}'")]
    ConflictingOwner { owner: String, repository: String },
}

/// An access token and the REST API it belongs to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub api_url: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &redact_secret(&self.token))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryName {
    type Err = ConfigError;

    /// Accepts `owner/name` or any URL containing `github.com/owner/name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let caps = FULL_NAME_REGEX
            .captures(s)
            .or_else(|| GITHUB_URL_REGEX.captures(s))
            .ok_or_else(|| ConfigError::Invalid {
                key: "REPOSITORY",
                value: s.to_string(),
                reason: "expected owner/name",
            })?;

        Ok(Self {
            owner: caps[1].to_string(),
            name: caps[2].trim_end_matches(".git").to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexConfig {
    pub model: String,
    pub project: String,
    pub access_token: String,
    pub location: String,
    /// Base URL of the Vertex AI API, regional by default.
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The first credential also publishes the report.
    pub credentials: Vec<Credential>,
    pub num_days: u32,
    pub repository: RepositoryName,
    pub project_number: Option<u64>,
    pub include_comments: bool,
    pub vertex: Option<VertexConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get("GITHUB_TOKEN").ok_or(ConfigError::Missing("GITHUB_TOKEN"))?;
        let api_url = get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut credentials = vec![Credential { token, api_url }];
        if let Some(other_tokens) = get("OTHER_TOKENS") {
            for entry in other_tokens.split(',') {
                credentials.push(parse_credential(entry)?);
            }
        }

        let num_days = match get("NUM_DAYS") {
            Some(value) => match value.parse::<u32>() {
                Ok(days) if days > 0 => days,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "NUM_DAYS",
                        value,
                        reason: "expected a positive number of days",
                    });
                }
            },
            None => DEFAULT_NUM_DAYS,
        };

        let repository = parse_repository(get("REPOSITORY"), get("OWNER"))?;

        let project_number = match get("PROJECT_NUMBER") {
            Some(value) => Some(value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "PROJECT_NUMBER",
                value: value.clone(),
                reason: "expected a project number",
            })?),
            None => None,
        };

        let include_comments = match get("INCLUDE_COMMENTS") {
            Some(value) => parse_bool("INCLUDE_COMMENTS", &value)?,
            None => false,
        };

        let vertex = match (
            get("VERTEX_MODEL"),
            get("VERTEX_PROJECT"),
            get("VERTEX_ACCESS_TOKEN"),
        ) {
            (Some(model), Some(project), Some(access_token)) => {
                let location = get("VERTEX_LOCATION")
                    .unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_string());
                let api_url = get("VERTEX_API_URL").unwrap_or_else(|| {
                    format!("https://{}-aiplatform.googleapis.com/v1", location)
                });
                Some(VertexConfig {
                    model,
                    project,
                    access_token,
                    location,
                    api_url,
                })
            }
            _ => None,
        };

        Ok(Self {
            credentials,
            num_days,
            repository,
            project_number,
            include_comments,
            vertex,
        })
    }
}

/// `token` or `token|api_url`.
fn parse_credential(entry: &str) -> Result<Credential, ConfigError> {
    let (token, api_url) = match entry.split_once('|') {
        Some((token, api_url)) => (token.trim(), api_url.trim()),
        None => (entry.trim(), DEFAULT_API_URL),
    };
    if token.is_empty() || api_url.is_empty() {
        return Err(ConfigError::Invalid {
            key: "OTHER_TOKENS",
            value: redact_secret(entry.trim()),
            reason: "expected token or token|api_url",
        });
    }
    Ok(Credential {
        token: token.to_string(),
        api_url: api_url.to_string(),
    })
}

fn parse_repository(
    repository: Option<String>,
    owner: Option<String>,
) -> Result<RepositoryName, ConfigError> {
    let repository = repository.ok_or(ConfigError::Missing("REPOSITORY"))?;

    if !repository.contains('/') {
        let owner = owner.ok_or(ConfigError::Invalid {
            key: "REPOSITORY",
            value: repository.clone(),
            reason: "expected owner/name, or set OWNER",
        })?;
        return format!("{}/{}", owner, repository).parse();
    }

    let parsed: RepositoryName = repository.parse()?;
    match owner {
        Some(owner) if !owner.eq_ignore_ascii_case(&parsed.owner) => {
            Err(ConfigError::ConflictingOwner { owner, repository })
        }
        _ => Ok(parsed),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}

fn redact_secret(secret: &str) -> String {
    let len = secret.len();
    if len <= 8 || !secret.is_ascii() {
        return "*".repeat(secret.chars().count());
    }

    let visible_chars = 4;
    let prefix = &secret[..visible_chars];
    let suffix = &secret[len - visible_chars..];
    format!("{}...{}", prefix, suffix)
}
