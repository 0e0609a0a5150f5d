use crate::core::types::AsyncOptions;
use ini::Ini;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix consulted before any profile file.
pub const ENV_PREFIX: &str = "CLOUDSTACK";
/// Profile used when neither the caller nor the `[core]` section names one.
pub const DEFAULT_PROFILE: &str = "local";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// API key pair used to sign every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl Credentials {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key().is_empty() && !self.secret_key().is_empty()
    }
}

/// Fully resolved settings for one API endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub endpoint: String,
    pub project_id: Option<String>,
    pub http_timeout: Duration,
    pub verify_tls: bool,
    pub async_options: AsyncOptions,
}

// Never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 5)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("endpoint", &self.endpoint)?;
        state.serialize_field("project_id", &self.project_id)?;
        state.serialize_field("http_timeout_secs", &self.http_timeout.as_secs())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            api_key: String,
            secret_key: String,
            endpoint: String,
            #[serde(default)]
            project_id: Option<String>,
            #[serde(default)]
            http_timeout_secs: Option<u64>,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        let mut config = Self::new(helper.api_key, helper.secret_key, helper.endpoint);
        config.project_id = helper.project_id.filter(|id| !id.is_empty());
        if let Some(secs) = helper.http_timeout_secs {
            config.http_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_key: String, secret_key: String, endpoint: String) -> Self {
        Self {
            credentials: Credentials::new(api_key, secret_key),
            endpoint,
            project_id: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            verify_tls: true,
            async_options: AsyncOptions::default(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_API_KEY`
    /// - `{PREFIX}_SECRET_KEY`
    /// - `{PREFIX}_URL`
    /// - `{PREFIX}_PROJECT_ID` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let read = |suffix: &str| {
            let var = format!("{}_{}", prefix, suffix);
            env::var(&var).map_err(|_| ConfigError::MissingEnvironmentVariable(var))
        };

        let mut config = Self::new(read("API_KEY")?, read("SECRET_KEY")?, read("URL")?);
        config.project_id = read("PROJECT_ID").ok().filter(|id| !id.is_empty());
        Ok(config)
    }

    /// Load a `.env` file (if present) and then read the environment.
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // fall through to system environment variables
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Read one profile section from a cloudmonkey-style INI file.
    ///
    /// `profile` falls back to the `[core]` section's `profile` key and then
    /// to [`DEFAULT_PROFILE`].
    pub fn from_profile_file(path: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                ConfigError::FileNotFound(path.to_path_buf())
            }
            other => ConfigError::InvalidConfiguration(format!(
                "Failed to read '{}': {}",
                path.display(),
                other
            )),
        })?;
        Self::from_ini(&ini, profile)
    }

    /// Same as [`ClientConfig::from_profile_file`] but from in-memory text.
    pub fn from_profile_str(contents: &str, profile: Option<&str>) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents)
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))?;
        Self::from_ini(&ini, profile)
    }

    fn from_ini(ini: &Ini, profile: Option<&str>) -> Result<Self, ConfigError> {
        let profile = profile
            .map(str::to_string)
            .or_else(|| {
                ini.section(Some("core"))
                    .and_then(|core| core.get("profile"))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let section = ini
            .section(Some(profile.as_str()))
            .ok_or_else(|| ConfigError::UnknownProfile(profile.clone()))?;

        let required = |key: &str| {
            section
                .get(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingKey {
                    profile: profile.clone(),
                    key: key.to_string(),
                })
        };
        let seconds = |key: &str| -> Result<Option<Duration>, ConfigError> {
            section
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| {
                    value
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                        })
                })
                .transpose()
        };

        let mut config = Self::new(required("apikey")?, required("secretkey")?, required("url")?);
        config.project_id = section
            .get("projectid")
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        // `timeout` bounds the async job wait; `expires` only applies to
        // signature version 3, which is never sent.
        if let Some(expiry) = seconds("timeout")? {
            config.async_options.expiry = expiry;
        }
        if let Some(interval) = seconds("pollinterval")? {
            if interval.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: "pollinterval".to_string(),
                    value: "0".to_string(),
                });
            }
            config.async_options.poll_interval = interval;
        }
        // profile value wins over [core]
        let asyncblock = section
            .get("asyncblock")
            .or_else(|| ini.section(Some("core")).and_then(|core| core.get("asyncblock")));
        if let Some(block) = asyncblock {
            config.async_options.block = parse_flag("asyncblock", block)?;
        }
        if let Some(verify) = section.get("verifysslcert") {
            config.verify_tls = parse_flag("verifysslcert", verify)?;
        }

        Ok(config)
    }

    /// Resolve configuration the way the CLI does: a complete set of
    /// `CLOUDSTACK_*` variables wins, otherwise the profile file is read.
    pub fn discover(path: Option<&Path>, profile: Option<&str>) -> Result<Self, ConfigError> {
        Self::discover_with_prefix(ENV_PREFIX, path, profile)
    }

    fn discover_with_prefix(
        prefix: &str,
        path: Option<&Path>,
        profile: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Ok(config) = Self::from_env(prefix) {
            return Ok(config);
        }

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path().ok_or_else(|| {
                ConfigError::InvalidConfiguration("Cannot determine home directory".to_string())
            })?,
        };
        Self::from_profile_file(&path, profile)
    }

    #[must_use]
    pub fn project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id.filter(|id| !id.is_empty());
        self
    }

    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    #[must_use]
    pub fn verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    #[must_use]
    pub fn async_options(mut self, options: AsyncOptions) -> Self {
        self.async_options = options;
        self
    }

    /// Check if this configuration has credentials for signing
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_complete()
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// `~/.cloudmonkey/config`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cloudmonkey").join("config"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("File {} was not found", .0.display())]
    FileNotFound(PathBuf),

    #[error("No section for profile/region '{0}'")]
    UnknownProfile(String),

    #[error("Profile '{profile}' is missing '{key}'")]
    MissingKey { profile: String, key: String },

    #[error("Invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
[core]
profile = prod
asyncblock = false

[prod]
url = https://cloud.example.com/client/api
apikey = prod-key
secretkey = prod-secret
projectid = 1234
timeout = 3600
expires = 600
pollinterval = 5
verifysslcert = false

[lab]
url = http://lab:8080/client/api
apikey = lab-key
secretkey = lab-secret
";

    #[test]
    fn test_core_profile_is_default() {
        let config = ClientConfig::from_profile_str(SAMPLE, None).unwrap();
        assert_eq!(config.endpoint, "https://cloud.example.com/client/api");
        assert_eq!(config.credentials.api_key(), "prod-key");
        assert_eq!(config.credentials.secret_key(), "prod-secret");
        assert_eq!(config.project_id.as_deref(), Some("1234"));
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.async_options.expiry, Duration::from_secs(3600));
        assert_eq!(config.async_options.poll_interval, Duration::from_secs(5));
        assert!(!config.async_options.block);
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_explicit_profile_uses_defaults() {
        let config = ClientConfig::from_profile_str(SAMPLE, Some("lab")).unwrap();
        assert_eq!(config.credentials.api_key(), "lab-key");
        assert!(config.project_id.is_none());
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(
            config.async_options,
            AsyncOptions::default().block(false),
            "asyncblock from [core] applies to every profile"
        );
    }

    #[test]
    fn test_profile_asyncblock_overrides_core() {
        let text = "[core]\nasyncblock = false\n\n[local]\nurl = http://x\napikey = k\nsecretkey = s\nasyncblock = true\n";
        let config = ClientConfig::from_profile_str(text, None).unwrap();
        assert!(config.async_options.block);
    }

    #[test]
    fn test_expires_does_not_change_job_wait() {
        let text = "[local]\nurl = http://x\napikey = k\nsecretkey = s\nexpires = 600\n";
        let config = ClientConfig::from_profile_str(text, None).unwrap();
        assert_eq!(config.async_options.expiry, AsyncOptions::default().expiry);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let text = "[local]\nurl = http://x\napikey = k\nsecretkey = s\npollinterval = 0\n";
        let err = ClientConfig::from_profile_str(text, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "pollinterval"));
    }

    #[test]
    fn test_unknown_profile() {
        let err = ClientConfig::from_profile_str(SAMPLE, Some("nowhere")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(name) if name == "nowhere"));
    }

    #[test]
    fn test_missing_secret() {
        let err = ClientConfig::from_profile_str("[local]\nurl = http://x\napikey = k\n", None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key, .. } if key == "secretkey"));
    }

    #[test]
    fn test_invalid_timeout() {
        let text = "[local]\nurl = http://x\napikey = k\nsecretkey = s\ntimeout = soon\n";
        let err = ClientConfig::from_profile_str(text, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "timeout"));
    }

    #[test]
    fn test_profile_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ClientConfig::from_profile_file(file.path(), Some("lab")).unwrap();
        assert_eq!(config.endpoint, "http://lab:8080/client/api");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let err = ClientConfig::from_profile_file(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_serialization_redacts_secrets() {
        let config = ClientConfig::new(
            "visible-key".to_string(),
            "visible-secret".to_string(),
            "http://x".to_string(),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("visible-key"));
        assert!(!json.contains("visible-secret"));
        assert!(json.contains("[REDACTED]"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("visible-secret"));
    }

    fn set_env(prefix: &str, api_key: &str, secret_key: &str, url: &str) {
        env::set_var(format!("{prefix}_API_KEY"), api_key);
        env::set_var(format!("{prefix}_SECRET_KEY"), secret_key);
        env::set_var(format!("{prefix}_URL"), url);
    }

    #[test]
    fn test_from_env() {
        let prefix = "STACKCTL_TEST_FROM_ENV";
        set_env(prefix, "env-key", "env-secret", "http://env/client/api");
        env::set_var(format!("{prefix}_PROJECT_ID"), "p-env");

        let config = ClientConfig::from_env(prefix).unwrap();
        assert_eq!(config.credentials.api_key(), "env-key");
        assert_eq!(config.credentials.secret_key(), "env-secret");
        assert_eq!(config.endpoint, "http://env/client/api");
        assert_eq!(config.project_id.as_deref(), Some("p-env"));
    }

    #[test]
    fn test_from_env_missing_variable() {
        let prefix = "STACKCTL_TEST_PARTIAL_ENV";
        env::set_var(format!("{prefix}_API_KEY"), "k");
        env::remove_var(format!("{prefix}_SECRET_KEY"));

        let err = ClientConfig::from_env(prefix).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvironmentVariable(ref var) if var == "STACKCTL_TEST_PARTIAL_ENV_SECRET_KEY")
        );
    }

    #[cfg(feature = "env-file")]
    #[test]
    fn test_from_env_file() {
        let prefix = "STACKCTL_TEST_ENV_FILE";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            format!("{prefix}_API_KEY=file-key\n{prefix}_SECRET_KEY=file-secret\n{prefix}_URL=http://file/client/api\n"),
        )
        .unwrap();

        let config = ClientConfig::from_env_file(prefix, path.to_str().unwrap()).unwrap();
        assert_eq!(config.credentials.api_key(), "file-key");
        assert_eq!(config.endpoint, "http://file/client/api");
    }

    #[cfg(feature = "env-file")]
    #[test]
    fn test_from_env_file_absent_falls_back_to_environment() {
        let prefix = "STACKCTL_TEST_NO_ENV_FILE";
        set_env(prefix, "k", "s", "http://sys/client/api");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.env");

        let config = ClientConfig::from_env_file(prefix, path.to_str().unwrap()).unwrap();
        assert_eq!(config.endpoint, "http://sys/client/api");
    }

    #[test]
    fn test_environment_takes_precedence_over_profile() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let unset = "STACKCTL_TEST_DISCOVER_UNSET";
        env::remove_var(format!("{unset}_API_KEY"));
        let from_file = ClientConfig::discover_with_prefix(unset, Some(file.path()), None).unwrap();
        assert_eq!(from_file.credentials.api_key(), "prod-key");

        let prefix = "STACKCTL_TEST_DISCOVER_SET";
        set_env(prefix, "env-key", "env-secret", "http://env/client/api");
        let from_env = ClientConfig::discover_with_prefix(prefix, Some(file.path()), None).unwrap();
        assert_eq!(from_env.credentials.api_key(), "env-key");
        assert_eq!(from_env.endpoint, "http://env/client/api");
    }

    #[test]
    fn test_discover_without_env_or_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let err = ClientConfig::discover_with_prefix("STACKCTL_TEST_DISCOVER_NONE", Some(&path), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_deserialize() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"api_key":"k","secret_key":"s","endpoint":"http://x","project_id":"","http_timeout_secs":5}"#,
        )
        .unwrap();
        assert!(config.has_credentials());
        assert!(config.project_id.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }
}
