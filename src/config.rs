use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// 60 MiB, the largest upload the gallery accepts.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 60 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials for the media service account.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub credentials: CloudinaryCredentials,
    pub api_base: String,
    pub delivery_base: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: u64,
    pub video_folder: String,
    pub image_folder: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            video_folder: "mediashare-vid".to_string(),
            image_folder: "mediashare-img".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub sign_in_url: String,
    pub sign_up_url: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"<redacted>")
            .field("sign_in_url", &self.sign_in_url)
            .field("sign_up_url", &self.sign_up_url)
            .finish()
    }
}

/// Process configuration, assembled once at startup and handed to the
/// components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: String,
    pub shutdown_grace: Duration,
    pub cloudinary: CloudinaryConfig,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let bind_addr: SocketAddr = parse_or(&get, "BIND_ADDR", "0.0.0.0:8000".parse().ok())?;
        let shutdown_grace_secs: u64 = parse_or(&get, "SHUTDOWN_GRACE_SECS", Some(30))?;
        let timeout_secs: Option<u64> = parse_opt(&get, "CLOUDINARY_TIMEOUT_SECS")?;
        let max_upload_bytes =
            parse_or(&get, "MAX_UPLOAD_BYTES", Some(DEFAULT_MAX_UPLOAD_BYTES))?;

        let defaults = UploadConfig::default();

        Ok(Self {
            bind_addr,
            database_url: required("DATABASE_URL")?,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
            cloudinary: CloudinaryConfig {
                credentials: CloudinaryCredentials {
                    cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                    api_key: required("CLOUDINARY_API_KEY")?,
                    api_secret: required("CLOUDINARY_API_SECRET")?,
                },
                api_base: get("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| "https://api.cloudinary.com".to_string()),
                delivery_base: get("CLOUDINARY_DELIVERY_BASE")
                    .unwrap_or_else(|| "https://res.cloudinary.com".to_string()),
                timeout: timeout_secs.map(Duration::from_secs),
            },
            upload: UploadConfig {
                max_upload_bytes,
                video_folder: get("VIDEO_FOLDER").unwrap_or(defaults.video_folder),
                image_folder: get("IMAGE_FOLDER").unwrap_or(defaults.image_folder),
            },
            auth: AuthConfig {
                session_secret: required("SESSION_SECRET")?,
                sign_in_url: get("SIGN_IN_URL")
                    .unwrap_or_else(|| "https://accounts.example.com/sign-in".to_string()),
                sign_up_url: get("SIGN_UP_URL")
                    .unwrap_or_else(|| "https://accounts.example.com/sign-up".to_string()),
            },
        })
    }
}

fn parse_opt<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Parses `name` if set, falls back to `default`, and reports `Missing` when
/// neither is available.
fn parse_or<T, G>(get: &G, name: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match parse_opt(get, name)? {
        Some(value) => Ok(value),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}
