use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;

use std::path::PathBuf;

use crate::{
    directory::{AllMyChanges, DEFAULT_BASE_URL},
    error::DirectoryError,
    runtime::Runtime,
};

/// Settings given on the command line or through `AMCH_*` variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Contents of `config.toml`.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    token: Option<String>,
    base_url: Option<String>,
}

/// Resolved, immutable configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub token: Option<String>,
}

impl Config {
    /// Merge command-line options over the settings file over the defaults.
    pub fn load<R: Runtime>(runtime: &R, options: &ConfigOptions) -> Result<Self> {
        let settings = load_settings(runtime, options)?;

        let token = options
            .token
            .clone()
            .or(settings.token)
            .filter(|token| !token.trim().is_empty());
        let base_url = options
            .base_url
            .clone()
            .or(settings.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        debug!("Using API at {}", base_url);

        Ok(Self { base_url, token })
    }

    /// Web site root used in report lines, e.g. `https://allmychanges.com`.
    pub fn site_url(&self) -> &str {
        self.base_url
            .strip_suffix("/v1")
            .unwrap_or(&self.base_url)
    }

    pub fn require_token(&self) -> Result<(), DirectoryError> {
        match &self.token {
            Some(_) => Ok(()),
            None => Err(DirectoryError::AuthenticationRequired),
        }
    }

    pub fn http_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Token contains characters not allowed in a header")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using OAuth token for authentication: {}", mask(token));
        }

        let client = Client::builder()
            .user_agent(concat!("amch-cli/", env!("AMCH_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(client)
    }

    pub fn directory(&self) -> Result<AllMyChanges> {
        Ok(AllMyChanges::with_base_url(self.http_client()?, &self.base_url))
    }
}

fn load_settings<R: Runtime>(runtime: &R, options: &ConfigOptions) -> Result<Settings> {
    let path = match &options.config_file {
        Some(path) => path.clone(),
        None => match runtime.config_dir() {
            Some(dir) => {
                let path = dir.join("amch").join("config.toml");
                if !runtime.exists(&path) {
                    return Ok(Settings::default());
                }
                path
            }
            None => return Ok(Settings::default()),
        },
    };

    debug!("Reading settings from {:?}", path);
    let content = runtime.read_to_string(&path)?;
    toml::from_str(&content).with_context(|| format!("Failed to parse settings file {:?}", path))
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use mockito::{Matcher, Server};
    use std::path::Path;

    fn runtime_without_settings() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime.expect_config_dir().returning(|| None);
        runtime
    }

    fn runtime_with_settings(content: &'static str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));
        runtime
            .expect_exists()
            .with(eq(Path::new("/home/user/.config/amch/config.toml")))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(move |_| Ok(content.to_string()));
        runtime
    }

    #[test]
    fn test_defaults() {
        let config = Config::load(&runtime_without_settings(), &ConfigOptions::default()).unwrap();
        assert_eq!(config.base_url, "https://allmychanges.com/v1");
        assert_eq!(config.site_url(), "https://allmychanges.com");
        assert_eq!(config.token, None);
        assert!(matches!(
            config.require_token(),
            Err(DirectoryError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_settings_file_is_used() {
        let runtime = runtime_with_settings(
            "token = \"file-token\"\nbase_url = \"http://localhost:8000/v1/\"\n",
        );
        let config = Config::load(&runtime, &ConfigOptions::default()).unwrap();
        assert_eq!(config.token.as_deref(), Some("file-token"));
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.site_url(), "http://localhost:8000");
        assert!(config.require_token().is_ok());
    }

    #[test]
    fn test_options_override_settings_file() {
        let runtime = runtime_with_settings("token = \"file-token\"\n");
        let options = ConfigOptions {
            token: Some("cli-token".into()),
            base_url: Some("http://127.0.0.1:1234".into()),
            ..Default::default()
        };
        let config = Config::load(&runtime, &options).unwrap();
        assert_eq!(config.token.as_deref(), Some("cli-token"));
        assert_eq!(config.base_url, "http://127.0.0.1:1234");
        assert_eq!(config.site_url(), "http://127.0.0.1:1234");
    }

    #[test]
    fn test_missing_default_settings_file_is_ignored() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/nowhere")));
        runtime.expect_exists().returning(|_| false);
        runtime.expect_read_to_string().never();

        let config = Config::load(&runtime, &ConfigOptions::default()).unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_explicit_settings_file_must_exist() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|path| Err(anyhow::anyhow!("Failed to read {:?}", path)));
        let options = ConfigOptions {
            config_file: Some(PathBuf::from("/missing.toml")),
            ..Default::default()
        };
        assert!(Config::load(&runtime, &options).is_err());
    }

    #[test]
    fn test_malformed_settings_file() {
        let runtime = runtime_with_settings("token = ");
        let err = Config::load(&runtime, &ConfigOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let options = ConfigOptions {
            token: Some("  ".into()),
            ..Default::default()
        };
        let config = Config::load(&runtime_without_settings(), &options).unwrap();
        assert!(config.require_token().is_err());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*********");
        assert_eq!(mask("abcdefghijklmnop"), "abcd*********mnop");
    }

    /// Verify the Authorization header sent for a given token.
    async fn verify_authorization_header(token: Option<&str>) {
        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/")
            .match_header("Authorization", expected_header)
            .match_header("User-Agent", Matcher::Regex("^amch-cli/".into()))
            .create_async()
            .await;

        let config = Config {
            base_url: server.url(),
            token: token.map(str::to_string),
        };
        let client = config.http_client().unwrap();
        let _ = client.get(server.url()).send().await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_with_token() {
        verify_authorization_header(Some("test_token")).await;
    }

    #[tokio::test]
    async fn test_client_without_token() {
        verify_authorization_header(None).await;
    }
}
