//! Advisory findings produced while initializing a provider.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::config::ProviderConfig;

const LEGACY_ENV_PREFIX: &str = "AWS_";

/// Non-fatal configuration problems reported at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitWarning {
    /// Without a public base URL, uploads above the single-request size
    /// threshold cannot produce a file URL.
    MissingPublicAccessUrl,
    /// `AWS_*` variables left over from a plain S3 setup may override the
    /// provider's own credentials inside the SDK.
    LegacyAwsEnv { vars: Vec<String> },
}

impl Display for InitWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InitWarning::MissingPublicAccessUrl => write!(
                f,
                "cloudflarePublicAccessUrl is not set; uploads larger than 5MB will fail to produce a URL"
            ),
            InitWarning::LegacyAwsEnv { vars } => write!(
                f,
                "AWS_ environment variables are set and may conflict with the provider configuration: {}",
                vars.join(", ")
            ),
        }
    }
}

/// Collect the startup warnings for `config` given the current variable names.
pub fn collect_init_warnings<I, S>(config: &ProviderConfig, env_keys: I) -> Vec<InitWarning>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut warnings = Vec::new();

    if config.public_access_url().is_none() {
        warnings.push(InitWarning::MissingPublicAccessUrl);
    }

    let mut legacy: Vec<String> = env_keys
        .into_iter()
        .filter(|key| key.as_ref().starts_with(LEGACY_ENV_PREFIX))
        .map(|key| key.as_ref().to_string())
        .collect();
    if !legacy.is_empty() {
        legacy.sort();
        warnings.push(InitWarning::LegacyAwsEnv { vars: legacy });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_warnings_for_complete_config() {
        let mut config = ProviderConfig::new("media");
        config.cloudflare_public_access_url = Some("https://cdn.example.com".to_string());

        let warnings = collect_init_warnings(&config, ["HOME", "CF_BUCKET"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn warns_on_missing_public_url_and_legacy_vars() {
        let config = ProviderConfig::new("media");

        let warnings = collect_init_warnings(
            &config,
            ["AWS_SECRET_ACCESS_KEY", "PATH", "AWS_ACCESS_KEY_ID"],
        );
        assert_eq!(
            warnings,
            vec![
                InitWarning::MissingPublicAccessUrl,
                InitWarning::LegacyAwsEnv {
                    vars: vec![
                        "AWS_ACCESS_KEY_ID".to_string(),
                        "AWS_SECRET_ACCESS_KEY".to_string()
                    ]
                },
            ]
        );
        assert!(warnings[1].to_string().contains("AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY"));
    }
}
