use serde::Deserialize;

use crate::sources::{EdamamConfig, OpenFoodFactsConfig, UsdaConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub usda_api_key: String,
    pub usda_base_url: String,
    pub off_base_url: String,
    pub off_user_agent: String,
    pub edamam_app_id: String,
    pub edamam_app_key: String,
    pub edamam_base_url: String,
    pub http_timeout_secs: u64,
}

impl SourcesConfig {
    pub fn usda(&self) -> UsdaConfig {
        UsdaConfig {
            api_key: self.usda_api_key.clone(),
            base_url: self.usda_base_url.clone(),
            timeout_secs: self.http_timeout_secs,
        }
    }

    pub fn open_food_facts(&self) -> OpenFoodFactsConfig {
        OpenFoodFactsConfig {
            user_agent: self.off_user_agent.clone(),
            base_url: self.off_base_url.clone(),
            timeout_secs: self.http_timeout_secs,
        }
    }

    pub fn edamam(&self) -> EdamamConfig {
        EdamamConfig {
            app_id: self.edamam_app_id.clone(),
            app_key: self.edamam_app_key.clone(),
            base_url: self.edamam_base_url.clone(),
            timeout_secs: self.http_timeout_secs,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let usda = UsdaConfig::default();
        let off = OpenFoodFactsConfig::default();
        let edamam = EdamamConfig::default();
        Self {
            usda_api_key: usda.api_key,
            usda_base_url: usda.base_url,
            off_base_url: off.base_url,
            off_user_agent: off.user_agent,
            edamam_app_id: edamam.app_id,
            edamam_app_key: edamam.app_key,
            edamam_base_url: edamam.base_url,
            http_timeout_secs: usda.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Without a database the cache lives in process memory.
    pub database_url: Option<String>,
    pub sources: SourcesConfig,
    pub cache_cleanup_interval_minutes: u64,
    pub insight_service_url: Option<String>,
}

fn var_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = SourcesConfig::default();
        let sources = SourcesConfig {
            usda_api_key: var_or("USDA_API_KEY", defaults.usda_api_key),
            usda_base_url: var_or("USDA_BASE_URL", defaults.usda_base_url),
            off_base_url: var_or("OFF_BASE_URL", defaults.off_base_url),
            off_user_agent: var_or("OFF_USER_AGENT", defaults.off_user_agent),
            edamam_app_id: var_or("EDAMAM_APP_ID", defaults.edamam_app_id),
            edamam_app_key: var_or("EDAMAM_APP_KEY", defaults.edamam_app_key),
            edamam_base_url: var_or("EDAMAM_BASE_URL", defaults.edamam_base_url),
            http_timeout_secs: parsed_or("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        };
        anyhow::ensure!(sources.http_timeout_secs > 0, "HTTP_TIMEOUT_SECS must be positive");

        let cache_cleanup_interval_minutes = parsed_or("CACHE_CLEANUP_INTERVAL_MINUTES", 360);
        anyhow::ensure!(
            cache_cleanup_interval_minutes > 0,
            "CACHE_CLEANUP_INTERVAL_MINUTES must be positive"
        );

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            sources,
            cache_cleanup_interval_minutes,
            insight_service_url: std::env::var("INSIGHT_SERVICE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_configs_share_the_timeout() {
        let cfg = SourcesConfig {
            usda_api_key: "k".into(),
            http_timeout_secs: 3,
            ..Default::default()
        };
        assert_eq!(cfg.usda().api_key, "k");
        assert_eq!(cfg.usda().timeout_secs, 3);
        assert_eq!(cfg.edamam().timeout_secs, 3);
        assert_eq!(cfg.open_food_facts().base_url, "https://world.openfoodfacts.org");
    }
}
