// Copyright 2025 Opsdesk (https://github.com/opsdesk)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Opsdesk Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:47200")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_http_addr() -> String {
    "127.0.0.1:47200".to_string()
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// OpenAI API key (falls back to OPENAI_API_KEY)
    pub openai_api_key: Option<String>,

    /// Default model for chat and message generation
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    /// Language the assistant is instructed to answer in
    #[serde(default = "default_language")]
    pub language: String,

    /// Row cap per context section handed to the model
    #[serde(default = "default_max_context_rows")]
    pub max_context_rows: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_context_rows: default_max_context_rows(),
        }
    }
}

fn default_language() -> String {
    "Spanish".to_string()
}

fn default_max_context_rows() -> usize {
    50
}

/// Business-tuned aggregation settings. Thresholds are configuration, never
/// hardcoded in the aggregation engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_vip_min_purchases")]
    pub vip_min_purchases: u64,

    #[serde(default = "default_regular_min_purchases")]
    pub regular_min_purchases: u64,

    /// Complaint categorization rules, first match wins.
    #[serde(default = "default_complaint_categories")]
    pub complaint_categories: Vec<ComplaintCategoryRule>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            vip_min_purchases: default_vip_min_purchases(),
            regular_min_purchases: default_regular_min_purchases(),
            complaint_categories: default_complaint_categories(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComplaintCategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

fn default_vip_min_purchases() -> u64 {
    5
}

fn default_regular_min_purchases() -> u64 {
    2
}

fn default_complaint_categories() -> Vec<ComplaintCategoryRule> {
    vec![
        ComplaintCategoryRule {
            name: "product quality".to_string(),
            keywords: vec!["broken".into(), "damaged".into(), "defect".into()],
        },
        ComplaintCategoryRule {
            name: "shipping".to_string(),
            keywords: vec!["late".into(), "delay".into(), "shipping".into()],
        },
        ComplaintCategoryRule {
            name: "customer service".to_string(),
            keywords: vec!["service".into(), "response".into(), "answer".into()],
        },
    ]
}

impl ServerConfig {
    /// Load configuration from a TOML file, or defaults when no path is
    /// given. Missing fields fall back to their serde defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if config.llm.openai_api_key.is_none() {
            config.llm.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address: {}", self.server.listen_addr))?;
        if self.analytics.regular_min_purchases > self.analytics.vip_min_purchases {
            anyhow::bail!(
                "regular_min_purchases ({}) exceeds vip_min_purchases ({})",
                self.analytics.regular_min_purchases,
                self.analytics.vip_min_purchases
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.chat.language, "Spanish");
        assert_eq!(config.analytics.vip_min_purchases, 5);
        assert!(!config.analytics.complaint_categories.is_empty());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:8080"

            [chat]
            language = "English"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert!(config.server.enable_cors);
        assert_eq!(config.chat.language, "English");
        assert_eq!(config.chat.max_context_rows, 50);
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let mut config = ServerConfig::default();
        config.analytics.regular_min_purchases = 10;
        assert!(config.validate().is_err());
    }
}
