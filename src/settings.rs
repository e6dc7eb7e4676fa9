use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use log::info;
use serde::Deserialize;

use crate::{
    api::{
        endpoint::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE},
        QueryParams,
    },
    batch::{EmptyBatchPolicy, FetchRequest},
    record::DedupKey,
    shaping::PostLabel,
};

#[derive(Deserialize, Debug, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FetchSettings {
    pub subreddit: String,
    pub target_batches: usize,
    pub workers: usize,
    #[serde(default)]
    pub sequential: bool,
    /// Unset means the mode default: retry when concurrent, stop when sequential.
    pub retry_on_empty: Option<bool>,
    pub max_empty_retries: usize,
    pub dedup_field: String,
    pub fetch_timeout_ms: Option<u64>,
    #[serde(default)]
    pub params: QueryParams,
}

impl FetchSettings {
    pub fn to_request(&self) -> FetchRequest {
        let mut request = FetchRequest::new(&self.subreddit, self.target_batches)
            .with_params(self.params.clone())
            .with_dedup_key(DedupKey::new(&self.dedup_field));

        request = if self.sequential {
            request.sequential()
        } else {
            request.with_workers(self.workers)
        };

        let retry_on_empty = self.retry_on_empty.unwrap_or(!self.sequential);
        request = request.with_empty_policy(if retry_on_empty {
            EmptyBatchPolicy::Retry {
                max_consecutive: self.max_empty_retries,
            }
        } else {
            EmptyBatchPolicy::Stop
        });

        if let Some(timeout_ms) = self.fetch_timeout_ms {
            request = request.with_fetch_timeout(Duration::from_millis(timeout_ms));
        }

        request
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ShapingSettings {
    pub text_field: String,
    pub label: PostLabel,
    #[serde(default)]
    pub print_rows: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub fetch: FetchSettings,
    pub shaping: ShapingSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("settings"))
            .add_source(File::with_name("settings.local").required(false))
            .add_source(Environment::with_prefix("subreddit_fetch").separator("__"))
            .build()?;

        let settings = s.try_deserialize()?;

        info!("Loaded settings. {:#?}", settings);

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use crate::batch::FetchMode;

    use super::*;

    const BASE: &str = r#"
        [api]
        base_url = "https://api.pushshift.io"
        page_size = 500
        request_timeout_ms = 1000

        [fetch]
        subreddit = "conspiracy"
        target_batches = 50
        workers = 4
        max_empty_retries = 3
        dedup_field = "title"

        [fetch.params]
        sort_type = "score"
        after = "1y"

        [shaping]
        text_field = "selftext"
        label = "conspiracy"
    "#;

    const MINIMAL: &str = r#"
        [api]
        request_timeout_ms = 1000

        [fetch]
        subreddit = "news"
        target_batches = 5
        workers = 2
        max_empty_retries = 3
        dedup_field = "title"

        [shaping]
        text_field = "selftext"
        label = "news"
    "#;

    fn settings(extra: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(BASE, FileFormat::Toml))
            .add_source(File::from_str(extra, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn given_concurrent_settings__when_mapped__should_retry_on_empty_by_default() {
        let request = settings("").fetch.to_request();

        assert_eq!(request.mode, FetchMode::Concurrent { workers: 4 });
        assert_eq!(
            request.on_empty,
            EmptyBatchPolicy::Retry { max_consecutive: 3 }
        );
        assert_eq!(request.target_batches, 50);
        assert_eq!(request.params.get("sort_type").map(String::as_str), Some("score"));
        assert_eq!(request.fetch_timeout, None);
    }

    #[test]
    fn given_sequential_settings__when_mapped__should_stop_on_empty_by_default() {
        let request = settings("[fetch]\nsequential = true").fetch.to_request();

        assert_eq!(request.mode, FetchMode::Sequential);
        assert_eq!(request.on_empty, EmptyBatchPolicy::Stop);
    }

    #[test]
    fn given_explicit_retry_flag__when_mapped__should_override_mode_default() {
        let request = settings("[fetch]\nsequential = true\nretry_on_empty = true\nfetch_timeout_ms = 250")
            .fetch
            .to_request();

        assert_eq!(
            request.on_empty,
            EmptyBatchPolicy::Retry { max_consecutive: 3 }
        );
        assert_eq!(request.fetch_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn given_shaping_section__when_loaded__should_parse_label() {
        let settings = settings("");

        assert_eq!(settings.shaping.label, PostLabel::Conspiracy);
        assert!(!settings.shaping.print_rows);
        assert_eq!(settings.api.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn given_api_section_without_endpoint__when_loaded__should_use_default_url_and_page_size() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.api.base_url, "https://api.pushshift.io");
        assert_eq!(settings.api.page_size, 500);
        assert!(settings.fetch.params.is_empty());
    }
}
