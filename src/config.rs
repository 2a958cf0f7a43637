use serde::{de::Visitor, Deserialize};
use std::{
    ops::Deref,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://adpick.co.kr/apis/offers.php";
pub const DEFAULT_AFFID: &str = "2efa07";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Rand,
    #[default]
    RandOne,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Rand => "rand",
            Order::RandOne => "randone",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub endpoint: Url,
    pub affid: String,
    pub order: Order,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            affid: DEFAULT_AFFID.to_owned(),
            order: Order::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub published_file: PathBuf,
    pub max_offers: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("ads"),
            published_file: PathBuf::from("published_offers.json"),
            max_offers: 1,
        }
    }
}

/// Fallback text for offers that leave fields out.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    pub default_title: String,
    pub default_headline: String,
    pub default_link: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            default_title: "제목 없음".to_owned(),
            default_headline: "설명 없음".to_owned(),
            default_link: "#".to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    pub enabled: bool,
    pub base_url: DirUrl,
    pub path: PathBuf,
    pub page_prefix: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        SitemapConfig {
            enabled: false,
            base_url: DirUrl::new(
                Url::parse("https://example.github.io/").expect("default base url is valid"),
            ),
            path: PathBuf::from("sitemap.xml"),
            page_prefix: "ads/".to_owned(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub page: PageConfig,
    pub sitemap: SitemapConfig,
}

impl Config {
    pub fn load(path: &Path) -> crate::model::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

/// A url whose path always ends in `/`, so joining a relative path appends to
/// it instead of replacing the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirUrl(Url);

impl DirUrl {
    pub fn new(mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        DirUrl(url)
    }
}

impl<'de> Deserialize<'de> for DirUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DirUrlVisitor;
        impl Visitor<'_> for DirUrlVisitor {
            type Value = DirUrl;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "an absolute url")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let url = Url::parse(v).map_err(E::custom)?;
                if url.cannot_be_a_base() {
                    return Err(E::custom(format!("{v} cannot be used as a base url")));
                }
                Ok(DirUrl::new(url))
            }
        }

        deserializer.deserialize_str(DirUrlVisitor)
    }
}

impl Deref for DirUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.affid, DEFAULT_AFFID);
        assert_eq!(config.api.order, Order::RandOne);
        assert_eq!(config.output.max_offers, 1);
        assert_eq!(config.output.dir, PathBuf::from("ads"));
        assert!(!config.sitemap.enabled);
    }

    #[test]
    fn partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [api]
            affid = "abc123"
            order = "rand"

            [output]
            max_offers = 3

            [sitemap]
            enabled = true
            base_url = "https://someone.github.io/landing"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.affid, "abc123");
        assert_eq!(config.api.order.as_str(), "rand");
        assert_eq!(config.api.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.output.max_offers, 3);
        assert_eq!(
            config.output.published_file,
            PathBuf::from("published_offers.json")
        );
        assert_eq!(config.sitemap.base_url.as_str(), "https://someone.github.io/landing/");
    }

    #[test]
    fn rejects_bad_order() {
        let err = toml::from_str::<Config>("[api]\norder = \"newest\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_relative_base_url() {
        let err = toml::from_str::<Config>("[sitemap]\nbase_url = \"landing/\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn dir_url_keeps_trailing_slash() {
        let url = DirUrl::new(Url::parse("https://a.example/x/").unwrap());
        assert_eq!(url.as_str(), "https://a.example/x/");
        assert_eq!(url.join("p.html").unwrap().as_str(), "https://a.example/x/p.html");
    }
}
