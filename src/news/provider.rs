use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::auth::repo::User;
use crate::config::NewsConfig;
use crate::news::dto::{Article, Category, Country, FALLBACK_SUMMARY};

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("unknown {field}: {value}")]
    InvalidFacet { field: &'static str, value: String },
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Resolve optional facet strings against the allow-lists, applying the
/// provider defaults when a facet is omitted.
pub fn parse_facets(
    category: Option<&str>,
    country: Option<&str>,
) -> Result<(Category, Country), NewsError> {
    let category = match category {
        Some(raw) => Category::parse(raw).ok_or_else(|| NewsError::InvalidFacet {
            field: "category",
            value: raw.to_string(),
        })?,
        None => Category::default(),
    };
    let country = match country {
        Some(raw) => Country::parse(raw).ok_or_else(|| NewsError::InvalidFacet {
            field: "country",
            value: raw.to_string(),
        })?,
        None => Country::default(),
    };
    Ok((category, country))
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(
        &self,
        category: Category,
        country: Country,
        limit: usize,
    ) -> Result<Vec<Article>, NewsError>;
}

/// Fetch with the user's stored preferences. Stored values that are missing
/// or no longer in the allow-lists fall back to the defaults instead of
/// erroring, so a stale profile still gets a digest.
pub async fn fetch_for_user(
    provider: &dyn NewsProvider,
    user: &User,
    limit: usize,
) -> Result<Vec<Article>, NewsError> {
    let category = Category::parse(&user.category).unwrap_or_default();
    let country = Country::parse(&user.country).unwrap_or_default();
    provider.fetch(category, country, limit).await
}

/// newsdata.io client.
pub struct NewsDataClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    #[serde(default)]
    results: Vec<NewsDataItem>,
}

#[derive(Debug, Deserialize)]
struct NewsDataItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
}

impl NewsDataClient {
    pub fn new(config: &NewsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl NewsProvider for NewsDataClient {
    async fn fetch(
        &self,
        category: Category,
        country: Country,
        limit: usize,
    ) -> Result<Vec<Article>, NewsError> {
        let url = format!("{}/latest", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("category", category.as_str()),
                ("country", country.as_str()),
                ("language", "en"),
            ])
            .send()
            .await
            .context("news provider request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::Upstream(anyhow::anyhow!(
                "news provider returned {}: {}",
                status,
                body
            )));
        }

        let payload: NewsDataResponse = response
            .json()
            .await
            .context("failed to parse news provider response")?;

        let articles: Vec<Article> = payload
            .results
            .into_iter()
            .filter_map(|item| normalize(item, category, country))
            .take(limit)
            .collect();
        debug!(
            category = category.as_str(),
            country = country.as_str(),
            count = articles.len(),
            "fetched articles"
        );
        Ok(articles)
    }
}

/// Map one provider item into the canonical shape. Items without a title or
/// link are dropped; a blank description gets the fallback summary.
fn normalize(item: NewsDataItem, category: Category, country: Country) -> Option<Article> {
    let title = item.title.filter(|t| !t.trim().is_empty())?;
    let url = item.link.filter(|l| !l.trim().is_empty())?;
    let summary = match item.description {
        Some(d) if !d.trim().is_empty() => d,
        _ => FALLBACK_SUMMARY.to_string(),
    };
    Some(Article {
        title,
        summary,
        url,
        image_url: item.image_url,
        published_at: item.pub_date,
        source: item.source_id,
        category,
        country,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, description: Option<&str>) -> NewsDataItem {
        NewsDataItem {
            title: Some(title.to_string()),
            link: Some(format!("https://example.com/{title}")),
            description: description.map(|d| d.to_string()),
            image_url: None,
            pub_date: Some("2025-06-01 09:00:00".to_string()),
            source_id: Some("example".to_string()),
        }
    }

    #[test]
    fn normalize_keeps_provider_description() {
        let article = normalize(
            item("budget", Some("The annual budget was announced.")),
            Category::Business,
            Country::In,
        )
        .expect("article");
        assert_eq!(article.summary, "The annual budget was announced.");
        assert_eq!(article.category, Category::Business);
    }

    #[test]
    fn normalize_substitutes_fallback_for_blank_description() {
        for description in [None, Some(""), Some("   \n")] {
            let article = normalize(item("quake", description), Category::Top, Country::In)
                .expect("article");
            assert_eq!(article.summary, FALLBACK_SUMMARY);
        }
    }

    #[test]
    fn normalize_drops_items_without_title_or_link() {
        let mut missing_title = item("x", Some("d"));
        missing_title.title = None;
        assert!(normalize(missing_title, Category::Top, Country::In).is_none());

        let mut blank_link = item("y", Some("d"));
        blank_link.link = Some("  ".to_string());
        assert!(normalize(blank_link, Category::Top, Country::In).is_none());
    }

    #[test]
    fn parse_facets_applies_defaults() {
        let (category, country) = parse_facets(None, None).expect("defaults");
        assert_eq!(category, Category::Top);
        assert_eq!(country, Country::In);
    }

    #[test]
    fn parse_facets_rejects_unknown_values() {
        let err = parse_facets(Some("gaming"), None).unwrap_err();
        assert!(matches!(
            err,
            NewsError::InvalidFacet { field: "category", .. }
        ));
        let err = parse_facets(None, Some("zz")).unwrap_err();
        assert!(matches!(
            err,
            NewsError::InvalidFacet { field: "country", .. }
        ));
    }
}
