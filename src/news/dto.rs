use serde::{Deserialize, Serialize};

/// Substituted when the provider returns an article without a description.
pub const FALLBACK_SUMMARY: &str = "No summary available.";

/// News categories the upstream provider accepts. Anything else produces
/// silent empty results upstream, so requests are validated against this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Business,
    Entertainment,
    Environment,
    Food,
    Health,
    Politics,
    Science,
    Sports,
    Technology,
    Tourism,
    World,
}

impl Category {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Self::Top),
            "business" => Some(Self::Business),
            "entertainment" => Some(Self::Entertainment),
            "environment" => Some(Self::Environment),
            "food" => Some(Self::Food),
            "health" => Some(Self::Health),
            "politics" => Some(Self::Politics),
            "science" => Some(Self::Science),
            "sports" => Some(Self::Sports),
            "technology" => Some(Self::Technology),
            "tourism" => Some(Self::Tourism),
            "world" => Some(Self::World),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Business => "business",
            Self::Entertainment => "entertainment",
            Self::Environment => "environment",
            Self::Food => "food",
            Self::Health => "health",
            Self::Politics => "politics",
            Self::Science => "science",
            Self::Sports => "sports",
            Self::Technology => "technology",
            Self::Tourism => "tourism",
            Self::World => "world",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Top
    }
}

/// Countries the upstream provider supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    In,
    Us,
    Gb,
    Au,
    Ca,
    De,
    Fr,
    It,
}

impl Country {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Self::In),
            "us" => Some(Self::Us),
            "gb" => Some(Self::Gb),
            "au" => Some(Self::Au),
            "ca" => Some(Self::Ca),
            "de" => Some(Self::De),
            "fr" => Some(Self::Fr),
            "it" => Some(Self::It),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Us => "us",
            Self::Gb => "gb",
            Self::Au => "au",
            Self::Ca => "ca",
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
        }
    }
}

impl Default for Country {
    fn default() -> Self {
        Self::In
    }
}

/// Provider-independent article shape returned to clients and rendered into
/// digests. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub category: Category,
    pub country: Country,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub articles: Vec<Article>,
}
