/// Catalyst detection from release and news feeds
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EnrichmentConfig;
use crate::facts::{CatalystKind, CatalystSource, CatalystSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub name: Option<String>,
    pub tag_name: Option<String>,
    pub html_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Collect recent qualifying events, newest first
///
/// Every release inside the lookback counts. Feed items also need a title
/// containing one of the configured keywords, which keeps routine blog posts
/// out.
pub fn detect(
    releases: &[Release],
    feed_items: &[FeedItem],
    now: DateTime<Utc>,
    cfg: &EnrichmentConfig,
) -> CatalystSummary {
    let cutoff = now - Duration::days(cfg.catalyst_lookback_days);
    let mut sources: Vec<CatalystSource> = Vec::new();

    for release in releases {
        let Some(date) = release.published_at.filter(|d| *d >= cutoff) else {
            continue;
        };
        let title = release
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| release.tag_name.clone())
            .unwrap_or_else(|| "Release".to_string());
        sources.push(CatalystSource {
            kind: CatalystKind::GithubRelease,
            title,
            url: release.html_url.clone(),
            date,
        });
    }

    for item in feed_items {
        let (Some(date), Some(title)) = (item.date.filter(|d| *d >= cutoff), item.title.as_ref())
        else {
            continue;
        };
        if !is_significant(title, &cfg.catalyst_keywords) {
            continue;
        }
        sources.push(CatalystSource {
            kind: CatalystKind::BlogPost,
            title: title.clone(),
            url: item.url.clone(),
            date,
        });
    }

    sources.sort_by(|a, b| b.date.cmp(&a.date));

    CatalystSummary {
        has_clean_catalyst: !sources.is_empty(),
        clean_catalyst: sources
            .first()
            .map(|s| format!("{} ({})", s.title, s.date.format("%Y-%m-%d"))),
        catalyst_sources: sources,
    }
}

fn is_significant(title: &str, keywords: &[String]) -> bool {
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_str()))
}
