//! get_sitemap_stats tool implementation.
//!
//! Summarizes a sitemap tree: totals over every page, plus per-sitemap
//! figures for each node below the root.

use std::collections::BTreeSet;
use std::time::Instant;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sitemap_client::{Sitemap, SitemapKind, SitemapPage};

use super::{json_result, parse_url};
use crate::service::SitemapService;

/// Input parameters for get_sitemap_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SitemapStatsParams {
    /// The URL of the website homepage (e.g., https://example.com).
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl PriorityStats {
    /// None when there are no pages.
    fn collect<'a>(pages: impl Iterator<Item = &'a SitemapPage>) -> Option<Self> {
        let (count, min, max, sum) = pages.fold((0usize, f64::INFINITY, f64::NEG_INFINITY, 0.0), |acc, page| {
            (acc.0 + 1, acc.1.min(page.priority), acc.2.max(page.priority), acc.3 + page.priority)
        });
        (count > 0).then(|| PriorityStats { min, max, avg: sum / count as f64 })
    }
}

/// Whole-tree figures.
#[derive(Debug, Clone, Serialize)]
pub struct TotalStats {
    pub url: String,
    pub page_count: usize,
    pub sitemap_count: usize,
    pub sitemap_types: BTreeSet<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_stats: Option<PriorityStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_story_count: Option<usize>,
}

/// Figures for one sitemap, counting only its direct pages.
#[derive(Debug, Clone, Serialize)]
pub struct SubsitemapStats {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SitemapKind,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_stats: Option<PriorityStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_count: Option<usize>,
}

/// Output structure for get_sitemap_stats tool.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapStats {
    pub total: TotalStats,
    pub subsitemaps: Vec<SubsitemapStats>,
}

fn non_zero(count: usize) -> Option<usize> {
    (count > 0).then_some(count)
}

/// Compute statistics for `tree`, reported under `url`.
pub fn compute_stats(url: &str, tree: &Sitemap) -> SitemapStats {
    let subsitemaps: Vec<SubsitemapStats> = tree
        .all_sitemaps()
        .map(|sitemap| SubsitemapStats {
            url: sitemap.url.clone(),
            kind: sitemap.kind,
            page_count: sitemap.pages.len(),
            priority_stats: PriorityStats::collect(sitemap.pages.iter()),
            last_modified_count: non_zero(sitemap.pages.iter().filter(|p| p.last_modified.is_some()).count()),
        })
        .collect();

    let total = TotalStats {
        url: url.to_string(),
        page_count: tree.page_count(),
        sitemap_count: subsitemaps.len(),
        sitemap_types: tree.all_sitemaps().map(|s| s.kind.as_str()).collect(),
        priority_stats: PriorityStats::collect(tree.all_pages()),
        last_modified_count: non_zero(tree.all_pages().filter(|p| p.last_modified.is_some()).count()),
        news_story_count: non_zero(tree.all_pages().filter(|p| p.news_story.is_some()).count()),
    };

    SitemapStats { total, subsitemaps }
}

/// Implementation of the get_sitemap_stats tool.
pub async fn stats_impl(service: &SitemapService, params: SitemapStatsParams) -> Result<CallToolResult, McpError> {
    let url = parse_url("url", &params.url)?;
    tracing::info!("Analyzing sitemap statistics for {}", url);

    let start = Instant::now();
    let tree = service.get_sitemap(&url).await;
    let stats = compute_stats(url.as_str(), &tree);

    tracing::info!("Analyzed sitemap stats for {} in {:.2} seconds", url, start.elapsed().as_secs_f64());

    json_result(&stats)
}
