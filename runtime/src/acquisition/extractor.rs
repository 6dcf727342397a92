//! Candidate extraction from a rendered listing surface.
//!
//! Two heuristics run over the same document snapshot and their results
//! are concatenated. The feed markup differs between layouts: some render
//! items as anchors, others as bare `<video>` elements nested somewhere
//! under an anchor. Duplicates are collapsed later by the pipeline.

use super::{bounded, pause, playable_url, Surface};
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::model::{is_valid_id, Item};
use crate::session::Session;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::Rng;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Path marker that identifies an item detail link.
pub const DEFAULT_DETAIL_MARKER: &str = "/shorts/";

/// Timing and matching knobs for surface extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Bound on the initial page load.
    pub navigation_timeout: Duration,
    /// Wait after load for client-side rendering.
    pub settle_delay: Duration,
    /// Number of one-viewport scrolls.
    pub scroll_iterations: u32,
    /// Lower bound of the jittered pause after each scroll.
    pub scroll_pause_min: Duration,
    /// Upper bound of the jittered pause after each scroll.
    pub scroll_pause_max: Duration,
    /// Bound on each scroll and on the document snapshot.
    pub step_timeout: Duration,
    pub detail_marker: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_secs(5),
            scroll_iterations: 5,
            scroll_pause_min: Duration::from_secs(2),
            scroll_pause_max: Duration::from_secs(3),
            step_timeout: Duration::from_secs(20),
            detail_marker: DEFAULT_DETAIL_MARKER.to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Same protocol with every wait removed. Used by one-shot tooling and tests.
    pub fn without_delays() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            scroll_pause_min: Duration::ZERO,
            scroll_pause_max: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Loads a surface, paginates it by scrolling, and harvests candidates.
pub struct ContentExtractor {
    config: ExtractorConfig,
}

impl ContentExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run the full extraction protocol against one surface.
    pub async fn extract(
        &self,
        session: &mut Session,
        surface: &Surface,
    ) -> AcquisitionResult<Vec<Item>> {
        let ctx = session.context_mut();

        let limit = self.config.navigation_timeout;
        let nav = bounded(
            limit,
            "navigation",
            ctx.navigate(&surface.url, limit.as_millis() as u64),
        )
        .await
        .map_err(|e| AcquisitionError::navigation(&surface.url, e))?;
        debug!(
            surface = %surface.name,
            load_time_ms = nav.load_time_ms,
            "surface loaded"
        );

        pause(self.config.settle_delay).await;

        let iterations = self.config.scroll_iterations;
        for i in 0..iterations {
            if let Err(e) = bounded(self.config.step_timeout, "scroll", ctx.scroll_viewport()).await
            {
                warn!(surface = %surface.name, error = %format!("{e:#}"), "scrolling stopped early");
                break;
            }
            pause(self.scroll_pause()).await;
            debug!(surface = %surface.name, "scroll {}/{iterations} completed", i + 1);
        }

        let html = bounded(self.config.step_timeout, "document snapshot", ctx.get_html())
            .await
            .map_err(|e| extraction_error(surface, e))?;
        let page_url = match ctx.get_url().await {
            Ok(url) if !url.is_empty() && url != "about:blank" => url,
            _ => nav.final_url,
        };

        let items = extract_from_document(&html, &page_url, &self.config.detail_marker)
            .map_err(|e| extraction_error(surface, e))?;

        info!(surface = %surface.name, found = items.len(), "surface extracted");
        Ok(items)
    }

    fn scroll_pause(&self) -> Duration {
        let (min, max) = (self.config.scroll_pause_min, self.config.scroll_pause_max);
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

fn extraction_error(surface: &Surface, err: anyhow::Error) -> AcquisitionError {
    AcquisitionError::Extraction {
        surface: surface.name.clone(),
        reason: format!("{err:#}"),
    }
}

/// Parse the item id out of a link: the path segment right after `marker`,
/// with any query or fragment cut off. Too-short ids are rejected.
pub fn parse_item_id(href: &str, marker: &str) -> Option<String> {
    let (_, rest) = href.split_once(marker)?;
    let id = rest
        .split(|c| matches!(c, '?' | '#' | '/'))
        .next()
        .unwrap_or_default();
    is_valid_id(id).then(|| id.to_string())
}

/// Apply both heuristics to a document snapshot.
pub fn extract_from_document(html: &str, page_url: &str, marker: &str) -> anyhow::Result<Vec<Item>> {
    let base = Url::parse(page_url).with_context(|| format!("invalid page URL: {page_url}"))?;
    let doc = Html::parse_document(html);
    let observed_at = Utc::now();

    let mut items = link_candidates(&doc, &base, marker, observed_at);
    items.extend(media_candidates(&doc, &base, marker, observed_at));
    Ok(items)
}

/// Link heuristic: every anchor pointing at a detail page.
pub fn link_candidates(doc: &Html, base: &Url, marker: &str, observed_at: DateTime<Utc>) -> Vec<Item> {
    let anchors = Selector::parse("a[href]").expect("anchor selector is valid");
    doc.select(&anchors)
        .filter_map(|a| candidate_from_href(a.value().attr("href")?, base, marker, observed_at))
        .collect()
}

/// Media-element heuristic: every `<video>` under a detail anchor. A playable
/// `src` on the element is captured so the item can skip resolution.
pub fn media_candidates(doc: &Html, base: &Url, marker: &str, observed_at: DateTime<Utc>) -> Vec<Item> {
    let videos = Selector::parse("video").expect("video selector is valid");
    doc.select(&videos)
        .filter_map(|video| {
            let anchor = nearest_detail_anchor(video, marker)?;
            let item = candidate_from_href(anchor.value().attr("href")?, base, marker, observed_at)?;
            Some(match video_source(video, base) {
                Some(media) => item.with_media(media),
                None => item,
            })
        })
        .collect()
}

/// The element's own `src`, else the first playable nested `<source src>`.
fn video_source(video: ElementRef<'_>, base: &Url) -> Option<String> {
    let sources = Selector::parse("source[src]").expect("source selector is valid");
    video
        .value()
        .attr("src")
        .and_then(|src| playable_url(src, base))
        .or_else(|| {
            video
                .select(&sources)
                .filter_map(|el| el.value().attr("src"))
                .find_map(|src| playable_url(src, base))
        })
}

fn nearest_detail_anchor<'a>(element: ElementRef<'a>, marker: &str) -> Option<ElementRef<'a>> {
    element.ancestors().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "a" && el.value().attr("href").is_some_and(|h| h.contains(marker))
    })
}

fn candidate_from_href(
    href: &str,
    base: &Url,
    marker: &str,
    observed_at: DateTime<Utc>,
) -> Option<Item> {
    let mut link = base.join(href).ok()?;
    let id = parse_item_id(link.path(), marker)?;
    link.set_query(None);
    link.set_fragment(None);
    Item::candidate(link.to_string(), id, observed_at)
}
