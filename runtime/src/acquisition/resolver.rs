//! Media URL resolution for a single candidate.
//!
//! Visits the candidate's detail page and runs an ordered list of
//! strategies over the rendered document. The first strategy that returns a
//! playable URL wins.

use super::{bounded, pause, playable_url};
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::model::Item;
use crate::session::Session;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// One way of finding a media URL in a detail page.
#[derive(Clone, Copy)]
pub struct ResolutionStrategy {
    pub name: &'static str,
    pub find: fn(&Html, &Url) -> Option<String>,
}

impl std::fmt::Debug for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResolutionStrategy").field(&self.name).finish()
    }
}

/// Strategies in priority order.
pub const DEFAULT_STRATEGIES: [ResolutionStrategy; 3] = [
    ResolutionStrategy {
        name: "video_src",
        find: video_element_source,
    },
    ResolutionStrategy {
        name: "source_element",
        find: nested_source_element,
    },
    ResolutionStrategy {
        name: "script_payload",
        find: script_payload_url,
    },
];

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bound on loading the detail page.
    pub navigation_timeout: Duration,
    /// Wait after load before inspecting the page.
    pub settle_delay: Duration,
    /// Bound on the document snapshot.
    pub step_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            step_timeout: Duration::from_secs(20),
        }
    }
}

impl ResolverConfig {
    pub fn without_delays() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub struct MediaResolver {
    config: ResolverConfig,
    strategies: Vec<ResolutionStrategy>,
}

impl MediaResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_strategies(config, DEFAULT_STRATEGIES.to_vec())
    }

    pub fn with_strategies(config: ResolverConfig, strategies: Vec<ResolutionStrategy>) -> Self {
        Self { config, strategies }
    }

    /// Visit the item's detail page and attach a media URL.
    pub async fn resolve(&self, session: &mut Session, item: Item) -> AcquisitionResult<Item> {
        let ctx = session.context_mut();

        let limit = self.config.navigation_timeout;
        let nav = bounded(
            limit,
            "navigation",
            ctx.navigate(&item.source_link, limit.as_millis() as u64),
        )
        .await
        .map_err(|e| resolution_error(&item, format!("{e:#}")))?;

        pause(self.config.settle_delay).await;

        let html = bounded(self.config.step_timeout, "detail snapshot", ctx.get_html())
            .await
            .map_err(|e| resolution_error(&item, format!("{e:#}")))?;

        match self.resolve_from_document(&html, &nav.final_url) {
            Some((strategy, media_url)) => {
                info!(id = %item.id, strategy, "media URL resolved");
                Ok(item.with_media(media_url))
            }
            None => Err(resolution_error(&item, "no strategy matched".to_string())),
        }
    }

    /// Run the strategy chain over a detail-page snapshot.
    pub fn resolve_from_document(&self, html: &str, page_url: &str) -> Option<(&'static str, String)> {
        let base = Url::parse(page_url).ok()?;
        let doc = Html::parse_document(html);
        self.strategies.iter().find_map(|strategy| {
            let found = (strategy.find)(&doc, &base);
            if found.is_none() {
                debug!(strategy = strategy.name, "strategy found nothing");
            }
            found.map(|url| (strategy.name, url))
        })
    }
}

fn resolution_error(item: &Item, reason: String) -> AcquisitionError {
    AcquisitionError::Resolution {
        id: item.id.clone(),
        reason,
    }
}

/// The first `<video>` element's own `src`.
pub fn video_element_source(doc: &Html, base: &Url) -> Option<String> {
    let video = Selector::parse("video").expect("video selector is valid");
    let src = doc.select(&video).next()?.value().attr("src")?;
    playable_url(src, base)
}

/// A `<source>` nested in any `<video>`.
pub fn nested_source_element(doc: &Html, base: &Url) -> Option<String> {
    let source = Selector::parse("video source[src]").expect("source selector is valid");
    doc.select(&source)
        .filter_map(|el| el.value().attr("src"))
        .find_map(|src| playable_url(src, base))
}

/// Markers of the inline script that carries the player configuration.
const PLAYER_PAYLOAD_MARKERS: [&str; 2] = ["player_response", "PlayerResponse"];

/// An escaped `"url":"...mp4..."` inside the player payload script. Other
/// scripts (ads, previews) are ignored.
pub fn script_payload_url(doc: &Html, base: &Url) -> Option<String> {
    static MP4_URL: OnceLock<Regex> = OnceLock::new();
    let re = MP4_URL.get_or_init(|| {
        Regex::new(r#""url":"([^"]+\.mp4[^"]*)""#).expect("mp4 url regex is valid")
    });

    let scripts = Selector::parse("script").expect("script selector is valid");
    doc.select(&scripts).find_map(|script| {
        let text: String = script.text().collect();
        if !PLAYER_PAYLOAD_MARKERS.iter().any(|m| text.contains(m)) {
            return None;
        }
        re.captures_iter(&text)
            .filter_map(|cap| cap.get(1))
            .find_map(|m| playable_url(&unescape_js_url(m.as_str()), base))
    })
}

/// Undo the escaping the page applies to URLs embedded in JSON payloads.
pub fn unescape_js_url(raw: &str) -> String {
    raw.replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\/", "/")
        .replace("\\u0026", "&")
}
