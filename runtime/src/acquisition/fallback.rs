//! Deterministic synthetic results.
//!
//! Served whenever real acquisition yields nothing, fails, or is switched
//! off. Every entry points at a publicly hosted sample clip that is known to
//! play on the watch client.

use crate::model::{Item, ItemKind};
use chrono::Utc;

/// Source tag attached to synthetic batches so clients can tell them apart.
pub const FALLBACK_SOURCE_TAG: &str = "synthetic-fallback";

/// Link prefix for synthetic items.
pub const DEFAULT_FALLBACK_LINK_BASE: &str = "https://www.youtube.com/shorts/";

/// One known-playable sample video.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub slug: &'static str,
    pub media_url: &'static str,
}

pub const SAMPLE_CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        slug: "for-bigger-blazes",
        media_url: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
    },
    CatalogEntry {
        slug: "for-bigger-escapes",
        media_url: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerEscapes.mp4",
    },
    CatalogEntry {
        slug: "for-bigger-fun",
        media_url: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4",
    },
    CatalogEntry {
        slug: "for-bigger-joyrides",
        media_url: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4",
    },
    CatalogEntry {
        slug: "for-bigger-meltdowns",
        media_url: "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerMeltdowns.mp4",
    },
];

#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    link_base: String,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_LINK_BASE)
    }
}

impl FallbackSynthesizer {
    pub fn new(link_base: impl Into<String>) -> Self {
        Self {
            link_base: link_base.into(),
        }
    }

    /// Produce exactly `count` items by cycling the catalog.
    ///
    /// Item `i` gets id `{slug}-{i}`, so ids are unique within a batch and
    /// identical across calls.
    pub fn generate(&self, count: usize) -> Vec<Item> {
        let observed_at = Utc::now();
        SAMPLE_CATALOG
            .iter()
            .cycle()
            .take(count)
            .enumerate()
            .map(|(i, entry)| {
                let id = format!("{}-{i}", entry.slug);
                Item {
                    kind: ItemKind::Short,
                    source_link: format!("{}{id}", self.link_base),
                    id,
                    media_url: Some(entry.media_url.to_string()),
                    observed_at,
                }
            })
            .collect()
    }
}
