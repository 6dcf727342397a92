// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

//! The acquired item record and its identity rules.
//!
//! Field names on the wire follow the watch client's decoder
//! (`type`, `link`, `videoId`, `videoUrl`, `scrapedAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifiers shorter than this are parse noise.
pub const MIN_ID_LEN: usize = 6;

/// Item discriminator. Only short-form video exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Short,
}

/// One acquired short-form video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Canonical detail-page URL.
    #[serde(rename = "link")]
    pub source_link: String,
    /// Stable identifier parsed from `source_link`. Dedup key.
    #[serde(rename = "videoId")]
    pub id: String,
    /// Direct playable URL, filled in by the resolver.
    #[serde(rename = "videoUrl", default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(rename = "scrapedAt")]
    pub observed_at: DateTime<Utc>,
}

impl Item {
    /// A partial record as produced by extraction. Returns `None` when the id
    /// fails the length invariant.
    pub fn candidate(
        source_link: impl Into<String>,
        id: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Option<Self> {
        let id = id.into();
        if !is_valid_id(&id) {
            return None;
        }
        Some(Self {
            kind: ItemKind::Short,
            source_link: source_link.into(),
            id,
            media_url: None,
            observed_at,
        })
    }

    /// Attach a resolved media URL.
    pub fn with_media(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = Some(media_url.into());
        self
    }

    pub fn is_playable(&self) -> bool {
        self.media_url.is_some()
    }
}

/// Whether `id` satisfies the identity invariant.
pub fn is_valid_id(id: &str) -> bool {
    id.chars().count() >= MIN_ID_LEN
}
