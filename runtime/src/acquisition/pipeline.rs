//! Pipeline: one complete acquisition run.
//!
//! Phases, in order:
//!
//! 1. **Session**: start a fresh browser session
//! 2. **Extraction**: primary surface, then the trending surface
//! 3. **Dedupe**: collapse by id, first occurrence wins, then bound to the request
//! 4. **Resolution**: visit each candidate lacking media, one at a time
//! 5. **Release**: the session is stopped on every exit path
//!
//! A failing surface contributes nothing; a failing item is dropped. The run
//! itself never fails: an unrecoverable error yields an empty list, which the
//! service layer turns into a fallback batch.

use super::diagnostics::Diagnostics;
use super::extractor::{ContentExtractor, ExtractorConfig};
use super::resolver::{MediaResolver, ResolverConfig};
use super::Surface;
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::model::Item;
use crate::session::BrowserSessionManager;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Surfaces and per-stage settings for a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub primary: Surface,
    pub secondary: Surface,
    pub extractor: ExtractorConfig,
    pub resolver: ResolverConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary: Surface::primary_feed(),
            secondary: Surface::trending(),
            extractor: ExtractorConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Default surfaces with every settle and scroll pause removed.
    pub fn without_delays() -> Self {
        Self {
            extractor: ExtractorConfig::without_delays(),
            resolver: ResolverConfig::without_delays(),
            ..Self::default()
        }
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SessionStarting,
    ExtractingPrimary,
    ExtractingSecondary,
    Deduping,
    ResolvingMedia,
    SessionClosing,
    Settled,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::SessionStarting => "session_starting",
            RunPhase::ExtractingPrimary => "extracting_primary",
            RunPhase::ExtractingSecondary => "extracting_secondary",
            RunPhase::Deduping => "deduping",
            RunPhase::ResolvingMedia => "resolving_media",
            RunPhase::SessionClosing => "session_closing",
            RunPhase::Settled => "settled",
        };
        f.write_str(s)
    }
}

/// Phase bookkeeping for one run, logged on every transition.
struct RunTrace {
    run_id: Uuid,
    phase: RunPhase,
    started: Instant,
}

impl RunTrace {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(
            run = %self.run_id,
            from = %self.phase,
            to = %phase,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "run phase"
        );
        self.phase = phase;
    }
}

pub struct AcquisitionPipeline {
    config: PipelineConfig,
    extractor: ContentExtractor,
    resolver: MediaResolver,
    diagnostics: Diagnostics,
}

impl AcquisitionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            extractor: ContentExtractor::new(config.extractor.clone()),
            resolver: MediaResolver::new(config.resolver.clone()),
            diagnostics: Diagnostics::disabled(),
            config,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Swap the resolver, e.g. to change the strategy chain.
    pub fn with_resolver(mut self, resolver: MediaResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Acquire up to `requested` playable items. Never fails; the session is
    /// released before returning.
    pub async fn run(&self, sessions: &mut BrowserSessionManager, requested: usize) -> Vec<Item> {
        if requested == 0 {
            return Vec::new();
        }

        let mut trace = RunTrace::new();
        info!(run = %trace.run_id, requested, "acquisition run starting");

        let outcome = self.drive(sessions, requested, &mut trace).await;

        trace.enter(RunPhase::SessionClosing);
        sessions.stop().await;
        trace.enter(RunPhase::Settled);

        let elapsed_ms = trace.started.elapsed().as_millis() as u64;
        match outcome {
            Ok(items) => {
                info!(run = %trace.run_id, returned = items.len(), requested, elapsed_ms, "acquisition run settled");
                items
            }
            Err(e) => {
                warn!(run = %trace.run_id, kind = e.kind(), error = %e, elapsed_ms, "acquisition run produced nothing");
                Vec::new()
            }
        }
    }

    async fn drive(
        &self,
        sessions: &mut BrowserSessionManager,
        requested: usize,
        trace: &mut RunTrace,
    ) -> AcquisitionResult<Vec<Item>> {
        trace.enter(RunPhase::SessionStarting);
        let session = sessions.start().await?;

        let mut candidates = Vec::new();
        let surfaces = [
            (RunPhase::ExtractingPrimary, &self.config.primary),
            (RunPhase::ExtractingSecondary, &self.config.secondary),
        ];
        for (phase, surface) in surfaces {
            trace.enter(phase);
            match self.extractor.extract(session, surface).await {
                Ok(found) => candidates.extend(found),
                Err(e) => {
                    warn!(surface = %surface.name, kind = e.kind(), error = %e, "surface contributed nothing");
                }
            }
        }

        self.diagnostics.capture(session.context()).await;

        trace.enter(RunPhase::Deduping);
        let extracted = candidates.len();
        let mut unique = dedupe(candidates);
        info!(extracted, unique = unique.len(), "candidates collected");
        unique.truncate(requested);

        if unique.is_empty() {
            return Err(AcquisitionError::PipelineExhausted);
        }

        trace.enter(RunPhase::ResolvingMedia);
        let total = unique.len();
        let mut resolved = Vec::with_capacity(total);
        for (i, candidate) in unique.into_iter().enumerate() {
            if candidate.is_playable() {
                resolved.push(candidate);
                continue;
            }
            debug!("resolving media for candidate {}/{total}", i + 1);
            match self.resolver.resolve(session, candidate).await {
                Ok(item) => resolved.push(item),
                Err(e) => warn!(kind = e.kind(), error = %e, "candidate dropped"),
            }
        }

        if resolved.is_empty() {
            return Err(AcquisitionError::PipelineExhausted);
        }
        Ok(resolved)
    }
}

/// Collapse candidates by id, keeping first-occurrence order.
///
/// A later duplicate can only fill in a media URL the first one lacked.
pub fn dedupe(items: Vec<Item>) -> Vec<Item> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<Item> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&item.id) {
            Some(&pos) => {
                if unique[pos].media_url.is_none() {
                    unique[pos].media_url = item.media_url;
                }
            }
            None => {
                positions.insert(item.id.clone(), unique.len());
                unique.push(item);
            }
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cand(id: &str) -> Item {
        Item::candidate(format!("https://x.test/shorts/{id}"), id, Utc::now()).unwrap()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_dedupe_preserves_first_occurrence_order() {
        let primary = vec![cand("abc123xy"), cand("abc123xy"), cand("zzz9999z")];
        let secondary = vec![cand("zzz9999z")];
        let all: Vec<Item> = primary.into_iter().chain(secondary).collect();

        let unique = dedupe(all);
        assert_eq!(ids(&unique), ["abc123xy", "zzz9999z"]);
    }

    #[test]
    fn test_dedupe_one_per_id() {
        let input: Vec<Item> = ["aaaaaa1", "bbbbbb2", "aaaaaa1", "cccccc3", "bbbbbb2", "aaaaaa1"]
            .iter()
            .map(|id| cand(id))
            .collect();
        let unique = dedupe(input);
        assert_eq!(ids(&unique), ["aaaaaa1", "bbbbbb2", "cccccc3"]);
    }

    #[test]
    fn test_dedupe_fills_missing_media_from_duplicate() {
        let input = vec![
            cand("abc123xy"),
            cand("abc123xy").with_media("https://cdn.test/a.mp4"),
            cand("abc123xy").with_media("https://cdn.test/b.mp4"),
        ];
        let unique = dedupe(input);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].media_url.as_deref(), Some("https://cdn.test/a.mp4"));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(RunPhase::ExtractingSecondary.to_string(), "extracting_secondary");
        assert_eq!(RunPhase::Settled.to_string(), "settled");
    }
}
