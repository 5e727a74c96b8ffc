//! Chunking strategies and the selector that picks among them (spec §4.2, §4.3).

pub mod code_aware;
pub mod packing;
pub mod sentences;
pub mod structural;

use crate::analysis::ContentAnalysis;
use crate::config::{ChunkConfig, SelectorMode, StrategyOverride};
use crate::error::Result;
use crate::metadata::Chunk;

/// A pluggable chunking strategy. Implementations are stateless; all
/// decisions are derived from the [`ContentAnalysis`] and [`ChunkConfig`]
/// passed in.
pub trait Strategy {
    /// Stable identifier recorded on every chunk's `metadata.strategy`.
    fn name(&self) -> &'static str;

    /// Lower numbers run first in [`SelectorMode::Strict`].
    fn priority(&self) -> u8;

    /// Whether this strategy is a reasonable fit for `analysis`.
    fn can_handle(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> bool;

    /// Produce chunks for the full document text.
    fn apply(&self, text: &str, analysis: &ContentAnalysis, config: &ChunkConfig) -> Result<Vec<Chunk>>;

    /// Estimated fit of this strategy for `analysis`, in `[0.0, 1.0]`. Used
    /// only by [`SelectorMode::Weighted`].
    fn quality_score(&self, analysis: &ContentAnalysis) -> f64;
}

fn strategy_for_override(ov: StrategyOverride) -> &'static str {
    match ov {
        StrategyOverride::CodeAware => "code_aware",
        StrategyOverride::Structural => "structural",
        StrategyOverride::Sentences => "sentences",
    }
}

/// Picks which [`Strategy`] should chunk a given document (spec §4.3).
pub struct Selector {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Selector {
    /// The three built-in strategies, in their natural priority order.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(code_aware::CodeAwareStrategy),
                Box::new(structural::StructuralStrategy),
                Box::new(sentences::SentencesStrategy),
            ],
        }
    }

    /// Choose a strategy for `analysis` under `config`.
    ///
    /// 1. If `config.strategy_override` names a strategy that exists, use it
    ///    unconditionally (bypassing `can_handle`).
    /// 2. In [`SelectorMode::Strict`], try strategies in ascending priority
    ///    order and take the first whose `can_handle` returns `true`.
    /// 3. In [`SelectorMode::Weighted`], score every strategy and take the
    ///    highest; ties favor the denser (lower-priority-number) strategy.
    ///
    /// The sentences strategy always accepts, so this never returns `None`.
    pub fn select(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> &dyn Strategy {
        if let Some(ov) = config.strategy_override {
            let name = strategy_for_override(ov);
            if let Some(s) = self.strategies.iter().find(|s| s.name() == name) {
                return s.as_ref();
            }
        }

        let chosen = match config.selector_mode {
            SelectorMode::Strict => self.select_strict(analysis, config),
            SelectorMode::Weighted => self.select_weighted(analysis, config),
        };
        log::debug!("selector chose '{}' strategy", chosen.name());
        chosen
    }

    fn select_strict(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> &dyn Strategy {
        let mut candidates: Vec<&Box<dyn Strategy>> = self.strategies.iter().collect();
        candidates.sort_by_key(|s| s.priority());
        candidates
            .into_iter()
            .find(|s| s.can_handle(analysis, config))
            .map(|s| s.as_ref())
            .unwrap_or_else(|| self.fallback())
    }

    fn select_weighted(&self, analysis: &ContentAnalysis, config: &ChunkConfig) -> &dyn Strategy {
        let mut best: Option<(&Box<dyn Strategy>, f64)> = None;

        for strategy in &self.strategies {
            if !strategy.can_handle(analysis, config) {
                continue;
            }
            let priority_component = 1.0 / (strategy.priority() as f64);
            let mut score = 0.5 * priority_component + 0.5 * strategy.quality_score(analysis);

            // Density preference (spec §4.3): structural wins when the
            // document is clearly header-partitioned; otherwise code_aware
            // wins when there's any code or table content to keep atomic.
            let structural_preferred = analysis.header_count > 3 && analysis.max_header_depth > 1;
            let code_aware_preferred = analysis.code_block_count >= 1
                || analysis.code_ratio > config.code_ratio_threshold
                || analysis.table_count > 0;

            if structural_preferred && strategy.name() == "structural" {
                score += 0.2;
            } else if !structural_preferred && code_aware_preferred && strategy.name() == "code_aware" {
                score += 0.2;
            }

            match &best {
                Some((_, best_score)) if *best_score >= score => {}
                _ => best = Some((strategy, score)),
            }
        }

        best.map(|(s, _)| s.as_ref()).unwrap_or_else(|| self.fallback())
    }

    fn fallback(&self) -> &dyn Strategy {
        self.strategies
            .iter()
            .find(|s| s.name() == "sentences")
            .expect("sentences strategy is always registered")
            .as_ref()
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;

    #[test]
    fn strict_mode_picks_code_aware_for_code_heavy_doc() {
        let text = "```python\n".to_string() + &"x = 1\n".repeat(20) + "```\n";
        let config = ChunkConfig::balanced();
        let analysis = analyze(&text, &config).unwrap();
        let selector = Selector::new();
        assert_eq!(selector.select(&analysis, &config).name(), "code_aware");
    }

    #[test]
    fn strict_mode_falls_back_to_sentences_for_plain_prose() {
        let text = "Just a short paragraph of plain prose with no structure at all.";
        let config = ChunkConfig::balanced();
        let analysis = analyze(text, &config).unwrap();
        let selector = Selector::new();
        assert_eq!(selector.select(&analysis, &config).name(), "sentences");
    }

    #[test]
    fn override_bypasses_can_handle() {
        let text = "Just plain prose.";
        let config = ChunkConfig {
            strategy_override: Some(StrategyOverride::Structural),
            ..ChunkConfig::balanced()
        };
        let analysis = analyze(text, &config).unwrap();
        let selector = Selector::new();
        assert_eq!(selector.select(&analysis, &config).name(), "structural");
    }

    #[test]
    fn structural_preferred_over_sentences_when_headers_present() {
        let text = "# A\n\nbody\n\n## B\n\nbody\n\n## C\n\nbody\n";
        let config = ChunkConfig {
            header_count_threshold: 2,
            ..ChunkConfig::balanced()
        };
        let analysis = analyze(text, &config).unwrap();
        let selector = Selector::new();
        assert_eq!(selector.select(&analysis, &config).name(), "structural");
    }

    #[test]
    fn weighted_mode_prefers_structural_for_header_heavy_doc() {
        let text = "# Root\n\nbody\n\n## A\n\nbody\n\n## B\n\nbody\n\n## C\n\nbody\n\n## D\n\nbody\n";
        let config = ChunkConfig {
            header_count_threshold: 2,
            selector_mode: SelectorMode::Weighted,
            ..ChunkConfig::balanced()
        };
        let analysis = analyze(text, &config).unwrap();
        assert!(analysis.header_count > 3 && analysis.max_header_depth > 1);

        let selector = Selector::new();
        assert_eq!(selector.select(&analysis, &config).name(), "structural");
    }
}
