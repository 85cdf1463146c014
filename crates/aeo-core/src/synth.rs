//! Mock scan results.
//!
//! Stands in for a call to an AI answer engine: each query gets an
//! independent presence draw, and only a present answer can mention the brand
//! or cite the tracked domain.

use chrono::{DateTime, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const NOTE_DETECTED: &str = "AI answer detected (mock)";
pub const NOTE_SUMMARIZED: &str = "AI overview summarized the query (mock)";
pub const NOTE_ABSENT: &str = "AI answer absent (mock)";
pub const NOTE_CITED: &str = "AI answer present with citations (mock)";

/// Draw probabilities for one synthesized result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisProfile {
    pub presence_rate: f64,
    /// Applied only when the answer is present.
    pub brand_mention_rate: f64,
    /// Applied only when the answer is present.
    pub url_citation_rate: f64,
}

impl Default for SynthesisProfile {
    fn default() -> Self {
        Self {
            presence_rate: 0.68,
            brand_mention_rate: 0.42,
            url_citation_rate: 0.28,
        }
    }
}

/// The three visibility flags of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultFlags {
    pub ai_presence: bool,
    pub brand_mentioned: bool,
    pub your_url_cited: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedResult {
    pub ai_presence: bool,
    pub brand_mentioned: bool,
    pub your_url_cited: bool,
    pub cited_urls: Vec<String>,
    pub note: String,
    pub captured_at: DateTime<Utc>,
}

impl SynthesizedResult {
    #[must_use]
    pub fn flags(&self) -> ResultFlags {
        ResultFlags {
            ai_presence: self.ai_presence,
            brand_mentioned: self.brand_mentioned,
            your_url_cited: self.your_url_cited,
        }
    }
}

/// The pool citations are drawn from for `domain`.
#[must_use]
pub fn sample_citation_urls(domain: &str) -> Vec<String> {
    vec![
        format!("https://{domain}/blog/aeo-basics"),
        format!("https://{domain}/guides/ai-search"),
        "https://example.com/seo/ai-overviews".to_string(),
        "https://search.engine/docs/ai-answers".to_string(),
        "https://industryreport.com/aeo-trends".to_string(),
    ]
}

/// Pick 1–3 distinct citations; when `include_domain` is set and none of them
/// points at `domain`, the domain root is appended.
pub fn build_cited_urls<R: Rng + ?Sized>(
    rng: &mut R,
    domain: &str,
    include_domain: bool,
) -> Vec<String> {
    let mut urls = sample_citation_urls(domain);
    urls.shuffle(rng);
    urls.truncate(rng.random_range(1..=3));

    if include_domain && !urls.iter().any(|url| url.contains(domain)) {
        urls.push(format!("https://{domain}/"));
    }

    urls
}

/// Synthesize the result for a single query.
pub fn synthesize_result<R: Rng + ?Sized>(
    rng: &mut R,
    domain: &str,
    profile: &SynthesisProfile,
) -> SynthesizedResult {
    let ai_presence = rng.random::<f64>() < profile.presence_rate;
    let brand_mentioned = ai_presence && rng.random::<f64>() < profile.brand_mention_rate;
    let your_url_cited = ai_presence && rng.random::<f64>() < profile.url_citation_rate;

    let cited_urls = if ai_presence {
        build_cited_urls(rng, domain, your_url_cited)
    } else {
        Vec::new()
    };

    let note = if !ai_presence {
        NOTE_ABSENT
    } else if your_url_cited {
        NOTE_CITED
    } else {
        [NOTE_DETECTED, NOTE_SUMMARIZED]
            .choose(rng)
            .copied()
            .unwrap_or(NOTE_DETECTED)
    };

    SynthesizedResult {
        ai_presence,
        brand_mentioned,
        your_url_cited,
        cited_urls,
        note: note.to_string(),
        captured_at: Utc::now(),
    }
}

/// Synthesize `count` results, one per query, in order.
pub fn synthesize_results<R: Rng + ?Sized>(
    rng: &mut R,
    domain: &str,
    profile: &SynthesisProfile,
    count: usize,
) -> Vec<SynthesizedResult> {
    (0..count)
        .map(|_| synthesize_result(rng, domain, profile))
        .collect()
}

/// Rounded percentage of `count` in `total`; zero when `total` is zero.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

/// Aggregate visibility of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub ai_presence_count: usize,
    pub brand_mention_count: usize,
    pub url_cited_count: usize,
}

impl ScanSummary {
    pub fn tally<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = ResultFlags>,
    {
        flags.into_iter().fold(Self::default(), |mut acc, f| {
            acc.total += 1;
            acc.ai_presence_count += usize::from(f.ai_presence);
            acc.brand_mention_count += usize::from(f.brand_mentioned);
            acc.url_cited_count += usize::from(f.your_url_cited);
            acc
        })
    }

    #[must_use]
    pub fn ai_presence_percent(&self) -> u32 {
        percent(self.ai_presence_count, self.total)
    }

    #[must_use]
    pub fn brand_mention_percent(&self) -> u32 {
        percent(self.brand_mention_count, self.total)
    }

    #[must_use]
    pub fn url_cited_percent(&self) -> u32 {
        percent(self.url_cited_count, self.total)
    }
}

#[cfg(test)]
#[path = "synth_test.rs"]
mod tests;
