use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::catalog::{Comment, Video};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "love",
    "best",
    "awesome",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "worst",
    "poor",
    "disappointing",
];

/// Score given to a video when there is nothing to analyze.
const NEUTRAL_SCORE: f64 = 5.0;

static RESULT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Anything the analyzer can score: it only needs a stable identifier and the text.
pub trait CommentText {
    fn comment_id(&self) -> &str;
    fn content(&self) -> &str;
}

impl CommentText for Comment {
    fn comment_id(&self) -> &str {
        &self.id
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// Keyword based sentiment, in [-1.0, 1.0].
///
/// Lexicon entries are matched as plain substrings of the lowercased content,
/// so "badass" counts as a hit for "bad".
#[derive(Debug, Clone, Copy)]
pub struct SentimentScorer {
    positive: &'static [&'static str],
    negative: &'static [&'static str],
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS,
            negative: NEGATIVE_WORDS,
        }
    }
}

impl SentimentScorer {
    pub fn score(&self, content: &str) -> f64 {
        let content = content.to_lowercase();

        let positive_count = self
            .positive
            .iter()
            .filter(|word| content.contains(*word))
            .count();
        let negative_count = self
            .negative
            .iter()
            .filter(|word| content.contains(*word))
            .count();

        let total = positive_count + negative_count;
        if total == 0 {
            return 0.0;
        }
        (positive_count as f64 - negative_count as f64) / total as f64
    }
}

#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    id: String,
    method: String,
    scorer: SentimentScorer,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new("analyzer_1", "sentiment_analysis")
    }
}

impl QualityAnalyzer {
    pub fn new(id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            scorer: SentimentScorer::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Per-comment sentiment, keyed by comment identifier, in input order.
    pub fn score_comments<'a, C: CommentText>(&self, comments: &'a [C]) -> Vec<(&'a str, f64)> {
        comments
            .iter()
            .map(|comment| {
                let sentiment = self.scorer.score(comment.content());
                tracing::debug!(comment = comment.comment_id(), sentiment, "scored comment");
                (comment.comment_id(), sentiment)
            })
            .collect()
    }

    pub fn analyze<C: CommentText>(&self, comments: &[C]) -> AnalysisResult {
        let scores = self.score_comments(comments);

        let quality_score = if scores.is_empty() {
            NEUTRAL_SCORE
        } else {
            let avg_sentiment =
                scores.iter().map(|(_, s)| s).sum::<f64>() / scores.len() as f64;
            // remap [-1, 1] onto [0, 10]
            round_to_hundredths((avg_sentiment + 1.0) * 5.0)
        };

        tracing::info!(
            analyzer = %self.id,
            comments = comments.len(),
            quality_score,
            "analysis finished"
        );

        AnalysisResult::new(quality_score, comments.len())
    }

    pub fn generate_report(&self, video: &Video) -> String {
        let result = self.analyze(&video.comments);
        format!(
            "Analysis Report for '{}': Score {:.2}/10",
            video.title,
            result.quality_score()
        )
    }
}

/// Rounds the exact binary value, not `value * 100`: 2.675 is stored just below the tie
/// and becomes 2.67. True ties (5.125) go to the even hundredth.
fn round_to_hundredths(value: f64) -> f64 {
    // fixed-precision formatting is exact, 80 places cover every f64 in the score range
    let exact = format!("{:.80}", value.abs());
    let Some((whole, fraction)) = exact.split_once('.') else {
        return value;
    };
    let (kept, rest) = fraction.split_at(2);

    let hundredths = whole
        .bytes()
        .chain(kept.bytes())
        .fold(0u64, |n, digit| n * 10 + u64::from(digit - b'0'));
    let round_up = match rest.as_bytes().first() {
        Some(b'6'..=b'9') => true,
        Some(b'5') => rest[1..].bytes().any(|d| d != b'0') || hundredths % 2 == 1,
        _ => false,
    };

    let rounded = (hundredths + u64::from(round_up)) as f64 / 100.0;
    rounded.copysign(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Mixed,
    NotRecommended,
}

impl Recommendation {
    pub fn from_score(quality_score: f64) -> Self {
        if quality_score >= 8.0 {
            Self::HighlyRecommended
        } else if quality_score >= 6.0 {
            Self::Recommended
        } else if quality_score >= 4.0 {
            Self::Mixed
        } else {
            Self::NotRecommended
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighlyRecommended => "Highly recommended! This video has excellent reviews.",
            Self::Recommended => "Recommended. This video has good reviews overall.",
            Self::Mixed => "Mixed reviews. Watch at your own discretion.",
            Self::NotRecommended => "Not recommended. This video has poor reviews.",
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Outcome of one analysis pass. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    result_id: String,
    quality_score: f64,
    total_comments_analyzed: usize,
    recommendation: Recommendation,
    analyzed_at: DateTime<Local>,
}

impl AnalysisResult {
    fn new(quality_score: f64, total_comments_analyzed: usize) -> Self {
        let analyzed_at = Local::now();
        let seq = RESULT_SEQ.fetch_add(1, Ordering::Relaxed);

        Self {
            result_id: format!("result_{}_{seq}", analyzed_at.format("%Y%m%d%H%M%S%6f")),
            quality_score,
            total_comments_analyzed,
            recommendation: Recommendation::from_score(quality_score),
            analyzed_at,
        }
    }

    pub fn result_id(&self) -> &str {
        &self.result_id
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn total_comments_analyzed(&self) -> usize {
        self.total_comments_analyzed
    }

    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    pub fn analyzed_at(&self) -> DateTime<Local> {
        self.analyzed_at
    }

    /// Writes the three-line text export into `dir`, named after the result id.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.txt", self.result_id));

        fs::write(
            &path,
            format!(
                "Quality Score: {:.2}/10\nRecommendation: {}\nTotal Comments: {}\n",
                self.quality_score, self.recommendation, self.total_comments_analyzed
            ),
        )?;

        tracing::info!(path = %path.display(), "result saved");
        Ok(path)
    }
}

impl Display for AnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "ANALYSIS RESULT")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Quality Score: {:.2}/10", self.quality_score)?;
        writeln!(f, "Total Comments Analyzed: {}", self.total_comments_analyzed)?;
        writeln!(f, "Recommendation: {}", self.recommendation)?;
        writeln!(
            f,
            "Analysis Date: {}",
            self.analyzed_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        write!(f, "{rule}")
    }
}
