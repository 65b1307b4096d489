//! Customer feedback sentiment
//!
//! Feedback lives in memory. New entries are labelled by a small keyword
//! lexicon, a stand-in for a real classifier.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::format::humanize_since;
use crate::services::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(format!("Invalid sentiment: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: u64,
    pub content: String,
    pub customer: String,
    pub received_at: DateTime<Utc>,
    pub sentiment: Sentiment,
}

/// Feedback with its relative age
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackView {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedbackQuery {
    /// `None` keeps every sentiment
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    /// Case-insensitive match on content or customer
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}

impl FeedbackQuery {
    fn matches(&self, feedback: &Feedback) -> bool {
        if self.sentiment.is_some_and(|s| s != feedback.sentiment) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                feedback.content.to_lowercase().contains(&needle)
                    || feedback.customer.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentCount {
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub total: usize,
    pub positive: SentimentCount,
    pub neutral: SentimentCount,
    pub negative: SentimentCount,
}

impl SentimentDistribution {
    pub fn from_feedback(items: &[Feedback]) -> Self {
        let total = items.len();
        let tally = |sentiment: Sentiment| {
            let count = items.iter().filter(|f| f.sentiment == sentiment).count();
            let percentage = if total == 0 {
                0
            } else {
                (count as f64 / total as f64 * 100.0).round() as u32
            };
            SentimentCount { count, percentage }
        };

        Self {
            total,
            positive: tally(Sentiment::Positive),
            neutral: tally(Sentiment::Neutral),
            negative: tally(Sentiment::Negative),
        }
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "excellent", "perfect", "perfectly", "easy", "helpful", "improved",
    "amazing", "exactly", "fantastic", "fast", "recommend",
];

const NEGATIVE_WORDS: &[&str] = &[
    "frustrating", "can't", "cannot", "issue", "issues", "problem", "problems", "confusing",
    "slow", "broken", "bad", "poor", "terrible", "hate",
];

/// Keyword-count sentiment
pub fn classify(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let mut score: i32 = 0;
    for word in lowered.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
        if POSITIVE_WORDS.contains(&word) {
            score += 1;
        } else if NEGATIVE_WORDS.contains(&word) {
            score -= 1;
        }
    }

    match score {
        s if s > 0 => Sentiment::Positive,
        s if s < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// Stock feedback, dated relative to `now`
pub fn seed_feedback(now: DateTime<Utc>) -> Vec<Feedback> {
    let entries: [(&str, &str, i64, Sentiment); 7] = [
        (
            "I love how easy this recovery system is! It helped me recover so many abandoned carts.",
            "sarah.johnson@example.com",
            2,
            Sentiment::Positive,
        ),
        (
            "The interface is sleek but I found the campaign setup process a bit confusing at first.",
            "david.smith@example.com",
            3,
            Sentiment::Neutral,
        ),
        (
            "It's frustrating that I can't customize the discount amounts for specific customer segments.",
            "emily.jones@example.com",
            5,
            Sentiment::Negative,
        ),
        (
            "This is exactly what our store needed. Already seeing great recovery rates!",
            "michael.brown@example.com",
            7,
            Sentiment::Positive,
        ),
        (
            "The analytics are detailed and helpful, but loading times could be improved.",
            "jennifer.williams@example.com",
            8,
            Sentiment::Neutral,
        ),
        (
            "We experienced several technical issues during setup that required support assistance.",
            "robert.taylor@example.com",
            14,
            Sentiment::Negative,
        ),
        (
            "The AI-suggested subject lines have improved our open rates considerably!",
            "lisa.anderson@example.com",
            15,
            Sentiment::Positive,
        ),
    ];

    entries
        .into_iter()
        .enumerate()
        .map(|(i, (content, customer, days, sentiment))| Feedback {
            id: i as u64 + 1,
            content: content.to_string(),
            customer: customer.to_string(),
            received_at: now - Duration::days(days),
            sentiment,
        })
        .collect()
}

/// In-memory feedback collection
pub struct FeedbackBoard {
    items: RwLock<Vec<Feedback>>,
    notifier: Arc<dyn Notifier>,
}

impl FeedbackBoard {
    pub fn new(items: Vec<Feedback>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            items: RwLock::new(items),
            notifier,
        }
    }

    /// Board seeded with the stock feedback
    pub fn seeded(notifier: Arc<dyn Notifier>) -> Self {
        Self::new(seed_feedback(Utc::now()), notifier)
    }

    pub async fn list(&self, query: &FeedbackQuery, now: DateTime<Utc>) -> Vec<FeedbackView> {
        let items = self.items.read().await;
        let mut matching: Vec<&Feedback> = items.iter().filter(|f| query.matches(f)).collect();

        matching.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if query.order == SortOrder::Oldest {
            matching.reverse();
        }

        matching
            .into_iter()
            .map(|f| FeedbackView {
                date: humanize_since(f.received_at, now),
                feedback: f.clone(),
            })
            .collect()
    }

    /// Distribution over all feedback, ignoring any filter
    pub async fn distribution(&self) -> SentimentDistribution {
        SentimentDistribution::from_feedback(&self.items.read().await)
    }

    /// Classify and store new feedback
    pub async fn add(&self, content: impl Into<String>, customer: impl Into<String>) -> Feedback {
        let content = content.into();
        let sentiment = classify(&content);

        let feedback = {
            let mut items = self.items.write().await;
            let id = items.iter().map(|f| f.id).max().unwrap_or(0) + 1;
            let feedback = Feedback {
                id,
                content,
                customer: customer.into(),
                received_at: Utc::now(),
                sentiment,
            };
            items.push(feedback.clone());
            feedback
        };

        tracing::debug!(feedback_id = feedback.id, sentiment = sentiment.as_str(), "Feedback added");
        self.notifier.notify(Notice::success(
            "New feedback added",
            format!(
                "A new {} feedback has been added to the analysis.",
                sentiment.as_str()
            ),
        ));
        feedback
    }
}
