//! Pure aggregation over a session's recorded answers.

use crate::model::{Answer, QuizSettings, Topic};

/// Number of correct answers.
#[must_use]
pub fn calculate_score(answers: &[Answer]) -> u32 {
    let correct = answers.iter().filter(|a| a.is_correct).count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// `round(score / total * 100)`, half-up; `0` when `total` is `0`.
#[must_use]
pub fn calculate_percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    let rounded = (score * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── MOTIVATIONAL TIER ─────────────────────────────────────────────────────────
//

/// Four fixed performance bands, checked highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotivationalTier {
    /// 90 % and above.
    Top,
    /// 70 % to 89 %.
    High,
    /// 50 % to 69 %.
    Mid,
    /// Below 50 %.
    Low,
}

impl MotivationalTier {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 90 {
            Self::Top
        } else if percentage >= 70 {
            Self::High
        } else if percentage >= 50 {
            Self::Mid
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Top => "Excellent! You really know this subject.",
            Self::High => "Very good! Keep studying.",
            Self::Mid => "Good work! Review a few topics.",
            Self::Low => "Keep practicing! Knowledge comes with time.",
        }
    }
}

//
// ─── THEME STATS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicTally {
    pub correct: u32,
    pub total: u32,
}

impl TopicTally {
    /// Share of correct answers in `[0, 1]`; `0` for an empty tally.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.total)
        }
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        calculate_percentage(self.correct, self.total)
    }
}

/// Per-topic tallies in the order topics first appear in the answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeStats {
    entries: Vec<(Topic, TopicTally)>,
}

impl ThemeStats {
    #[must_use]
    pub fn get(&self, topic: &Topic) -> Option<&TopicTally> {
        self.entries
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, tally)| tally)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Topic, &TopicTally)> {
        self.entries.iter().map(|(t, tally)| (t, tally))
    }

    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.entries.iter().map(|(t, _)| t)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&mut self, topic: &Topic, is_correct: bool) {
        let index = match self.entries.iter().position(|(t, _)| t == topic) {
            Some(index) => index,
            None => {
                self.entries.push((topic.clone(), TopicTally::default()));
                self.entries.len() - 1
            }
        };
        let tally = &mut self.entries[index].1;
        tally.total = tally.total.saturating_add(1);
        if is_correct {
            tally.correct = tally.correct.saturating_add(1);
        }
    }
}

#[must_use]
pub fn calculate_theme_stats(answers: &[Answer]) -> ThemeStats {
    let mut stats = ThemeStats::default();
    for answer in answers {
        stats.record(&answer.topic, answer.is_correct);
    }
    stats
}

/// The `limit` topics with the lowest correct ratio, weakest first.
///
/// Equal ratios keep their order from `stats`.
#[must_use]
pub fn difficult_themes(stats: &ThemeStats, limit: usize) -> Vec<Topic> {
    let mut ranked: Vec<(&Topic, f64)> = stats.iter().map(|(t, tally)| (t, tally.ratio())).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(t, _)| t.clone())
        .collect()
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Everything the results screen needs, derived from the answer list.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tier: MotivationalTier,
    pub theme_stats: ThemeStats,
    pub difficult_topics: Vec<Topic>,
    pub qualifies_for_certificate: bool,
    pub unanswered: u32,
    pub total_time_secs: u64,
}

impl QuizSummary {
    #[must_use]
    pub fn from_answers(answers: &[Answer], settings: &QuizSettings) -> Self {
        let score = calculate_score(answers);
        let total = u32::try_from(answers.len()).unwrap_or(u32::MAX);
        let percentage = calculate_percentage(score, total);
        let theme_stats = calculate_theme_stats(answers);
        let difficult_topics = difficult_themes(&theme_stats, settings.difficult_topic_limit());
        let unanswered = answers
            .iter()
            .filter(|a| a.selection.is_no_answer())
            .count();

        Self {
            score,
            total,
            percentage,
            tier: MotivationalTier::from_percentage(percentage),
            theme_stats,
            difficult_topics,
            qualifies_for_certificate: total > 0
                && percentage >= settings.certificate_threshold(),
            unanswered: u32::try_from(unanswered).unwrap_or(u32::MAX),
            total_time_secs: answers.iter().map(|a| u64::from(a.time_taken_secs)).sum(),
        }
    }
}
