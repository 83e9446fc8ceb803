use super::answers::AnswerSet;
use super::catalog::IndicatorCatalog;
use super::domain::{EsgTopic, ScoreCard};
use std::collections::HashMap;

/// Raw point totals for one topic before normalization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TopicScore {
    pub total_points: u32,
    pub max_points: u32,
}

impl TopicScore {
    /// Normalized to a 0-5 scale; a topic with no weight scores 0.
    pub fn normalized(&self) -> f64 {
        if self.max_points > 0 {
            f64::from(self.total_points) / f64::from(self.max_points) * 5.0
        } else {
            0.0
        }
    }
}

/// Per-topic accumulation derived from an answer set on demand.
#[derive(Debug, Default)]
pub struct ScoreBreakdown {
    per_topic: HashMap<EsgTopic, TopicScore>,
}

impl ScoreBreakdown {
    pub fn topic(&self, topic: EsgTopic) -> TopicScore {
        self.per_topic.get(&topic).copied().unwrap_or_default()
    }

    pub fn card(&self) -> ScoreCard {
        let e = self.topic(EsgTopic::E).normalized();
        let s = self.topic(EsgTopic::S).normalized();
        let g = self.topic(EsgTopic::G).normalized();
        ScoreCard {
            e,
            s,
            g,
            overall: (e + s + g) / 3.0,
        }
    }
}

/// Aggregate an answer set against the catalog.
///
/// Total over any well-formed answer set: an unanswered indicator still
/// counts toward the topic ceiling, and selected option ids the catalog
/// does not know contribute nothing.
pub fn score(catalog: &IndicatorCatalog, answers: &AnswerSet) -> ScoreBreakdown {
    let mut per_topic: HashMap<EsgTopic, TopicScore> = HashMap::new();

    for indicator in catalog.indicators() {
        let entry = per_topic.entry(indicator.topic).or_default();
        for sub_question in &indicator.sub_questions {
            entry.max_points += sub_question.max_points();

            let selected = answers.selected(indicator.id, sub_question.id);
            entry.total_points += selected
                .iter()
                .filter_map(|option_id| sub_question.option(option_id))
                .map(|option| option.points)
                .sum::<u32>();
        }
    }

    ScoreBreakdown { per_topic }
}
