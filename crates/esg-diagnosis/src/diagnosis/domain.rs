use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EsgTopic {
    E,
    S,
    G,
}

impl EsgTopic {
    pub const fn ordered() -> [Self; 3] {
        [Self::E, Self::S, Self::G]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::E => "Environment",
            Self::S => "Social",
            Self::G => "Governance",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: &'static str,
    pub text: &'static str,
    pub points: u32,
    #[serde(rename = "isExclusive")]
    pub exclusive: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubQuestion {
    pub id: &'static str,
    pub text: &'static str,
    pub allow_multiple: bool,
    pub options: Vec<ChoiceOption>,
}

impl SubQuestion {
    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Highest single-option weight, used as the sub-question's ceiling.
    pub fn max_points(&self) -> u32 {
        self.options
            .iter()
            .map(|option| option.points)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub id: &'static str,
    pub topic: EsgTopic,
    pub title: &'static str,
    pub sub_questions: Vec<SubQuestion>,
}

impl Indicator {
    pub fn sub_question(&self, sub_question_id: &str) -> Option<&SubQuestion> {
        self.sub_questions
            .iter()
            .find(|sub_question| sub_question.id == sub_question_id)
    }
}

/// One row of the fixed quantitative KPI table.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceIndicator {
    pub no: u32,
    pub category: &'static str,
    pub unit: &'static str,
    pub notes: &'static str,
}

/// Free-form yearly figures keyed by KPI category, then year.
pub type PerformanceData = BTreeMap<String, BTreeMap<String, String>>;

/// One year's entries for a quantitative series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitativeRow {
    pub year: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

/// Quantitative series keyed by indicator id, then sub-question id.
pub type QuantitativeData = BTreeMap<String, BTreeMap<String, Vec<QuantitativeRow>>>;

/// Normalized 0-5 scores for the three topics plus their average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "G")]
    pub g: f64,
    pub overall: f64,
}

impl ScoreCard {
    pub fn topic(&self, topic: EsgTopic) -> f64 {
        match topic {
            EsgTopic::E => self.e,
            EsgTopic::S => self.s,
            EsgTopic::G => self.g,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalysis {
    pub current_status: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    #[serde(rename = "E")]
    pub e: TopicAnalysis,
    #[serde(rename = "S")]
    pub s: TopicAnalysis,
    #[serde(rename = "G")]
    pub g: TopicAnalysis,
}

impl DetailedAnalysis {
    pub fn topic(&self, topic: EsgTopic) -> &TopicAnalysis {
        match topic {
            EsgTopic::E => &self.e,
            EsgTopic::S => &self.s,
            EsgTopic::G => &self.g,
        }
    }
}

/// Narrative sections attached to a result once generation succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSuggestions {
    pub overall_summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub detailed_analysis: DetailedAnalysis,
}

/// The single persisted record of a completed questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub id: String,
    pub company_name: String,
    pub date: String,
    pub scores: ScoreCard,
    pub suggestions: Option<ReportSuggestions>,
    pub answers: super::answers::AnswerSet,
    #[serde(default)]
    pub quantitative_data: QuantitativeData,
    #[serde(default)]
    pub performance_data: PerformanceData,
}

/// Daily usage counter persisted alongside the result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub count: u32,
}
