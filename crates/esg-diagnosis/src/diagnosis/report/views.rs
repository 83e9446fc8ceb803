use crate::diagnosis::catalog::IndicatorCatalog;
use crate::diagnosis::domain::{DiagnosisResult, EsgTopic, ReportSuggestions};
use serde::Serialize;
use std::collections::BTreeSet;

/// One topic's normalized score with its display label.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntry {
    pub topic: EsgTopic,
    pub label: &'static str,
    pub score: f64,
}

/// One answered sub-question resolved to display texts.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerEntryView {
    pub question: &'static str,
    pub selected: Vec<&'static str>,
}

/// Answer detail for one indicator, resolved against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerDetailView {
    pub indicator_id: &'static str,
    pub topic: EsgTopic,
    pub title: &'static str,
    pub entries: Vec<AnswerEntryView>,
}

/// One KPI row with its unit and per-year values.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceRowView {
    pub category: String,
    pub unit: String,
    pub values: Vec<Option<String>>,
}

/// Year columns plus rows, ready for tabular rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceTableView {
    pub years: Vec<String>,
    pub rows: Vec<PerformanceRowView>,
}

/// Flattened view of one diagnosis result for rendering and export.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub company_name: String,
    pub date: String,
    pub overall: f64,
    pub scores: Vec<ScoreEntry>,
    pub suggestions: Option<ReportSuggestions>,
    pub answers: Vec<AnswerDetailView>,
    pub performance: PerformanceTableView,
}

impl ReportView {
    pub fn from_result(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> Self {
        let scores = EsgTopic::ordered()
            .into_iter()
            .map(|topic| ScoreEntry {
                topic,
                label: topic.label(),
                score: result.scores.topic(topic),
            })
            .collect();

        Self {
            company_name: result.company_name.clone(),
            date: result.date.clone(),
            overall: result.scores.overall,
            scores,
            suggestions: result.suggestions.clone(),
            answers: answer_details(catalog, result),
            performance: performance_table(catalog, result),
        }
    }
}

/// Answered indicators in catalog order with their selected option texts.
fn answer_details(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> Vec<AnswerDetailView> {
    let mut details = Vec::new();

    for indicator in catalog.indicators() {
        let mut entries = Vec::new();
        for sub_question in &indicator.sub_questions {
            let selected: Vec<&'static str> = result
                .answers
                .selected(indicator.id, sub_question.id)
                .iter()
                .filter_map(|option_id| sub_question.option(option_id))
                .map(|option| option.text)
                .collect();
            if !selected.is_empty() {
                entries.push(AnswerEntryView {
                    question: sub_question.text,
                    selected,
                });
            }
        }
        if !entries.is_empty() {
            details.push(AnswerDetailView {
                indicator_id: indicator.id,
                topic: indicator.topic,
                title: indicator.title,
                entries,
            });
        }
    }

    details
}

/// KPI table in catalog order; categories the catalog does not define are
/// appended after the known rows.
fn performance_table(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> PerformanceTableView {
    let data = &result.performance_data;
    if data.is_empty() {
        return PerformanceTableView::default();
    }

    let mut years: BTreeSet<&String> = BTreeSet::new();
    for by_year in data.values() {
        years.extend(by_year.keys());
    }
    // Most recent year first.
    let years: Vec<String> = years.into_iter().rev().cloned().collect();

    let mut rows = Vec::new();
    let mut push_row = |category: &str, unit: String| {
        if let Some(by_year) = data.get(category) {
            rows.push(PerformanceRowView {
                category: category.to_string(),
                unit,
                values: years
                    .iter()
                    .map(|year| by_year.get(year).cloned().filter(|value| !value.is_empty()))
                    .collect(),
            });
        }
    };

    for indicator in catalog.performance_indicators() {
        push_row(indicator.category, indicator.unit.to_string());
    }
    for category in data.keys() {
        if catalog.performance_category(category).is_none() {
            push_row(category, String::new());
        }
    }

    PerformanceTableView { years, rows }
}
