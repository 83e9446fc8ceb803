use super::catalog::IndicatorCatalog;
use super::domain::SubQuestion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raised when a toggle refers to ids the catalog does not define.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),
    #[error("unknown sub-question '{sub_question}' for indicator '{indicator}'")]
    UnknownSubQuestion {
        indicator: String,
        sub_question: String,
    },
    #[error("unknown option '{option}' for sub-question '{sub_question}' of indicator '{indicator}'")]
    UnknownOption {
        indicator: String,
        sub_question: String,
        option: String,
    },
}

/// Incrementally built selection state: indicator id -> sub-question id ->
/// selected option ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    selections: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Selected option ids for one sub-question; missing entries read as
    /// an empty selection.
    pub fn selected(&self, indicator_id: &str, sub_question_id: &str) -> &[String] {
        self.selections
            .get(indicator_id)
            .and_then(|questions| questions.get(sub_question_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&String, &BTreeMap<String, Vec<String>>)> {
        self.selections.iter()
    }

    /// Apply one selection toggle, enforcing the exclusivity rule.
    ///
    /// Single-choice sub-questions always replace the current selection.
    /// For multi-select sub-questions, picking an exclusive option clears
    /// everything else (or clears itself when already selected), and
    /// picking a regular option evicts any selected exclusive one before
    /// toggling.
    pub fn toggle(
        &mut self,
        catalog: &IndicatorCatalog,
        indicator_id: &str,
        sub_question_id: &str,
        option_id: &str,
    ) -> Result<&[String], AnswerError> {
        let indicator = catalog
            .find(indicator_id)
            .ok_or_else(|| AnswerError::UnknownIndicator(indicator_id.to_string()))?;
        let sub_question = indicator.sub_question(sub_question_id).ok_or_else(|| {
            AnswerError::UnknownSubQuestion {
                indicator: indicator_id.to_string(),
                sub_question: sub_question_id.to_string(),
            }
        })?;
        let option = sub_question
            .option(option_id)
            .ok_or_else(|| AnswerError::UnknownOption {
                indicator: indicator_id.to_string(),
                sub_question: sub_question_id.to_string(),
                option: option_id.to_string(),
            })?;

        let selection = self
            .selections
            .entry(indicator_id.to_string())
            .or_default()
            .entry(sub_question_id.to_string())
            .or_default();

        if !sub_question.allow_multiple {
            selection.clear();
            selection.push(option_id.to_string());
        } else if option.exclusive {
            let was_selected = selection.iter().any(|id| id == option_id);
            selection.clear();
            if !was_selected {
                selection.push(option_id.to_string());
            }
        } else {
            selection.retain(|id| !is_exclusive(sub_question, id));
            if let Some(position) = selection.iter().position(|id| id == option_id) {
                selection.remove(position);
            } else {
                selection.push(option_id.to_string());
            }
        }

        Ok(self.selected(indicator_id, sub_question_id))
    }
}

fn is_exclusive(sub_question: &SubQuestion, option_id: &str) -> bool {
    sub_question
        .option(option_id)
        .map(|option| option.exclusive)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::domain::{ChoiceOption, EsgTopic, Indicator};

    fn multi_select_catalog() -> IndicatorCatalog {
        let indicator = Indicator {
            id: "E01",
            topic: EsgTopic::E,
            title: "Test indicator",
            sub_questions: vec![SubQuestion {
                id: "Q1",
                text: "Pick any that apply",
                allow_multiple: true,
                options: vec![
                    ChoiceOption {
                        id: "a",
                        text: "Option A",
                        points: 2,
                        exclusive: false,
                    },
                    ChoiceOption {
                        id: "b",
                        text: "Option B",
                        points: 1,
                        exclusive: false,
                    },
                    ChoiceOption {
                        id: "none",
                        text: "None of the above",
                        points: 0,
                        exclusive: true,
                    },
                ],
            }],
        };
        IndicatorCatalog::with_indicators(vec![indicator])
    }

    #[test]
    fn single_choice_replaces_previous_selection() {
        let catalog = IndicatorCatalog::standard();
        let mut answers = AnswerSet::new();

        answers
            .toggle(&catalog, "E01", "Q1", "opt1")
            .expect("yes toggles");
        answers
            .toggle(&catalog, "E01", "Q1", "opt2")
            .expect("no toggles");

        assert_eq!(answers.selected("E01", "Q1"), ["opt2".to_string()]);
    }

    #[test]
    fn exclusive_option_clears_other_selections() {
        let catalog = multi_select_catalog();
        let mut answers = AnswerSet::new();

        answers.toggle(&catalog, "E01", "Q1", "a").expect("a toggles");
        answers.toggle(&catalog, "E01", "Q1", "b").expect("b toggles");
        answers
            .toggle(&catalog, "E01", "Q1", "none")
            .expect("exclusive toggles");

        assert_eq!(answers.selected("E01", "Q1"), ["none".to_string()]);
    }

    #[test]
    fn regular_option_evicts_selected_exclusive_option() {
        let catalog = multi_select_catalog();
        let mut answers = AnswerSet::new();

        answers
            .toggle(&catalog, "E01", "Q1", "none")
            .expect("exclusive toggles");
        answers.toggle(&catalog, "E01", "Q1", "a").expect("a toggles");

        assert_eq!(answers.selected("E01", "Q1"), ["a".to_string()]);
    }

    #[test]
    fn toggling_selected_options_deselects_them() {
        let catalog = multi_select_catalog();
        let mut answers = AnswerSet::new();

        answers.toggle(&catalog, "E01", "Q1", "a").expect("a toggles");
        answers.toggle(&catalog, "E01", "Q1", "a").expect("a untoggles");
        assert!(answers.selected("E01", "Q1").is_empty());

        answers
            .toggle(&catalog, "E01", "Q1", "none")
            .expect("exclusive toggles");
        answers
            .toggle(&catalog, "E01", "Q1", "none")
            .expect("exclusive untoggles");
        assert!(answers.selected("E01", "Q1").is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let catalog = IndicatorCatalog::standard();
        let mut answers = AnswerSet::new();

        assert!(matches!(
            answers.toggle(&catalog, "X99", "Q1", "opt1"),
            Err(AnswerError::UnknownIndicator(_))
        ));
        assert!(matches!(
            answers.toggle(&catalog, "E01", "Q9", "opt1"),
            Err(AnswerError::UnknownSubQuestion { .. })
        ));
        assert!(matches!(
            answers.toggle(&catalog, "E01", "Q1", "opt9"),
            Err(AnswerError::UnknownOption { .. })
        ));
        assert!(answers.is_empty());
    }
}
