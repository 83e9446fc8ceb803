use crate::diagnosis::IndicatorCatalog;
use crate::diagnosis::domain::{DiagnosisResult, EsgTopic};
use std::fmt::Write;

/// Render the consultant prompt: score summary plus a per-topic digest of
/// the selected answers.
pub(crate) fn render(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a senior ESG management consultant for small and medium-sized businesses."
    );
    let _ = writeln!(
        prompt,
        "Using the self-assessment below, write a detailed, professional diagnosis report structured as a SWOT-style analysis."
    );

    let _ = writeln!(prompt, "\n[Assessment summary]");
    let _ = writeln!(prompt, "- Company: {}", result.company_name);
    let _ = writeln!(
        prompt,
        "- Overall ESG score: {:.1}/5.0",
        result.scores.overall
    );
    for topic in EsgTopic::ordered() {
        let _ = writeln!(
            prompt,
            "- {} ({:?}) score: {:.1}/5.0",
            topic.label(),
            topic,
            result.scores.topic(topic)
        );
    }

    let _ = write!(prompt, "{}", answer_digest(catalog, result));

    let _ = writeln!(prompt, "\n[Report instructions]");
    let _ = writeln!(
        prompt,
        "1. Overall summary: assess the company's current ESG maturity and name the most important strategic direction in one or two paragraphs."
    );
    let _ = writeln!(
        prompt,
        "2. Strengths: call out the two or three ESG activities the company handles best."
    );
    let _ = writeln!(
        prompt,
        "3. Weaknesses: point at the two or three gaps that need the most urgent attention or carry the largest risk."
    );
    let _ = writeln!(
        prompt,
        "4. Detailed analysis: for each of E, S, and G, describe the current status objectively and give two or three concrete, actionable recommendations covering what to do and how."
    );
    let _ = writeln!(
        prompt,
        "Respond as JSON matching the provided response schema."
    );

    prompt
}

/// Per-topic listing of answered indicators with the selected option texts.
fn answer_digest(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> String {
    let mut digest = String::new();

    for topic in EsgTopic::ordered() {
        let mut lines = String::new();

        for (indicator_id, questions) in result.answers.iter() {
            let Some(indicator) = catalog.find(indicator_id) else {
                continue;
            };
            if indicator.topic != topic {
                continue;
            }

            let mut entries = String::new();
            for (sub_question_id, option_ids) in questions {
                let Some(sub_question) = indicator.sub_question(sub_question_id) else {
                    continue;
                };
                if option_ids.is_empty() {
                    continue;
                }
                let texts: Vec<&str> = option_ids
                    .iter()
                    .filter_map(|option_id| sub_question.option(option_id))
                    .map(|option| option.text)
                    .collect();
                if texts.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    entries,
                    "  - {} {}",
                    sub_question.text,
                    texts.join(", ")
                );
            }

            if !entries.is_empty() {
                let _ = writeln!(lines, "- {}:", indicator.title);
                lines.push_str(&entries);
            }
        }

        if !lines.is_empty() {
            let _ = writeln!(digest, "\n[{} answers]", topic.label());
            digest.push_str(&lines);
        }
    }

    digest
}
