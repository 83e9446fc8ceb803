use crate::diagnosis::domain::{
    DetailedAnalysis, DiagnosisResult, EsgTopic, ReportSuggestions, TopicAnalysis,
};

/// Canned narrative generator used when no API key is configured.
///
/// Deterministic: the sections are derived from the score bands alone, so
/// the offline flow and the CLI demo produce stable reports.
pub struct StaticNarrator;

impl StaticNarrator {
    pub fn generate(&self, result: &DiagnosisResult) -> ReportSuggestions {
        let mut ranked: Vec<(EsgTopic, f64)> = EsgTopic::ordered()
            .into_iter()
            .map(|topic| (topic, result.scores.topic(topic)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let strengths = ranked
            .iter()
            .take(2)
            .map(|(topic, score)| {
                format!(
                    "{} is the company's most established area at {score:.1}/5.0; the practices already in place there can anchor a broader ESG program.",
                    topic.label()
                )
            })
            .collect();

        let weaknesses = ranked
            .iter()
            .rev()
            .take(2)
            .map(|(topic, score)| {
                format!(
                    "{} trails at {score:.1}/5.0 and carries the largest near-term risk; the recommendations below start there.",
                    topic.label()
                )
            })
            .collect();

        ReportSuggestions {
            overall_summary: overall_summary(result),
            strengths,
            weaknesses,
            detailed_analysis: DetailedAnalysis {
                e: topic_analysis(EsgTopic::E, result.scores.e),
                s: topic_analysis(EsgTopic::S, result.scores.s),
                g: topic_analysis(EsgTopic::G, result.scores.g),
            },
        }
    }
}

fn overall_summary(result: &DiagnosisResult) -> String {
    let overall = result.scores.overall;
    let maturity = if overall >= 4.0 {
        "an advanced ESG posture with most foundational practices in place"
    } else if overall >= 2.5 {
        "a developing ESG posture with a workable foundation and clear gaps"
    } else {
        "an early-stage ESG posture where foundational practices are still being established"
    };

    format!(
        "{} scored {overall:.1}/5.0 overall, which indicates {maturity}. \
         The most effective next step is to formalize what already works into written policy, \
         assign an accountable owner for each topic, and close the lowest-scoring gaps first \
         so progress is visible within one or two quarters.",
        result.company_name
    )
}

fn topic_analysis(topic: EsgTopic, score: f64) -> TopicAnalysis {
    let band = if score >= 4.0 {
        "Most practices in this area are in place and operating; the remaining work is documentation and periodic review."
    } else if score >= 2.5 {
        "Some practices are in place but coverage is partial; the gaps are specific and addressable within a quarter."
    } else {
        "Few practices are in place yet; this area needs foundational work before any reporting or certification effort."
    };

    TopicAnalysis {
        current_status: format!("{} scored {score:.1}/5.0. {band}", topic.label()),
        recommendations: recommendations(topic),
    }
}

fn recommendations(topic: EsgTopic) -> Vec<String> {
    let items: [&str; 3] = match topic {
        EsgTopic::E => [
            "Measure Scope 1 and Scope 2 greenhouse gas emissions annually and fix a baseline year for reduction targets.",
            "Put energy use on a monthly monitoring routine and prioritize high-efficiency replacements where payback is under three years.",
            "Formalize waste segregation and set a recycling-rate target reviewed each quarter.",
        ],
        EsgTopic::S => [
            "Document the occupational safety and health management system and assign a named accountable owner.",
            "Run recurring safety and workplace training for all employees with attendance records kept.",
            "Screen key suppliers for ESG risk with a short annual questionnaire and track follow-ups.",
        ],
        EsgTopic::G => [
            "Publish a code of ethics and collect yearly acknowledgements from every officer and employee.",
            "Put ESG on the board agenda at a fixed cadence with a one-page status report.",
            "Disclose key ESG activities and figures on the company website once a year.",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}
