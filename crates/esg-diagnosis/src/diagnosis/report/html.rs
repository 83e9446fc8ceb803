use super::views::ReportView;
use crate::diagnosis::catalog::IndicatorCatalog;
use crate::diagnosis::domain::{DiagnosisResult, EsgTopic};
use std::fmt::Write;

/// Render the report as one self-contained HTML document.
///
/// All styles are inlined and nothing is fetched at view time, so the
/// exported file stands alone as a downloadable snapshot.
pub fn render_document(catalog: &IndicatorCatalog, result: &DiagnosisResult) -> String {
    let view = ReportView::from_result(catalog, result);
    let company = escape(&view.company_name);

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{company} ESG Diagnosis Report</title>\n<style>{}</style>\n</head>\n<body>\n<main>\n",
        STYLES
    );

    let _ = write!(
        html,
        "<header>\n<h1>{company} ESG Diagnosis Report</h1>\n<p class=\"date\">Assessed on {}</p>\n\
         <p class=\"overall\">Overall score <strong>{:.1}</strong> / 5.0</p>\n</header>\n",
        escape(&view.date),
        view.overall
    );

    html.push_str("<section>\n<h2>Topic scores</h2>\n");
    for entry in &view.scores {
        let percentage = entry.score / 5.0 * 100.0;
        let _ = write!(
            html,
            "<div class=\"score\">\n<div class=\"score-head\"><span class=\"{css}\">{label}</span>\
             <span>{score:.1} / 5.0</span></div>\n\
             <div class=\"bar\"><div class=\"bar-fill {css}-bg\" style=\"width:{percentage:.0}%\"></div></div>\n</div>\n",
            css = topic_class(entry.topic),
            label = entry.label,
            score = entry.score,
        );
    }
    html.push_str("</section>\n");

    match &view.suggestions {
        Some(suggestions) => {
            let _ = write!(
                html,
                "<section>\n<h2>Overall strategy</h2>\n<p>{}</p>\n</section>\n",
                escape(&suggestions.overall_summary)
            );

            html.push_str("<section>\n<h2>Key strengths</h2>\n<ul>\n");
            for strength in &suggestions.strengths {
                let _ = writeln!(html, "<li>{}</li>", escape(strength));
            }
            html.push_str("</ul>\n<h2>Areas to improve</h2>\n<ul>\n");
            for weakness in &suggestions.weaknesses {
                let _ = writeln!(html, "<li>{}</li>", escape(weakness));
            }
            html.push_str("</ul>\n</section>\n");

            html.push_str("<section>\n<h2>Detailed analysis</h2>\n");
            for topic in EsgTopic::ordered() {
                let analysis = suggestions.detailed_analysis.topic(topic);
                let _ = write!(
                    html,
                    "<h3 class=\"{}\">{}</h3>\n<p>{}</p>\n<ul>\n",
                    topic_class(topic),
                    topic.label(),
                    escape(&analysis.current_status)
                );
                for recommendation in &analysis.recommendations {
                    let _ = writeln!(html, "<li>{}</li>", escape(recommendation));
                }
                html.push_str("</ul>\n");
            }
            html.push_str("</section>\n");
        }
        None => {
            html.push_str(
                "<section>\n<h2>Narrative</h2>\n<p class=\"pending\">The narrative analysis \
                 has not been generated for this result yet.</p>\n</section>\n",
            );
        }
    }

    if !view.performance.rows.is_empty() {
        html.push_str("<section>\n<h2>Key performance data</h2>\n<table>\n<thead>\n<tr><th>Category</th><th>Unit</th>");
        for year in &view.performance.years {
            let _ = write!(html, "<th>{}</th>", escape(year));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &view.performance.rows {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td>",
                escape(&row.category),
                escape(&row.unit)
            );
            for value in &row.values {
                let _ = write!(
                    html,
                    "<td>{}</td>",
                    value.as_deref().map(escape).unwrap_or_else(|| "-".to_string())
                );
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</section>\n");
    }

    if !view.answers.is_empty() {
        html.push_str("<section>\n<h2>Answer details</h2>\n");
        for detail in &view.answers {
            let _ = write!(
                html,
                "<div class=\"answer\">\n<p class=\"answer-title\"><span class=\"tag {}\">{}</span> {}</p>\n",
                topic_class(detail.topic),
                detail.indicator_id,
                detail.title
            );
            for entry in &detail.entries {
                let _ = writeln!(
                    html,
                    "<p class=\"answer-line\">{}<br><em>{}</em></p>",
                    entry.question,
                    entry.selected.join(", ")
                );
            }
            html.push_str("</div>\n");
        }
        html.push_str("</section>\n");
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn topic_class(topic: EsgTopic) -> &'static str {
    match topic {
        EsgTopic::E => "topic-e",
        EsgTopic::S => "topic-s",
        EsgTopic::G => "topic-g",
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const STYLES: &str = "\
body{font-family:'Segoe UI',Helvetica,Arial,sans-serif;background:#0f172a;color:#cbd5e1;margin:0}\
main{max-width:56rem;margin:0 auto;padding:2rem 1rem}\
header{border-bottom:1px solid #334155;padding-bottom:1rem;margin-bottom:1.5rem}\
h1{color:#f1f5f9;font-size:1.8rem;margin:0 0 .25rem}\
h2{color:#f1f5f9;font-size:1.25rem;margin:1.5rem 0 .75rem}\
h3{font-size:1.05rem;margin:1.25rem 0 .5rem}\
.date{color:#94a3b8;margin:0}\
.overall{font-size:1.1rem}\
.score{margin:.6rem 0}\
.score-head{display:flex;justify-content:space-between;font-weight:600;margin-bottom:.25rem}\
.bar{background:#334155;border-radius:9999px;height:.6rem}\
.bar-fill{height:.6rem;border-radius:9999px}\
.topic-e{color:#4ade80}.topic-s{color:#38bdf8}.topic-g{color:#fbbf24}\
.topic-e-bg{background:#22c55e}.topic-s-bg{background:#0ea5e9}.topic-g-bg{background:#f59e0b}\
.pending{color:#94a3b8;font-style:italic}\
table{border-collapse:collapse;width:100%;font-size:.9rem}\
th,td{border:1px solid #334155;padding:.4rem .6rem;text-align:left}\
th{background:#1e293b;color:#f1f5f9}\
.answer{border:1px solid #334155;border-radius:.5rem;padding:.75rem 1rem;margin:.6rem 0;background:#1e293b}\
.answer-title{font-weight:700;color:#e2e8f0;margin:0 0 .4rem}\
.answer-line{margin:.25rem 0 .25rem 1rem;color:#94a3b8}\
.answer-line em{color:#e2e8f0;font-style:normal}\
.tag{display:inline-block;padding:.1rem .5rem;border:1px solid currentColor;border-radius:9999px;font-size:.8rem;margin-right:.4rem}\
ul{margin:.4rem 0;padding-left:1.4rem}li{margin:.3rem 0}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::answers::AnswerSet;
    use crate::diagnosis::domain::ScoreCard;
    use crate::narrative::StaticNarrator;

    fn sample_result(catalog: &IndicatorCatalog) -> DiagnosisResult {
        let mut answers = AnswerSet::new();
        answers
            .toggle(catalog, "E01", "Q1", "opt1")
            .expect("yes toggles");

        DiagnosisResult {
            id: "2025-06-02T10:00:00+00:00".to_string(),
            company_name: "Kim & Lee <Textiles>".to_string(),
            date: "2025-06-02".to_string(),
            scores: ScoreCard {
                e: 2.5,
                s: 3.0,
                g: 1.0,
                overall: 6.5 / 3.0,
            },
            suggestions: None,
            answers,
            quantitative_data: Default::default(),
            performance_data: Default::default(),
        }
    }

    #[test]
    fn document_is_self_contained_and_escapes_user_input() {
        let catalog = IndicatorCatalog::standard();
        let html = render_document(&catalog, &sample_result(&catalog));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Kim &amp; Lee &lt;Textiles&gt;"));
        assert!(html.contains("<style>"));
        assert!(!html.contains("<script"), "no external or inline scripts");
        assert!(!html.contains("http://") && !html.contains("https://"));
    }

    #[test]
    fn pending_narrative_renders_a_placeholder() {
        let catalog = IndicatorCatalog::standard();
        let html = render_document(&catalog, &sample_result(&catalog));

        assert!(html.contains("has not been generated"));
    }

    #[test]
    fn generated_narrative_sections_are_included() {
        let catalog = IndicatorCatalog::standard();
        let mut result = sample_result(&catalog);
        result.suggestions = Some(StaticNarrator.generate(&result));

        let html = render_document(&catalog, &result);
        assert!(html.contains("Overall strategy"));
        assert!(html.contains("Detailed analysis"));
        assert!(html.contains("Key strengths"));
    }
}
