use crate::infra::InMemoryStore;
use chrono::Local;
use clap::Args;
use esg_diagnosis::diagnosis::answers::AnswerSet;
use esg_diagnosis::diagnosis::domain::{DiagnosisResult, EsgTopic};
use esg_diagnosis::diagnosis::performance::PerformanceCsvImporter;
use esg_diagnosis::diagnosis::report::{self, ReportView};
use esg_diagnosis::diagnosis::{score, DiagnosisService, IndicatorCatalog};
use esg_diagnosis::error::AppError;
use esg_diagnosis::narrative::{Narrator, StaticNarrator};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Company name used on the generated report
    #[arg(long, default_value = "Sample Manufacturing Co.")]
    pub(crate) company: String,
    /// Indicator ids to answer "No" instead of "Yes" (repeatable)
    #[arg(long = "answer-no")]
    pub(crate) answer_no: Vec<String>,
    /// Optional performance CSV (category,year,value rows) to import
    #[arg(long)]
    pub(crate) performance_csv: Option<PathBuf>,
    /// Write the standalone HTML report to this path
    #[arg(long)]
    pub(crate) export_html: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Answers JSON file: indicator id -> sub-question id -> option ids
    #[arg(long)]
    pub(crate) answers: PathBuf,
}

/// Scripted end-to-end run against in-memory stores with the canned
/// narrative generator, mirroring what the HTTP flow does.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        company,
        answer_no,
        performance_csv,
        export_html,
    } = args;

    let catalog = Arc::new(IndicatorCatalog::standard());
    let store = Arc::new(InMemoryStore::default());
    let service = Arc::new(Mutex::new(DiagnosisService::new(
        catalog.clone(),
        store.clone(),
        store,
    )));
    let narrator = Narrator::Static(StaticNarrator);

    let today = Local::now().date_naive();
    println!("ESG diagnosis demo");

    {
        let mut service = service.lock().expect("service mutex poisoned");
        let usage = service.start_session(today)?;
        println!(
            "Session started ({} of {} daily sessions used)",
            usage.count, usage.limit
        );

        for indicator in catalog.indicators() {
            let flip = answer_no.iter().any(|id| id == indicator.id);
            for sub_question in &indicator.sub_questions {
                let pick = if flip {
                    sub_question.options.iter().min_by_key(|option| option.points)
                } else {
                    sub_question.options.iter().max_by_key(|option| option.points)
                };
                if let Some(option) = pick {
                    service.record_answer(indicator.id, sub_question.id, option.id)?;
                }
            }
        }

        if let Some(path) = performance_csv {
            let import = PerformanceCsvImporter::from_path(&path, &catalog)?;
            for category in &import.unknown_categories {
                println!("warning: CSV category '{category}' is not in the KPI catalog");
            }
            println!(
                "Imported performance data for {} categories from {}",
                import.data.len(),
                path.display()
            );
            service.set_performance_data(import.data)?;
        }
    }

    let partial = {
        let mut service = service.lock().expect("service mutex poisoned");
        service.finalize(&company, Local::now())?;
        service
            .begin_narrative()?
            .expect("freshly finalized result has no suggestions")
    };

    let outcome = narrator.generate(&catalog, &partial).await;
    let result = {
        let mut service = service.lock().expect("service mutex poisoned");
        service.complete_narrative(outcome)?
    };

    render_result(&catalog, &result);

    if let Some(path) = export_html {
        let html = report::render_document(&catalog, &result);
        std::fs::write(&path, html)?;
        println!("\nHTML report written to {}", path.display());
    }

    Ok(())
}

/// Score an answers file without touching any stored state.
pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.answers)?;
    let answers: AnswerSet = serde_json::from_str(&raw)?;

    let catalog = IndicatorCatalog::standard();
    let breakdown = score(&catalog, &answers);
    let card = breakdown.card();

    println!("Scores for {}", args.answers.display());
    for topic in EsgTopic::ordered() {
        let topic_score = breakdown.topic(topic);
        println!(
            "- {}: {:.1} / 5.0 ({} of {} points)",
            topic.label(),
            card.topic(topic),
            topic_score.total_points,
            topic_score.max_points
        );
    }
    println!("- Overall: {:.1} / 5.0", card.overall);

    Ok(())
}

fn render_result(catalog: &IndicatorCatalog, result: &DiagnosisResult) {
    let view = ReportView::from_result(catalog, result);

    println!("\n{} — assessed {}", view.company_name, view.date);
    println!("Overall score: {:.1} / 5.0", view.overall);
    for entry in &view.scores {
        println!("- {}: {:.1} / 5.0", entry.label, entry.score);
    }

    let Some(suggestions) = &view.suggestions else {
        println!("\nNo narrative attached.");
        return;
    };

    println!("\nOverall strategy");
    println!("{}", suggestions.overall_summary);

    println!("\nKey strengths");
    for strength in &suggestions.strengths {
        println!("- {strength}");
    }

    println!("\nAreas to improve");
    for weakness in &suggestions.weaknesses {
        println!("- {weakness}");
    }

    println!("\nDetailed analysis");
    for topic in EsgTopic::ordered() {
        let analysis = suggestions.detailed_analysis.topic(topic);
        println!("\n[{}]", topic.label());
        println!("{}", analysis.current_status);
        for recommendation in &analysis.recommendations {
            println!("- {recommendation}");
        }
    }

    if !view.performance.rows.is_empty() {
        println!("\nKey performance data ({} rows)", view.performance.rows.len());
        for row in &view.performance.rows {
            let values: Vec<String> = view
                .performance
                .years
                .iter()
                .zip(&row.values)
                .map(|(year, value)| {
                    format!("{year}: {}", value.as_deref().unwrap_or("-"))
                })
                .collect();
            println!("- {} ({}): {}", row.category, row.unit, values.join(", "));
        }
    }
}
