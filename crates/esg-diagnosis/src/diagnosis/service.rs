use super::answers::{AnswerError, AnswerSet};
use super::catalog::IndicatorCatalog;
use super::domain::{DiagnosisResult, PerformanceData, QuantitativeData, ReportSuggestions};
use super::flow::{FlowController, FlowError, Screen};
use super::repository::ResultRepository;
use super::scoring;
use super::usage::{UsageLimiter, UsageSnapshot};
use crate::narrative::NarrativeError;
use chrono::{DateTime, Local, NaiveDate};
use std::sync::Arc;
use tracing::warn;

/// Error raised by the diagnosis session service.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("the daily limit of {limit} diagnosis sessions has been reached")]
    DailyLimitReached { limit: u32 },
    #[error("a company name is required to finalize the diagnosis")]
    CompanyNameRequired,
    #[error("no diagnosis result is available")]
    NoActiveResult,
    #[error("narrative generation is already in progress")]
    NarrativeInFlight,
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

/// Session service composing the catalog, usage limiter, and result slot.
///
/// One instance owns one logical session: the screen flow, the selection
/// state being built, and the current result. Persistence is best-effort
/// throughout; storage failures are logged and the in-memory state stays
/// authoritative.
pub struct DiagnosisService<R, U> {
    catalog: Arc<IndicatorCatalog>,
    results: Arc<R>,
    limiter: UsageLimiter<U>,
    flow: FlowController,
    answers: AnswerSet,
    performance: PerformanceData,
    quantitative: QuantitativeData,
    current: Option<DiagnosisResult>,
    narrative_in_flight: bool,
}

impl<R, U> DiagnosisService<R, U>
where
    R: ResultRepository + 'static,
    U: super::repository::UsageRepository + 'static,
{
    pub fn new(catalog: Arc<IndicatorCatalog>, results: Arc<R>, usage: Arc<U>) -> Self {
        Self::with_limiter(catalog, results, UsageLimiter::new(usage))
    }

    pub fn with_limiter(
        catalog: Arc<IndicatorCatalog>,
        results: Arc<R>,
        limiter: UsageLimiter<U>,
    ) -> Self {
        Self {
            catalog,
            results,
            limiter,
            flow: FlowController::default(),
            answers: AnswerSet::new(),
            performance: PerformanceData::new(),
            quantitative: QuantitativeData::new(),
            current: None,
            narrative_in_flight: false,
        }
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    pub fn usage(&self, today: NaiveDate) -> UsageSnapshot {
        self.limiter.snapshot(today)
    }

    pub fn current_result(&self) -> Option<&DiagnosisResult> {
        self.current.as_ref()
    }

    /// Start a new session: consumes one usage slot and fails closed when
    /// the daily cap is hit, without mutating any state.
    pub fn start_session(&mut self, today: NaiveDate) -> Result<UsageSnapshot, DiagnosisError> {
        if self.flow.screen() != Screen::Landing {
            return Err(FlowError {
                action: "start a diagnosis",
                from: self.flow.screen().label(),
            }
            .into());
        }
        if self.limiter.is_limit_reached(today) {
            return Err(DiagnosisError::DailyLimitReached {
                limit: self.limiter.limit(),
            });
        }

        if let Err(err) = self.limiter.increment(today) {
            warn!(%err, "failed to persist usage increment");
        }

        self.reset_session();
        self.flow.start()?;
        Ok(self.limiter.snapshot(today))
    }

    /// Apply one selection toggle; only valid on the diagnosis screen.
    pub fn record_answer(
        &mut self,
        indicator_id: &str,
        sub_question_id: &str,
        option_id: &str,
    ) -> Result<Vec<String>, DiagnosisError> {
        self.require_screen(Screen::Diagnosis, "record an answer")?;
        let selection =
            self.answers
                .toggle(&self.catalog, indicator_id, sub_question_id, option_id)?;
        Ok(selection.to_vec())
    }

    pub fn set_performance_data(&mut self, data: PerformanceData) -> Result<(), DiagnosisError> {
        self.require_screen(Screen::Diagnosis, "enter performance data")?;
        self.performance = data;
        Ok(())
    }

    pub fn set_quantitative_data(&mut self, data: QuantitativeData) -> Result<(), DiagnosisError> {
        self.require_screen(Screen::Diagnosis, "enter quantitative data")?;
        self.quantitative = data;
        Ok(())
    }

    /// Score the session and build the result with no narrative attached.
    ///
    /// The partial result is persisted before this returns so a later
    /// narrative failure cannot lose the answers.
    pub fn finalize(
        &mut self,
        company_name: &str,
        now: DateTime<Local>,
    ) -> Result<DiagnosisResult, DiagnosisError> {
        self.require_screen(Screen::Diagnosis, "finalize the diagnosis")?;

        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(DiagnosisError::CompanyNameRequired);
        }

        let scores = scoring::score(&self.catalog, &self.answers).card();
        let result = DiagnosisResult {
            id: now.to_rfc3339(),
            company_name: company_name.to_string(),
            date: now.date_naive().format("%Y-%m-%d").to_string(),
            scores,
            suggestions: None,
            answers: self.answers.clone(),
            quantitative_data: self.quantitative.clone(),
            performance_data: self.performance.clone(),
        };

        if let Err(err) = self.results.save(&result) {
            warn!(%err, "failed to persist diagnosis result");
        }

        self.flow.complete()?;
        self.current = Some(result.clone());
        self.narrative_in_flight = false;
        Ok(result)
    }

    /// First half of the narrative obligation: re-persist the partial
    /// result and hand out a snapshot for the generator to work on.
    ///
    /// Returns `None` when the current result already carries suggestions,
    /// so overlapping triggers cannot double-call the generator.
    pub fn begin_narrative(&mut self) -> Result<Option<DiagnosisResult>, DiagnosisError> {
        let result = self.current.as_ref().ok_or(DiagnosisError::NoActiveResult)?;
        if result.suggestions.is_some() {
            return Ok(None);
        }
        if self.narrative_in_flight {
            return Err(DiagnosisError::NarrativeInFlight);
        }

        if let Err(err) = self.results.save(result) {
            warn!(%err, "failed to persist partial result before narrative generation");
        }

        self.narrative_in_flight = true;
        Ok(Some(result.clone()))
    }

    /// Second half: attach the generated sections (or release the guard on
    /// failure, leaving the persisted partial result untouched).
    pub fn complete_narrative(
        &mut self,
        outcome: Result<ReportSuggestions, NarrativeError>,
    ) -> Result<DiagnosisResult, DiagnosisError> {
        self.narrative_in_flight = false;
        let suggestions = outcome?;

        let result = self.current.as_mut().ok_or(DiagnosisError::NoActiveResult)?;
        result.suggestions = Some(suggestions);

        if let Err(err) = self.results.save(result) {
            warn!(%err, "failed to persist completed diagnosis result");
        }
        Ok(result.clone())
    }

    /// report -> diagnosis; the built selection state is kept for rework.
    pub fn back(&mut self) -> Result<(), DiagnosisError> {
        self.flow.back()?;
        self.current = None;
        self.narrative_in_flight = false;
        Ok(())
    }

    /// Clear the stored slot and return to the landing screen.
    pub fn go_home(&mut self) {
        if let Err(err) = self.results.clear() {
            warn!(%err, "failed to clear stored diagnosis result");
        }
        self.reset_session();
        self.flow.go_home();
    }

    pub fn navigate(&mut self, target: Screen) -> Screen {
        self.flow.navigate(target, self.current.is_some())
    }

    fn require_screen(&self, expected: Screen, action: &'static str) -> Result<(), DiagnosisError> {
        if self.flow.screen() == expected {
            Ok(())
        } else {
            Err(FlowError {
                action,
                from: self.flow.screen().label(),
            }
            .into())
        }
    }

    fn reset_session(&mut self) {
        self.answers.clear();
        self.performance.clear();
        self.quantitative.clear();
        self.current = None;
        self.narrative_in_flight = false;
    }
}
