use esg_diagnosis::diagnosis::domain::{DiagnosisResult, UsageRecord};
use esg_diagnosis::diagnosis::repository::{RepositoryError, ResultRepository, UsageRepository};
use esg_diagnosis::diagnosis::{DiagnosisService, IndicatorCatalog};
use esg_diagnosis::narrative::Narrator;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SharedService<S> = Arc<Mutex<DiagnosisService<S, S>>>;

/// Router state for the diagnosis flow. The mutex models the single
/// logical writer; handlers never hold it across an await point.
pub(crate) struct DiagnosisState<S> {
    pub(crate) service: SharedService<S>,
    pub(crate) narrator: Arc<Narrator>,
    pub(crate) catalog: Arc<IndicatorCatalog>,
    pub(crate) api_key: Option<String>,
}

impl<S> Clone for DiagnosisState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            narrator: self.narrator.clone(),
            catalog: self.catalog.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// Ephemeral store used by tests and the CLI demo.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    result: Mutex<Option<DiagnosisResult>>,
    usage: Mutex<Option<UsageRecord>>,
}

impl ResultRepository for InMemoryStore {
    fn save(&self, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        *self.result.lock().expect("result mutex poisoned") = Some(result.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<DiagnosisResult>, RepositoryError> {
        Ok(self.result.lock().expect("result mutex poisoned").clone())
    }

    fn clear(&self) -> Result<(), RepositoryError> {
        *self.result.lock().expect("result mutex poisoned") = None;
        Ok(())
    }
}

impl UsageRepository for InMemoryStore {
    fn fetch(&self) -> Result<Option<UsageRecord>, RepositoryError> {
        Ok(*self.usage.lock().expect("usage mutex poisoned"))
    }

    fn store(&self, record: UsageRecord) -> Result<(), RepositoryError> {
        *self.usage.lock().expect("usage mutex poisoned") = Some(record);
        Ok(())
    }
}

/// File-backed store: two JSON documents under the configured data
/// directory, written via a temp-file rename. Corrupt content loads as
/// empty rather than failing the caller.
pub(crate) struct JsonFileStore {
    results_path: PathBuf,
    usage_path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(data_dir: &Path) -> Result<Self, std::io::Error> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            results_path: data_dir.join("diagnosis-results.json"),
            usage_path: data_dir.join("usage-tracker.json"),
        })
    }

    fn write_atomic(path: &Path, payload: &[u8]) -> Result<(), RepositoryError> {
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)
            .and_then(|_| fs::rename(&tmp_path, path))
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))
    }

    fn read_optional(path: &Path) -> Result<Option<String>, RepositoryError> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RepositoryError::Unavailable(err.to_string())),
        }
    }

    fn remove_optional(path: &Path) -> Result<(), RepositoryError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RepositoryError::Unavailable(err.to_string())),
        }
    }
}

impl ResultRepository for JsonFileStore {
    fn save(&self, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        // Array-of-one layout: only the latest result is retained.
        let payload = serde_json::to_vec_pretty(&[result])
            .map_err(|err| RepositoryError::Serialization(err.to_string()))?;
        Self::write_atomic(&self.results_path, &payload)
    }

    fn load(&self) -> Result<Option<DiagnosisResult>, RepositoryError> {
        let Some(raw) = Self::read_optional(&self.results_path)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<DiagnosisResult>>(&raw) {
            Ok(results) => Ok(results.into_iter().next()),
            Err(err) => {
                warn!(%err, "stored diagnosis result is corrupt, treating as empty");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), RepositoryError> {
        Self::remove_optional(&self.results_path)
    }
}

impl UsageRepository for JsonFileStore {
    fn fetch(&self) -> Result<Option<UsageRecord>, RepositoryError> {
        let Some(raw) = Self::read_optional(&self.usage_path)? else {
            return Ok(None);
        };
        match serde_json::from_str::<UsageRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(%err, "stored usage record is corrupt, treating as empty");
                Ok(None)
            }
        }
    }

    fn store(&self, record: UsageRecord) -> Result<(), RepositoryError> {
        let payload = serde_json::to_vec(&record)
            .map_err(|err| RepositoryError::Serialization(err.to_string()))?;
        Self::write_atomic(&self.usage_path, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use esg_diagnosis::diagnosis::answers::AnswerSet;
    use esg_diagnosis::diagnosis::domain::ScoreCard;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "esg-diagnosis-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_result() -> DiagnosisResult {
        DiagnosisResult {
            id: "2025-06-02T10:00:00+00:00".to_string(),
            company_name: "Acme Textiles".to_string(),
            date: "2025-06-02".to_string(),
            scores: ScoreCard {
                e: 2.5,
                s: 3.0,
                g: 1.0,
                overall: 6.5 / 3.0,
            },
            suggestions: None,
            answers: AnswerSet::new(),
            quantitative_data: Default::default(),
            performance_data: Default::default(),
        }
    }

    #[test]
    fn result_slot_round_trips_and_clears() {
        let dir = scratch_dir("results");
        let store = JsonFileStore::new(&dir).expect("store initializes");

        assert!(store.load().expect("empty load succeeds").is_none());

        let result = sample_result();
        store.save(&result).expect("save succeeds");
        let loaded = store.load().expect("load succeeds").expect("slot filled");
        assert_eq!(loaded.company_name, result.company_name);
        assert_eq!(loaded.scores, result.scores);

        store.clear().expect("clear succeeds");
        assert!(store.load().expect("load succeeds").is_none());
        store.clear().expect("clearing an empty slot is a no-op");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_overwrites_the_single_slot() {
        let dir = scratch_dir("overwrite");
        let store = JsonFileStore::new(&dir).expect("store initializes");

        store.save(&sample_result()).expect("first save");
        let mut second = sample_result();
        second.company_name = "Second Co".to_string();
        store.save(&second).expect("second save");

        let raw = fs::read_to_string(dir.join("diagnosis-results.json")).expect("file readable");
        let slots: Vec<serde_json::Value> = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(slots.len(), 1, "the persisted layout holds one result");
        assert_eq!(slots[0]["companyName"], "Second Co");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_files_load_as_empty() {
        let dir = scratch_dir("corrupt");
        let store = JsonFileStore::new(&dir).expect("store initializes");

        fs::write(dir.join("diagnosis-results.json"), "{not json").expect("write succeeds");
        fs::write(dir.join("usage-tracker.json"), "[]").expect("write succeeds");

        assert!(store.load().expect("corrupt result reads as empty").is_none());
        assert!(store.fetch().expect("corrupt usage reads as empty").is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn usage_record_round_trips() {
        let dir = scratch_dir("usage");
        let store = JsonFileStore::new(&dir).expect("store initializes");

        let record = UsageRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"),
            count: 4,
        };
        store.store(record).expect("store succeeds");
        assert_eq!(store.fetch().expect("fetch succeeds"), Some(record));

        let _ = fs::remove_dir_all(&dir);
    }
}
