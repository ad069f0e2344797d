use chrono::NaiveDate;
use loan_desk::config::LendingSettings;
use loan_desk::error::AppError;
use loan_desk::lending::{
    Dataset, InMemoryLendingRepository, LendingService, TracingEventPublisher,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type DeskService = LendingService<InMemoryLendingRepository, TracingEventPublisher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the configured book, or the demo book when no seed file is set.
pub(crate) fn load_dataset(settings: &LendingSettings) -> Result<Dataset, AppError> {
    match &settings.seed_path {
        Some(path) => {
            let dataset = Dataset::from_path(path)?;
            tracing::info!(
                path = %path.display(),
                customers = dataset.customers.len(),
                loans = dataset.loans.len(),
                "seed dataset loaded"
            );
            Ok(dataset)
        }
        None => Ok(Dataset::demo()),
    }
}

pub(crate) fn build_service(settings: &LendingSettings) -> Result<Arc<DeskService>, AppError> {
    let repository = Arc::new(InMemoryLendingRepository::new(load_dataset(settings)?));
    Ok(Arc::new(LendingService::new(
        repository,
        Arc::new(TracingEventPublisher),
        settings.workflow.clone(),
    )))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_desk::lending::LendingConfig;
    use std::path::PathBuf;

    fn settings(seed_path: Option<PathBuf>) -> LendingSettings {
        LendingSettings {
            seed_path,
            workflow: LendingConfig::default(),
        }
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        let date = parse_date(" 2025-06-01 ").expect("date parses");
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"));
        assert!(parse_date("01/06/2025").is_err());
    }

    #[test]
    fn build_service_defaults_to_demo_book() {
        let service = build_service(&settings(None)).expect("service builds");
        let loans = service
            .with_dataset(|data| data.loans.len())
            .expect("dataset readable");
        assert_eq!(loans, 4);
    }

    #[test]
    fn missing_seed_file_is_reported() {
        let result = load_dataset(&settings(Some(PathBuf::from(
            "/nonexistent/loan-desk/book.json",
        ))));
        assert!(matches!(result, Err(AppError::Seed(_))));
    }
}
