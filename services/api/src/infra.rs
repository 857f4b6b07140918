use loan_desk::config::{AppConfig, StorageConfig};
use loan_desk::error::AppError;
use loan_desk::workflows::loan::{FacilityCatalog, FileStore, LoanApplicationService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Configured catalog file, or the one bundled with the library.
pub(crate) fn load_catalog(storage: &StorageConfig) -> Result<Arc<FacilityCatalog>, AppError> {
    let catalog = match &storage.facility_catalog {
        Some(path) => {
            debug!(path = %path.display(), "loading facility catalog");
            FacilityCatalog::from_path(path)?
        }
        None => FacilityCatalog::bundled()?,
    };
    Ok(Arc::new(catalog))
}

pub(crate) fn open_service(
    config: &AppConfig,
) -> Result<LoanApplicationService<FileStore>, AppError> {
    let catalog = load_catalog(&config.storage)?;
    let backend = Arc::new(FileStore::new(config.storage.store_dir.clone()));
    Ok(LoanApplicationService::new(catalog, backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn falls_back_to_the_bundled_catalog() {
        let storage = StorageConfig {
            store_dir: PathBuf::from(".loan-desk"),
            facility_catalog: None,
        };
        let catalog = load_catalog(&storage).expect("bundled catalog loads");
        assert!(catalog.find("personal-loan").is_some());
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let storage = StorageConfig {
            store_dir: PathBuf::from(".loan-desk"),
            facility_catalog: Some(PathBuf::from("/nonexistent/facilities.json")),
        };
        assert!(matches!(load_catalog(&storage), Err(AppError::Catalog(_))));
    }
}
