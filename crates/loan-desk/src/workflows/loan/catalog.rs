use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::domain::{Facility, FacilityId};

const BUNDLED_CATALOG: &str = include_str!("../../../data/facilities.json");

/// Errors raised while loading a facility catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read facility catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("facility catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("facility {id} has an invalid penalty rate {rate}")]
    InvalidPenaltyRate { id: String, rate: f64 },
    #[error("facility {0} offers no repayment options")]
    NoRepaymentOptions(String),
    #[error("facility {0} offers a zero-month repayment option")]
    ZeroRepaymentTerm(String),
    #[error("facility id {0} appears more than once")]
    DuplicateId(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped { data: Vec<Facility> },
    Bare(Vec<Facility>),
}

/// Read-only set of facilities, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct FacilityCatalog {
    facilities: Vec<Facility>,
}

impl FacilityCatalog {
    pub fn new(facilities: Vec<Facility>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for facility in &facilities {
            let id = facility.id.as_str();
            if !facility.penalty_rate.is_finite() || facility.penalty_rate < 0.0 {
                return Err(CatalogError::InvalidPenaltyRate {
                    id: id.to_string(),
                    rate: facility.penalty_rate,
                });
            }
            if facility.repayment_type.is_empty() {
                return Err(CatalogError::NoRepaymentOptions(id.to_string()));
            }
            if facility.repayment_type.iter().any(|option| option.value == 0) {
                return Err(CatalogError::ZeroRepaymentTerm(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(id.to_string()));
            }
        }

        Ok(Self { facilities })
    }

    /// Catalog shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        match document {
            CatalogDocument::Wrapped { data } => Self::new(data),
            CatalogDocument::Bare(facilities) => Self::new(facilities),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Facility> {
        self.facilities
            .iter()
            .find(|facility| facility.id.as_str() == id)
    }

    pub fn get(&self, id: &FacilityId) -> Option<&Facility> {
        self.find(id.as_str())
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
