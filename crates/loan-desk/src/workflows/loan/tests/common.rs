use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::loan::store::{ApplicationStore, KeyValueStore, MemoryStore, StoreError};
use crate::workflows::loan::{
    ApplicationStepper, DraftFields, FacilityCatalog, LoanApplicationService,
};

pub(super) const CATALOG_JSON: &str = r#"{
  "data": [
    {
      "id": "standard",
      "createdDate": "2024-03-20T08:30:00Z",
      "name": "Standard facility",
      "repaymentType": [
        { "name": "12 months", "value": 12 },
        { "name": "24 months", "value": 24 }
      ],
      "amount": 500000000,
      "percentageRate": 18,
      "penaltyRate": 5
    },
    {
      "id": "interest-free",
      "createdDate": "2024-05-01",
      "name": "Interest-free facility",
      "repaymentType": [{ "name": "10 months", "value": 10 }],
      "amount": 100000000,
      "penaltyRate": 2
    }
  ]
}"#;

pub(super) fn catalog() -> Arc<FacilityCatalog> {
    Arc::new(FacilityCatalog::from_json_str(CATALOG_JSON).expect("fixture catalog is valid"))
}

pub(super) fn submitted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn filled_fields() -> DraftFields {
    DraftFields {
        facility_type: "standard".to_string(),
        name: "Sara".to_string(),
        surname: "Ahmadi".to_string(),
        national_code: "0012345678".to_string(),
        date_of_birth: "1990-04-12".to_string(),
        contact_number: "09121234567".to_string(),
        account_number: "0101-2020-3030".to_string(),
        shaba_number: "IR0601200000000012345678".to_string(),
        average_annual_balance: "25000000".to_string(),
        amount: "100000000".to_string(),
        repayment_period: "12".to_string(),
    }
}

pub(super) fn memory_store() -> (Arc<ApplicationStore<MemoryStore>>, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::default());
    (Arc::new(ApplicationStore::new(backend.clone())), backend)
}

pub(super) fn build_stepper() -> (ApplicationStepper<MemoryStore>, Arc<MemoryStore>) {
    let (store, backend) = memory_store();
    let stepper = ApplicationStepper::new(catalog(), store).expect("stepper starts");
    (stepper, backend)
}

pub(super) fn build_service() -> (LoanApplicationService<MemoryStore>, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::default());
    (LoanApplicationService::new(catalog(), backend.clone()), backend)
}

/// Fill every field of the current step from `fields`.
pub(super) fn fill_current_step<S: KeyValueStore>(
    stepper: &mut ApplicationStepper<S>,
    fields: &DraftFields,
) {
    for field in stepper.step().fields() {
        stepper
            .set_field(*field, fields.get(*field))
            .expect("field belongs to the current step");
    }
}

pub(super) struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk offline".to_string()))
    }
}

/// Reads succeed with whatever was seeded, writes fail.
pub(super) struct ReadOnlyStore(pub(super) MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
