use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::error::StoreError;

use crate::models::{Patient, PatientContact, PatientSource};

/// Tenant-scoped patient lookups used by the booking flows.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn find_by_id(&self, tenant_id: Uuid, patient_id: Uuid)
        -> Result<Option<Patient>, StoreError>;

    async fn find_by_document(&self, tenant_id: Uuid, document: &str)
        -> Result<Option<Patient>, StoreError>;

    async fn find_by_phone(&self, tenant_id: Uuid, phone: &str)
        -> Result<Option<Patient>, StoreError>;

    async fn create(&self, patient: Patient) -> Result<Patient, StoreError>;

    /// Matches on document first, then phone; creates the patient when neither matches.
    async fn find_or_create(
        &self,
        tenant_id: Uuid,
        contact: &PatientContact,
        source: PatientSource,
    ) -> Result<Patient, StoreError> {
        let document = contact.document_digits();

        if let Some(document) = document.as_deref() {
            if let Some(existing) = self.find_by_document(tenant_id, document).await? {
                debug!("Matched patient {} by document", existing.id);
                return Ok(existing);
            }
        }

        if let Some(phone) = contact.phone_value() {
            if let Some(existing) = self.find_by_phone(tenant_id, &phone).await? {
                debug!("Matched patient {} by phone", existing.id);
                return Ok(existing);
            }
        }

        let patient = Patient::new(tenant_id, contact, source);
        match self.create(patient).await {
            Ok(created) => {
                info!("Registered patient {} for tenant {}", created.id, tenant_id);
                Ok(created)
            }
            Err(err) => {
                // Lost a race on the (tenant, document) index
                if let Some(document) = document.as_deref() {
                    if let Some(existing) = self.find_by_document(tenant_id, document).await? {
                        warn!("Patient created concurrently, reusing {}", existing.id);
                        return Ok(existing);
                    }
                }
                Err(err)
            }
        }
    }
}

pub struct SupabasePatientDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePatientDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(&self, path: &str) -> Result<Option<Patient>, StoreError> {
        let rows: Vec<Patient> = self.supabase.request(Method::GET, path, None, None).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl PatientDirectory for SupabasePatientDirectory {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Option<Patient>, StoreError> {
        debug!("Fetching patient {} for tenant {}", patient_id, tenant_id);
        self.first(&format!(
            "/rest/v1/patients?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, patient_id
        ))
        .await
    }

    async fn find_by_document(
        &self,
        tenant_id: Uuid,
        document: &str,
    ) -> Result<Option<Patient>, StoreError> {
        self.first(&format!(
            "/rest/v1/patients?tenant_id=eq.{}&document=eq.{}&limit=1",
            tenant_id,
            urlencoding::encode(document)
        ))
        .await
    }

    async fn find_by_phone(
        &self,
        tenant_id: Uuid,
        phone: &str,
    ) -> Result<Option<Patient>, StoreError> {
        self.first(&format!(
            "/rest/v1/patients?tenant_id=eq.{}&phone=eq.{}&limit=1",
            tenant_id,
            urlencoding::encode(phone)
        ))
        .await
    }

    async fn create(&self, patient: Patient) -> Result<Patient, StoreError> {
        let body = serde_json::to_value(&patient)?;
        let rows: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                None,
                Some(body),
                Some(SupabaseClient::representation_headers(&[])),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Database("Failed to create patient".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryPatientDirectory {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, patient: Patient) {
        if let Ok(mut patients) = self.patients.write() {
            patients.insert(patient.id, patient);
        }
    }

    pub fn len(&self) -> usize {
        self.patients.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_where(
        &self,
        predicate: impl Fn(&Patient) -> bool,
    ) -> Result<Option<Patient>, StoreError> {
        self.patients
            .read()
            .map(|patients| patients.values().find(|p| predicate(p)).cloned())
            .map_err(|_| StoreError::Database("patient directory lock poisoned".to_string()))
    }
}

#[async_trait]
impl PatientDirectory for InMemoryPatientDirectory {
    async fn find_by_id(
        &self,
        tenant_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Option<Patient>, StoreError> {
        self.find_where(|p| p.id == patient_id && p.tenant_id == tenant_id)
    }

    async fn find_by_document(
        &self,
        tenant_id: Uuid,
        document: &str,
    ) -> Result<Option<Patient>, StoreError> {
        self.find_where(|p| p.tenant_id == tenant_id && p.document.as_deref() == Some(document))
    }

    async fn find_by_phone(
        &self,
        tenant_id: Uuid,
        phone: &str,
    ) -> Result<Option<Patient>, StoreError> {
        self.find_where(|p| p.tenant_id == tenant_id && p.phone.as_deref() == Some(phone))
    }

    async fn create(&self, patient: Patient) -> Result<Patient, StoreError> {
        let mut patients = self
            .patients
            .write()
            .map_err(|_| StoreError::Database("patient directory lock poisoned".to_string()))?;

        let duplicate = patient.document.is_some()
            && patients.values().any(|p| {
                p.tenant_id == patient.tenant_id && p.document == patient.document
            });
        if duplicate {
            return Err(StoreError::Conflict(
                "Patient with this document already exists".to_string(),
            ));
        }

        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }
}
