#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use appointment_cell::{AppointmentStore, BookingEngine, CreateAppointmentRequest, InMemoryAppointmentStore};
use patient_cell::{InMemoryPatientDirectory, Patient, PatientContact, PatientSource};
use professional_cell::{
    InMemoryProfessionalDirectory, InMemoryRoomDirectory, Professional, ResourceStatus, Room,
};
use scheduling_cell::{
    AvailabilityRecord, AvailabilityStore, DayStatus, InMemoryAvailabilityStore, SlotScope,
};
use tenant_cell::{Tenant, TenantContext};

pub const DAY: &str = "2099-03-10";
pub const PROFESSIONAL_ID: i64 = 10;
pub const ROOM_ID: i64 = 3;

pub fn day() -> NaiveDate {
    NaiveDate::parse_from_str(DAY, "%Y-%m-%d").unwrap()
}

/// In-memory wiring of every collaborator the booking engine needs, seeded
/// with one active tenant, one patient, one professional and one room.
pub struct Harness {
    pub ctx: TenantContext,
    pub availability: Arc<InMemoryAvailabilityStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub patients: Arc<InMemoryPatientDirectory>,
    pub professionals: Arc<InMemoryProfessionalDirectory>,
    pub rooms: Arc<InMemoryRoomDirectory>,
    pub patient: Patient,
    pub engine: BookingEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_appointment_store(Arc::new(InMemoryAppointmentStore::new()))
    }

    /// Same seed data, but the engine writes appointments through `appointments`.
    pub fn with_appointment_store(appointments: Arc<dyn AppointmentStore>) -> Self {
        let tenant = Tenant::new("Clinica Sol", "clinica-sol");
        let ctx = TenantContext::from_tenant(&tenant, -180);

        let availability = Arc::new(InMemoryAvailabilityStore::new());
        let patients = Arc::new(InMemoryPatientDirectory::new());
        let professionals = Arc::new(InMemoryProfessionalDirectory::new());
        let rooms = Arc::new(InMemoryRoomDirectory::new());

        let patient = Patient::new(
            tenant.id,
            &PatientContact {
                name: "Maria Souza".to_string(),
                phone: Some("11988887777".to_string()),
                document: Some("123.456.789-09".to_string()),
                email: None,
            },
            PatientSource::Manual,
        );
        patients.insert(patient.clone());
        professionals.insert(professional(tenant.id, PROFESSIONAL_ID));
        rooms.insert(Room {
            room_id: ROOM_ID,
            tenant_id: tenant.id,
            name: "Sala 3".to_string(),
            status: ResourceStatus::Active,
        });

        let engine = BookingEngine::new(
            Arc::clone(&availability) as Arc<dyn AvailabilityStore>,
            Arc::clone(&appointments),
            patients.clone(),
            professionals.clone(),
            rooms.clone(),
        );

        Self {
            ctx,
            availability,
            appointments,
            patients,
            professionals,
            rooms,
            patient,
            engine,
        }
    }

    pub async fn open_day(&self, date: NaiveDate, slots: &[&str], scope: SlotScope) {
        self.define_day(date, slots, scope, DayStatus::Open).await;
    }

    pub async fn define_day(&self, date: NaiveDate, slots: &[&str], scope: SlotScope, state: DayStatus) {
        let mut record = self
            .availability
            .find_or_create(self.ctx.tenant_id, date, scope)
            .await
            .unwrap();
        record.slots = slots.iter().map(|s| s.to_string()).collect();
        record.enabled_state = state;
        self.availability.save(record).await.unwrap();
    }

    pub async fn record(&self, date: NaiveDate) -> AvailabilityRecord {
        self.availability
            .find(self.ctx.tenant_id, date)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn free_slots(&self, date: NaiveDate) -> Vec<String> {
        self.record(date).await.slots
    }

    pub fn request(&self, scheduled_at: &str) -> CreateAppointmentRequest {
        create_request(scheduled_at, Some(self.patient.id.to_string()), None, None)
    }
}

pub fn professional(tenant_id: Uuid, professional_id: i64) -> Professional {
    Professional {
        professional_id,
        tenant_id,
        name: format!("Dra. {}", professional_id),
        specialty: Some("Fisioterapia".to_string()),
        status: ResourceStatus::Active,
    }
}

pub fn create_request(
    scheduled_at: &str,
    patient_id: Option<String>,
    professional_id: Option<i64>,
    room_id: Option<i64>,
) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        scheduled_at: scheduled_at.to_string(),
        patient_id,
        professional_id,
        room_id,
        details: Default::default(),
    }
}
