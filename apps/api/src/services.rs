use std::sync::Arc;

use tracing::info;

use appointment_cell::{
    AppointmentStore, BookingEngine, InMemoryAppointmentStore, SupabaseAppointmentStore,
};
use patient_cell::{InMemoryPatientDirectory, PatientDirectory, SupabasePatientDirectory};
use professional_cell::{
    InMemoryProfessionalDirectory, InMemoryRoomDirectory, ProfessionalDirectory, RoomDirectory,
    SupabaseProfessionalDirectory, SupabaseRoomDirectory,
};
use public_booking_cell::PublicBookingService;
use scheduling_cell::{
    AvailabilityService, AvailabilityStore, InMemoryAvailabilityStore, SupabaseAvailabilityStore,
};
use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::SupabaseClient;
use tenant_cell::{InMemoryTenantDirectory, SupabaseTenantDirectory, TenantDirectory, TenantResolver};

/// Every service the routers need, wired against one storage backend.
#[derive(Clone)]
pub struct Services {
    pub resolver: TenantResolver,
    pub availability: AvailabilityService,
    pub engine: BookingEngine,
    pub public_booking: PublicBookingService,
}

struct Backend {
    tenants: Arc<dyn TenantDirectory>,
    patients: Arc<dyn PatientDirectory>,
    professionals: Arc<dyn ProfessionalDirectory>,
    rooms: Arc<dyn RoomDirectory>,
    availability: Arc<dyn AvailabilityStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl Backend {
    fn supabase(config: &AppConfig) -> Self {
        let client = Arc::new(SupabaseClient::new(config));
        Self {
            tenants: Arc::new(SupabaseTenantDirectory::with_client(Arc::clone(&client))),
            patients: Arc::new(SupabasePatientDirectory::with_client(Arc::clone(&client))),
            professionals: Arc::new(SupabaseProfessionalDirectory::with_client(Arc::clone(&client))),
            rooms: Arc::new(SupabaseRoomDirectory::with_client(Arc::clone(&client))),
            availability: Arc::new(SupabaseAvailabilityStore::with_client(Arc::clone(&client))),
            appointments: Arc::new(SupabaseAppointmentStore::with_client(client)),
        }
    }

    fn memory() -> Self {
        Self {
            tenants: Arc::new(InMemoryTenantDirectory::new()),
            patients: Arc::new(InMemoryPatientDirectory::new()),
            professionals: Arc::new(InMemoryProfessionalDirectory::new()),
            rooms: Arc::new(InMemoryRoomDirectory::new()),
            availability: Arc::new(InMemoryAvailabilityStore::new()),
            appointments: Arc::new(InMemoryAppointmentStore::new()),
        }
    }
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = match config.storage_backend {
            StorageBackend::Supabase => {
                info!("Using Supabase storage at {}", config.supabase_url);
                Backend::supabase(config)
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                Backend::memory()
            }
        };
        Self::from_backend(backend, config.default_tenant_utc_offset_minutes)
    }

    fn from_backend(backend: Backend, default_utc_offset_minutes: i32) -> Self {
        let resolver = TenantResolver::new(backend.tenants, default_utc_offset_minutes);
        let availability = AvailabilityService::new(Arc::clone(&backend.availability));
        let engine = BookingEngine::new(
            backend.availability,
            backend.appointments,
            backend.patients,
            backend.professionals,
            backend.rooms,
        );
        let public_booking =
            PublicBookingService::new(resolver.clone(), availability.clone(), engine.clone());

        Self {
            resolver,
            availability,
            engine,
            public_booking,
        }
    }
}
