// libs/public-booking-cell/src/services/booking.rs
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use appointment_cell::{Appointment, BookingEngine};
use scheduling_cell::{AvailabilityService, AvailableDay, DaySlots};
use tenant_cell::{Tenant, TenantContext, TenantProfile, TenantResolver};

use crate::models::{PublicBookingError, PublicBookingRequest};

/// Unauthenticated booking page backed by the staff booking engine.
///
/// Companies are addressed by id or slug and must be active and paid up for
/// anything but their profile.
#[derive(Clone)]
pub struct PublicBookingService {
    resolver: TenantResolver,
    availability: AvailabilityService,
    engine: BookingEngine,
}

impl PublicBookingService {
    pub fn new(
        resolver: TenantResolver,
        availability: AvailabilityService,
        engine: BookingEngine,
    ) -> Self {
        Self {
            resolver,
            availability,
            engine,
        }
    }

    pub async fn company_info(&self, id_or_slug: &str) -> Result<TenantProfile, PublicBookingError> {
        Ok(self.find_company(id_or_slug).await?.profile())
    }

    /// Open days from the company's today that still have free slots.
    pub async fn available_days(
        &self,
        id_or_slug: &str,
    ) -> Result<(TenantContext, Vec<AvailableDay>), PublicBookingError> {
        let ctx = self.active_company(id_or_slug).await?;
        let days = self.availability.list_available_days(&ctx, ctx.today()).await?;
        Ok((ctx, days))
    }

    pub async fn available_slots(
        &self,
        id_or_slug: &str,
        date: NaiveDate,
    ) -> Result<(TenantContext, DaySlots), PublicBookingError> {
        let ctx = self.active_company(id_or_slug).await?;
        let slots = self
            .availability
            .open_day_slots(&ctx, date)
            .await?
            .ok_or(PublicBookingError::NoSlotsOn { date })?;
        Ok((ctx, slots))
    }

    #[instrument(skip(self, request))]
    pub async fn book(
        &self,
        id_or_slug: &str,
        request: PublicBookingRequest,
    ) -> Result<(TenantContext, Appointment), PublicBookingError> {
        let ctx = self.active_company(id_or_slug).await?;
        let appointment = self.engine.book(&ctx, request.into()).await?;
        info!("Online booking {} for company {}", appointment.id, ctx.slug);
        Ok((ctx, appointment))
    }

    async fn find_company(&self, id_or_slug: &str) -> Result<Tenant, PublicBookingError> {
        self.resolver
            .resolve(id_or_slug)
            .await?
            .ok_or(PublicBookingError::CompanyNotFound)
    }

    async fn active_company(&self, id_or_slug: &str) -> Result<TenantContext, PublicBookingError> {
        let tenant = self.find_company(id_or_slug).await?;
        if !tenant.is_active() || tenant.payment_overdue() {
            warn!("Public access to inactive company {}", tenant.slug);
            return Err(PublicBookingError::TenantInactive);
        }
        Ok(self.resolver.context_for(&tenant))
    }
}
