use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend, DEFAULT_TENANT_UTC_OFFSET_MINUTES};
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            default_tenant_utc_offset_minutes: DEFAULT_TENANT_UTC_OFFSET_MINUTES,
            storage_backend: StorageBackend::Memory,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub company_id: Option<String>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "admin".to_string(),
            company_id: None,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str, company_id: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            company_id: company_id.map(str::to_string),
        }
    }

    pub fn admin(email: &str, company_id: &str) -> Self {
        Self::new(email, "admin", Some(company_id))
    }

    pub fn staff(email: &str, company_id: &str) -> Self {
        Self::new(email, "staff", Some(company_id))
    }

    pub fn machine(email: &str) -> Self {
        Self::new(email, "machine", None)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            company_id: self.company_id.clone(),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "company_id": user.company_id,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn tenant_response(tenant_id: &str, slug: &str, status: &str) -> serde_json::Value {
        json!({
            "id": tenant_id,
            "name": "Clinica Teste",
            "slug": slug,
            "email": "contato@clinica.test",
            "phone": "+55 11 99999-0000",
            "address": "Rua das Flores, 100",
            "status": status,
            "payment_status": "paid",
            "utc_offset_minutes": -180
        })
    }

    pub fn scheduling_response(tenant_id: &str, date: &str, slots: &[&str]) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "tenant_id": tenant_id,
            "date": date,
            "slots": slots,
            "enabled_state": "open",
            "professional_id": null,
            "room_id": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(tenant_id: &str, patient_id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": patient_id,
            "tenant_id": tenant_id,
            "name": name,
            "phone": "+55 11 98888-7777",
            "document": "12345678909",
            "email": null,
            "source": "manual",
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(tenant_id: &str, patient_id: &str, scheduled_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "tenant_id": tenant_id,
            "patient_id": patient_id,
            "patient_name": "Maria Souza",
            "patient_phone": "+55 11 98888-7777",
            "patient_document": "12345678909",
            "professional_id": null,
            "room_id": null,
            "scheduled_at": scheduled_at,
            "duration_minutes": 60,
            "price": 150.0,
            "kind": "clinic",
            "address": null,
            "payment_method": null,
            "payment_status": "pending",
            "status": "scheduled",
            "notes": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
