use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use professional_cell::{
    InMemoryProfessionalDirectory, InMemoryRoomDirectory, Professional, ProfessionalDirectory,
    ResourceStatus, Room, RoomDirectory, SupabaseProfessionalDirectory, SupabaseRoomDirectory,
};
use shared_utils::test_utils::TestConfig;

#[tokio::test]
async fn test_in_memory_lookups_are_tenant_scoped() {
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let professionals = InMemoryProfessionalDirectory::new();
    professionals.insert(Professional {
        professional_id: 10,
        tenant_id: tenant_a,
        name: "Dra. Paula".to_string(),
        specialty: Some("fisioterapia".to_string()),
        status: ResourceStatus::Active,
    });

    let rooms = InMemoryRoomDirectory::new();
    rooms.insert(Room {
        room_id: 10,
        tenant_id: tenant_a,
        name: "Sala 1".to_string(),
        status: ResourceStatus::Active,
    });

    assert!(professionals.find_by_id(tenant_a, 10).await.unwrap().is_some());
    assert!(professionals.find_by_id(tenant_b, 10).await.unwrap().is_none());
    assert!(professionals.find_by_id(tenant_a, 11).await.unwrap().is_none());

    assert!(rooms.find_by_id(tenant_a, 10).await.unwrap().is_some());
    assert!(rooms.find_by_id(tenant_b, 10).await.unwrap().is_none());
}

#[tokio::test]
async fn test_supabase_professional_lookup() {
    let mock_server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("tenant_id", format!("eq.{}", tenant_id)))
        .and(query_param("professional_id", "eq.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "professional_id": 12,
            "tenant_id": tenant_id,
            "name": "Dr. Carlos",
            "specialty": null,
            "status": "inactive"
        }])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let directory = SupabaseProfessionalDirectory::new(&config);

    let professional = directory.find_by_id(tenant_id, 12).await.unwrap().unwrap();
    assert_eq!(professional.name, "Dr. Carlos");
    assert_eq!(professional.status, ResourceStatus::Inactive);
}

#[tokio::test]
async fn test_supabase_room_lookup_missing_and_failing() {
    let mock_server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/rooms"))
        .and(query_param("room_id", "eq.10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/rooms"))
        .and(query_param("room_id", "eq.99"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let directory = SupabaseRoomDirectory::new(&config);

    assert!(directory.find_by_id(tenant_id, 10).await.unwrap().is_none());
    assert!(directory.find_by_id(tenant_id, 99).await.is_err());
}
