//! Test data builders
//!
//! `TestApp` wires the full service stack against a disposable database and
//! offers seed helpers for the common fixtures (users, organisations,
//! published events).

use chrono::{Duration, Utc};
use uuid::Uuid;

use eventra::database::{ApplicationRepository, UserRepository};
use eventra::models::{
    CreateEventRequest, CreateOrganisationRequest, CreateUserRequest, Event, EventCategory,
    EventFormat, Organisation, OrganisationType, User,
};
use eventra::{Principal, Role, Services, Settings};

use super::database_helper::TestDatabase;

/// Full application stack over a test database
pub struct TestApp {
    pub db: TestDatabase,
    pub services: Services,
    pub users: UserRepository,
    pub applications: ApplicationRepository,
    pub settings: Settings,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = TestDatabase::new().await.expect("test database");
        db.cleanup().await.expect("cleanup");

        let mut settings = Settings::default();
        settings.database.url = db.database_url.clone();

        let services = Services::new(db.pool.clone(), settings.clone());
        let users = UserRepository::new(db.pool.clone());
        let applications = ApplicationRepository::new(db.pool.clone());

        Self {
            db,
            services,
            users,
            applications,
            settings,
        }
    }

    /// Insert a user with the given role and a unique email
    pub async fn seed_user(&self, name: &str, role: Role) -> User {
        let suffix = Uuid::new_v4().simple().to_string();
        self.users
            .create(CreateUserRequest {
                email: format!("{}-{}@example.com", name, &suffix[..8]),
                password_hash: Some("x".repeat(60)),
                oauth_id: None,
                full_name: name.to_string(),
                role: Some(role),
            })
            .await
            .expect("seed user")
    }

    /// Create an organisation and register `admin` as its administrator
    pub async fn seed_organisation(&self, name: &str, admin: &User) -> Organisation {
        let suffix = Uuid::new_v4().simple().to_string();
        let organisation = self
            .services
            .organisations
            .create_organisation(CreateOrganisationRequest {
                name: name.to_string(),
                org_type: OrganisationType::University,
                description: Some(format!("{} test organisation", name)),
                email: format!("{}-{}@example.org", name, &suffix[..8]),
                phone: None,
                website: None,
                social_links: None,
            })
            .await
            .expect("seed organisation");

        self.services
            .organisations
            .add_admin(organisation.id, admin.id)
            .await
            .expect("seed organisation admin");

        organisation
    }

    /// Create and publish a free event, returning its published row
    pub async fn published_free_event(
        &self,
        principal: Principal,
        organisation_id: i64,
        capacity: i32,
    ) -> Event {
        let request = free_event_request(organisation_id, capacity);
        self.publish(principal, request).await
    }

    /// Create and publish a paid event, returning its published row
    pub async fn published_paid_event(
        &self,
        principal: Principal,
        organisation_id: i64,
        capacity: i32,
    ) -> Event {
        let request = paid_event_request(organisation_id, capacity);
        self.publish(principal, request).await
    }

    async fn publish(&self, principal: Principal, request: CreateEventRequest) -> Event {
        let draft = self
            .services
            .events
            .create_event(principal, request)
            .await
            .expect("create event");
        self.services
            .events
            .publish_event(principal, draft.id)
            .await
            .expect("publish event")
    }

    /// Force the registration window shut for an already published event
    pub async fn close_registration(&self, event_id: i64) {
        self.db
            .execute_sql(&format!(
                "UPDATE events SET registration_end = NOW() - INTERVAL '1 hour' WHERE id = {}",
                event_id
            ))
            .await
            .expect("close registration");
    }
}

/// Principal acting as the given user
pub fn principal(user: &User, role: Role) -> Principal {
    Principal::new(user.id, role)
}

/// Baseline free event one week out with registration open until then
pub fn free_event_request(organisation_id: i64, capacity: i32) -> CreateEventRequest {
    let now = Utc::now();
    CreateEventRequest {
        title: "Intro Workshop".to_string(),
        description: Some("Hands-on introduction".to_string()),
        organisation_id,
        category: EventCategory::Workshop,
        format: EventFormat::Offline,
        start_date: now + Duration::days(7),
        end_date: now + Duration::days(7) + Duration::hours(3),
        registration_start: None,
        registration_end: Some(now + Duration::days(6)),
        capacity,
        is_free: true,
        price_cents: 0,
        currency: None,
        requirements: None,
        contact: None,
        cover_url: None,
        created_by: None,
    }
}

/// Paid variant of the baseline event
pub fn paid_event_request(organisation_id: i64, capacity: i32) -> CreateEventRequest {
    CreateEventRequest {
        title: "Pro Conference".to_string(),
        is_free: false,
        price_cents: 4_900,
        currency: Some("EUR".to_string()),
        ..free_event_request(organisation_id, capacity)
    }
}
