//! Event lifecycle tests: creation rules, status transitions and the
//! authorisation boundary around them.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;

use eventra::models::{EventStatus, UpdateEventRequest};
use eventra::{EventraError, Role};
use helpers::test_data::{free_event_request, principal};
use helpers::TestApp;

#[tokio::test]
#[serial]
async fn events_are_created_as_drafts() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let organisation = app.seed_organisation("acme", &organiser).await;

    let event = app
        .services
        .events
        .create_event(
            principal(&organiser, Role::Organisation),
            free_event_request(organisation.id, 10),
        )
        .await
        .expect("create");

    assert_eq!(event.status, EventStatus::Draft.as_str());
    assert_eq!(event.registered_count, 0);
    assert_eq!(event.organisation_id, organisation.id);
}

#[tokio::test]
#[serial]
async fn event_creation_validates_capacity_and_dates() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;

    let mut too_small = free_event_request(organisation.id, 4);
    let result = app.services.events.create_event(admin, too_small.clone()).await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));

    too_small.capacity = 10;
    too_small.end_date = too_small.start_date - chrono::Duration::hours(1);
    let result = app.services.events.create_event(admin, too_small).await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));

    let mut late_registration = free_event_request(organisation.id, 10);
    late_registration.registration_end = Some(late_registration.start_date + chrono::Duration::hours(1));
    let result = app.services.events.create_event(admin, late_registration).await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));
}

#[tokio::test]
#[serial]
async fn only_organisation_admins_and_platform_admins_manage_events() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let outsider = app.seed_user("outsider", Role::Organisation).await;
    let plain = app.seed_user("plain", Role::User).await;
    let organisation = app.seed_organisation("acme", &organiser).await;
    app.seed_organisation("rival", &outsider).await;

    let request = free_event_request(organisation.id, 10);

    let as_plain = app
        .services
        .events
        .create_event(principal(&plain, Role::User), request.clone())
        .await;
    assert_matches!(as_plain, Err(EventraError::Forbidden(_)));

    let as_outsider = app
        .services
        .events
        .create_event(principal(&outsider, Role::Organisation), request.clone())
        .await;
    assert_matches!(as_outsider, Err(EventraError::Forbidden(_)));

    let as_owner = app
        .services
        .events
        .create_event(principal(&organiser, Role::Organisation), request)
        .await;
    assert!(as_owner.is_ok());
}

#[tokio::test]
#[serial]
async fn lifecycle_follows_the_allowed_transitions() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;

    let draft = app
        .services
        .events
        .create_event(admin, free_event_request(organisation.id, 10))
        .await
        .expect("draft");

    // Draft cannot jump straight to completed
    let skip = app.services.events.complete_event(admin, draft.id).await;
    assert_matches!(skip, Err(EventraError::InvalidState(_)));

    let published = app
        .services
        .events
        .publish_event(admin, draft.id)
        .await
        .expect("publish");
    assert_eq!(published.status, EventStatus::Published.as_str());

    let ongoing = app
        .services
        .events
        .start_event(admin, draft.id)
        .await
        .expect("start");
    assert_eq!(ongoing.status, EventStatus::Ongoing.as_str());

    let completed = app
        .services
        .events
        .complete_event(admin, draft.id)
        .await
        .expect("complete");
    assert_eq!(completed.status, EventStatus::Completed.as_str());

    // Completed is terminal
    let revive = app.services.events.cancel_event(admin, draft.id).await;
    assert_matches!(revive, Err(EventraError::InvalidState(_)));
}

#[tokio::test]
#[serial]
async fn published_events_are_frozen_for_editing() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;

    let draft = app
        .services
        .events
        .create_event(admin, free_event_request(organisation.id, 10))
        .await
        .expect("draft");

    let update = UpdateEventRequest {
        title: Some("Renamed Workshop".to_string()),
        ..Default::default()
    };
    let updated = app
        .services
        .events
        .update_event(admin, draft.id, update.clone())
        .await
        .expect("draft edit");
    assert_eq!(updated.title, "Renamed Workshop");

    app.services
        .events
        .publish_event(admin, draft.id)
        .await
        .expect("publish");

    let after_publish = app.services.events.update_event(admin, draft.id, update).await;
    assert_matches!(after_publish, Err(EventraError::InvalidState(_)));
}

#[tokio::test]
#[serial]
async fn draft_edits_keep_event_invariants() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;

    let draft = app
        .services
        .events
        .create_event(admin, free_event_request(organisation.id, 10))
        .await
        .expect("draft");

    let shrink = UpdateEventRequest {
        capacity: Some(4),
        ..Default::default()
    };
    let result = app.services.events.update_event(admin, draft.id, shrink).await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));

    let inverted = UpdateEventRequest {
        end_date: Some(draft.start_date - chrono::Duration::hours(1)),
        ..Default::default()
    };
    let result = app.services.events.update_event(admin, draft.id, inverted).await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));

    let late_close = UpdateEventRequest {
        registration_end: Some(draft.start_date + chrono::Duration::hours(1)),
        ..Default::default()
    };
    let result = app
        .services
        .events
        .update_event(admin, draft.id, late_close)
        .await;
    assert_matches!(result, Err(EventraError::InvalidInput(_)));

    let unchanged = app
        .services
        .events
        .get_event(draft.id)
        .await
        .expect("reload");
    assert_eq!(unchanged.capacity, draft.capacity);
    assert_eq!(unchanged.end_date, draft.end_date);
}

#[tokio::test]
#[serial]
async fn listing_filters_by_status_and_paginates() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;

    for _ in 0..3 {
        app.published_free_event(admin, organisation.id, 10).await;
    }
    app.services
        .events
        .create_event(admin, free_event_request(organisation.id, 10))
        .await
        .expect("extra draft");

    let mut params = std::collections::HashMap::new();
    params.insert("status".to_string(), "published".to_string());
    let (published, total) = app
        .services
        .events
        .list_events(&params)
        .await
        .expect("listing");
    assert_eq!(total, 3);
    assert!(published.iter().all(|e| e.status == EventStatus::Published.as_str()));

    params.insert("limit".to_string(), "2".to_string());
    params.insert("page".to_string(), "2".to_string());
    let (second_page, total) = app
        .services
        .events
        .list_events(&params)
        .await
        .expect("second page");
    assert_eq!(total, 3);
    assert_eq!(second_page.len(), 1);
}

#[tokio::test]
#[serial]
async fn deleting_an_event_cascades_to_its_applications() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let admin = principal(&organiser, Role::Admin);
    let organisation = app.seed_organisation("acme", &organiser).await;
    let event = app.published_free_event(admin, organisation.id, 10).await;

    let applicant = app.seed_user("pat", Role::User).await;
    app.services
        .applications
        .create_application(applicant.id, event.id, None)
        .await
        .expect("application");

    app.services
        .events
        .delete_event(admin, event.id)
        .await
        .expect("delete");

    assert_eq!(app.db.count_records("events").await.expect("count"), 0);
    assert_eq!(
        app.db.count_records("applications").await.expect("count"),
        0
    );
}
