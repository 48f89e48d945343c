//! Organisation management tests: uniqueness, admin membership and search.

mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use std::collections::HashMap;

use eventra::models::{CreateOrganisationRequest, OrganisationType};
use eventra::{EventraError, Role};
use helpers::TestApp;

fn request(name: &str, email: &str) -> CreateOrganisationRequest {
    CreateOrganisationRequest {
        name: name.to_string(),
        org_type: OrganisationType::Company,
        description: Some(format!("{} does things", name)),
        email: email.to_string(),
        phone: None,
        website: None,
        social_links: None,
    }
}

#[tokio::test]
#[serial]
async fn organisation_email_is_unique() {
    let app = TestApp::new().await;

    app.services
        .organisations
        .create_organisation(request("Acme", "contact@acme.example"))
        .await
        .expect("first organisation");

    let duplicate = app
        .services
        .organisations
        .create_organisation(request("Acme Clone", "contact@acme.example"))
        .await;
    assert_matches!(duplicate, Err(EventraError::DuplicateOrganisation));
}

#[tokio::test]
#[serial]
async fn organisation_input_is_validated() {
    let app = TestApp::new().await;

    let unnamed = app
        .services
        .organisations
        .create_organisation(request("   ", "x@example.com"))
        .await;
    assert_matches!(unnamed, Err(EventraError::InvalidInput(_)));

    let bad_email = app
        .services
        .organisations
        .create_organisation(request("Acme", "not-an-email"))
        .await;
    assert_matches!(bad_email, Err(EventraError::InvalidInput(_)));
}

#[tokio::test]
#[serial]
async fn admin_membership_round_trips() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let helper = app.seed_user("helper", Role::Organisation).await;
    let organisation = app.seed_organisation("acme", &organiser).await;

    app.services
        .organisations
        .add_admin(organisation.id, helper.id)
        .await
        .expect("add admin");

    // Adding the same admin twice is a no-op
    app.services
        .organisations
        .add_admin(organisation.id, helper.id)
        .await
        .expect("re-add admin");

    let mut ids = app
        .services
        .organisations
        .admin_ids(organisation.id)
        .await
        .expect("admin ids");
    ids.sort_unstable();
    let mut expected = vec![organiser.id, helper.id];
    expected.sort_unstable();
    assert_eq!(ids, expected);

    let administered = app
        .services
        .organisations
        .administered_by(helper.id)
        .await
        .expect("administered");
    assert_eq!(administered.len(), 1);
    assert_eq!(administered[0].id, organisation.id);

    app.services
        .organisations
        .remove_admin(organisation.id, helper.id)
        .await
        .expect("remove admin");
    let ids = app
        .services
        .organisations
        .admin_ids(organisation.id)
        .await
        .expect("admin ids");
    assert_eq!(ids, vec![organiser.id]);
}

#[tokio::test]
#[serial]
async fn adding_admins_checks_both_sides_exist() {
    let app = TestApp::new().await;
    let organiser = app.seed_user("organiser", Role::Organisation).await;
    let organisation = app.seed_organisation("acme", &organiser).await;

    let missing_user = app
        .services
        .organisations
        .add_admin(organisation.id, 999_999)
        .await;
    assert_matches!(
        missing_user,
        Err(EventraError::UserNotFound { user_id: 999_999 })
    );

    let missing_org = app
        .services
        .organisations
        .add_admin(999_999, organiser.id)
        .await;
    assert_matches!(
        missing_org,
        Err(EventraError::OrganisationNotFound {
            organisation_id: 999_999
        })
    );
}

#[tokio::test]
#[serial]
async fn listing_searches_name_and_description() {
    let app = TestApp::new().await;

    app.services
        .organisations
        .create_organisation(request("Rust Guild", "guild@example.com"))
        .await
        .expect("first");
    app.services
        .organisations
        .create_organisation(request("Chess Club", "chess@example.com"))
        .await
        .expect("second");

    let mut params = HashMap::new();
    params.insert("search".to_string(), "rust".to_string());
    let (rows, total) = app
        .services
        .organisations
        .list_organisations(&params)
        .await
        .expect("search");
    assert_eq!(total, 1);
    assert_eq!(rows[0].name, "Rust Guild");

    // Regex metacharacters in search terms are treated literally
    params.insert("search".to_string(), "c.*b".to_string());
    let (_, total) = app
        .services
        .organisations
        .list_organisations(&params)
        .await
        .expect("escaped search");
    assert_eq!(total, 0);
}
