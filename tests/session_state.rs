mod common;

use std::sync::Arc;

use common::MockApi;
use formgate::{BadgeCount, EngineConfig, FormDefinition, Record, SessionState, User};
use serde_json::json;

fn session(api: &Arc<MockApi>) -> SessionState {
    SessionState::new(
        Arc::clone(api) as Arc<dyn formgate::RecordApi>,
        EngineConfig::default(),
    )
}

fn share_form() -> FormDefinition {
    FormDefinition::new("f1", "notes").with_share_panel()
}

#[tokio::test]
async fn share_panel_detection_is_cached_per_form_id() {
    let api = MockApi::new();
    let session = session(&api);

    assert!(session.has_share_panel(&share_form()));

    // Same form id with the panel stripped: the cached answer stands for
    // the rest of the session.
    let stripped = FormDefinition::new("f1", "notes").with_components(Vec::new());
    assert!(session.has_share_panel(&stripped));

    // After logout the form is re-inspected.
    session.reset();
    assert!(!session.has_share_panel(&stripped));
}

#[tokio::test]
async fn component_less_payloads_are_not_cached() {
    let api = MockApi::new();
    let session = session(&api);

    let nav = FormDefinition::new("f1", "notes");
    assert!(!session.has_share_panel(&nav));

    // The component-less answer must not mask the full definition.
    assert!(session.has_share_panel(&share_form()));
}

#[tokio::test]
async fn row_gate_composes_owner_share_and_admin() {
    let api = MockApi::new();
    let session = session(&api);
    let form = share_form();
    let user = User::new("u1").with_roles(["r1"]);

    let own = Record::new("own").with_owner("u1");
    let shared = Record::new("shared")
        .with_owner("u2")
        .with_data_field("shareRoles", json!(["r1"]));
    let private = Record::new("private").with_owner("u2");

    assert!(session.can_see_row(&user, &own, &form, false));
    assert!(session.can_see_row(&user, &shared, &form, false));
    assert!(!session.can_see_row(&user, &private, &form, false));
    assert!(session.can_see_row(&user, &private, &form, true));
}

#[tokio::test]
async fn filter_visible_uses_the_cached_gate() {
    let api = MockApi::new();
    let session = session(&api);
    let user = User::new("u1");

    let records = vec![
        Record::new("mine").with_owner("u1"),
        Record::new("private").with_owner("u2"),
        Record::new("public")
            .with_owner("u2")
            .with_data_field("sharePublic", json!(true)),
    ];
    let visible = session.filter_visible(&user, records, &share_form(), false);
    let ids: Vec<&str> = visible.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["mine", "public"]);
}

#[tokio::test]
async fn record_viewed_flows_through_ledger_and_badges() {
    let api = MockApi::new();
    let session = session(&api);
    session.badges().seed_counts("f1", BadgeCount::new(3, 2));

    session.record_viewed("f1", "s1").await;
    assert!(session.ledger().is_viewed("s1"));
    assert_eq!(session.badges().counts_for("f1").expect("counts").unread, 1);

    // Second view of the same record is a no-op.
    session.record_viewed("f1", "s1").await;
    assert_eq!(session.badges().counts_for("f1").expect("counts").unread, 1);
}

#[tokio::test]
async fn reset_clears_every_cache() {
    let api = MockApi::new();
    api.set_roles(vec![formgate::Role::new("r1", "Staff")]);
    let session = session(&api);

    session.roles().fetch_roles(false).await.expect("fetch");
    session.badges().seed_counts("f1", BadgeCount::new(3, 2));
    session
        .mark_viewed("s1", "f1")
        .await
        .expect("mark viewed");
    assert!(session.has_share_panel(&share_form()));

    session.reset();

    assert!(!session.ledger().is_viewed("s1"));
    assert!(session.badges().counts_for("f1").is_none());
    assert!(!session.badges().is_initialized());
    // Role cache dropped: the next fetch hits the API again.
    session.roles().fetch_roles(false).await.expect("refetch");
    assert_eq!(
        api.role_calls.load(std::sync::atomic::Ordering::SeqCst),
        2
    );
}

#[tokio::test]
async fn admin_check_is_reachable_through_the_session() {
    let api = MockApi::new();
    api.set_roles(vec![formgate::Role::new("r-admin", "Admin").as_admin()]);
    let session = session(&api);

    let check = session
        .is_administrator(&User::new("u1").with_roles(["r-admin"]))
        .await;
    assert!(check.is_admin);
}
