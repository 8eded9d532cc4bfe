mod support;

use gwsync_client::DryRunClient;
use gwsync_core::{Declaration, Plugin, Route, Service};
use gwsync_engine::Reconciler;
use support::{FakeGateway, State};

#[tokio::test]
async fn dry_run_reads_but_never_writes() {
    let mut state = State::default();
    state.seed_plugin("cors");
    state.seed_service("legacy");
    let before = state.snapshot();

    let mut decl = Declaration::new("localhost:8001");
    decl.services.push(Service::new("users").with_url("http://users:8080"));
    decl.routes.push(Route::new("users-route", "users"));
    decl.plugins.push(Plugin::scoped("acl", vec![], vec!["users-route".into()]));

    let reconciler = Reconciler::new(DryRunClient::new(FakeGateway::with_state(state)));
    let report = reconciler.apply(&decl).await.unwrap();

    // route-scoped plugins still resolve against the synthetic route id
    assert!(report.routes.get("users-route").unwrap().starts_with("dry-run-"));
    assert_eq!(report.created.plugins, 1);
    assert_eq!(report.deleted.plugins, 1);
    assert_eq!(report.deleted.services, 1);

    let fake = reconciler.into_client().into_inner();
    assert_eq!(fake.calls(), vec!["GET /plugins", "GET /routes", "GET /services"]);
    assert_eq!(fake.state().snapshot(), before);
}
