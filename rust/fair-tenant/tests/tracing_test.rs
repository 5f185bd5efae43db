#![cfg(not(target_arch = "wasm32"))]

use fair_tenant::tracing::initialize_tracing;

#[test]
fn it_keeps_a_subscriber_installed_by_the_host() {
    let subscriber = tracing_subscriber::fmt().finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    initialize_tracing();
    initialize_tracing();

    assert!(tracing::dispatcher::has_been_set());
}
