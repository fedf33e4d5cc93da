#![cfg(feature = "test-utils")]

use std::path::Path;

use harness::error::ErrorKind;
use harness::runner::{CopyRunner, EtlParameters, EtlRunner, ProcessRunner, run_to_success};
use harness::test_utils::products::{fixture_path, products_package_path};
use telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn process_runner_maps_exit_status_to_outcome() {
    init_test_tracing();

    let package = Path::new("package.json");
    let parameters = EtlParameters::new()
        .with_source_connection_string("source")
        .with_dest_connection_string("dest");

    let succeeding = ProcessRunner::new("true");
    assert!(succeeding.run(package, &parameters).await.unwrap());

    let failing = ProcessRunner::new("false");
    assert!(!failing.run(package, &parameters).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn process_runner_reports_unspawnable_engines() {
    init_test_tracing();

    let runner = ProcessRunner::new("/nonexistent/etl-engine");

    let error = runner
        .run(Path::new("package.json"), &EtlParameters::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::RunnerSpawnFailed);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_to_success_converts_engine_failure_into_an_error() {
    init_test_tracing();

    let runner = ProcessRunner::new("false");

    let error = run_to_success(&runner, Path::new("package.json"), &EtlParameters::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::RunnerFailed);
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_runner_requires_both_connection_strings() {
    init_test_tracing();

    let runner = CopyRunner::new();
    let parameters = EtlParameters::new().with_source_connection_string("postgres://localhost");

    let error = runner
        .run(&products_package_path(), &parameters)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MissingParameter);
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_runner_rejects_malformed_packages() {
    init_test_tracing();

    let runner = CopyRunner::new();
    let parameters = EtlParameters::new()
        .with_source_connection_string("postgres://localhost")
        .with_dest_connection_string("postgres://localhost");

    // The schema script is not a JSON descriptor.
    let error = runner
        .run(&fixture_path("products.sql"), &parameters)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPackage);

    let error = runner
        .run(&fixture_path("does_not_exist.json"), &parameters)
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPackage);
}
