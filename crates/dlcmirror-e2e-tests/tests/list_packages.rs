use dlcmirror_e2e_tests::{
    ROOT_MANIFEST_PATH, TestServer, create_test_config, init_tracing, publish_root,
    publish_secondary,
};
use dlcmirror_lib::cli::{ListPackagesParams, MirrorParams, run_list_packages, run_mirror};

#[tokio::test(flavor = "multi_thread")]
async fn test_list_packages_prints_urls_without_downloading_packages() {
    init_tracing();
    let server = TestServer::start().await.expect("start server");
    publish_root(&server, &[Some("dlc:core:idx.zip"), Some("dlc:gone:idx.zip")]);
    publish_secondary(
        &server,
        "dlc/core/idx.zip",
        &["dlc:core:a.zip", "dlc:core:b.pvr"],
    );
    let output = tempfile::tempdir().expect("tempdir");
    let listing = output.path().join("listing/urls.txt");

    let params = ListPackagesParams {
        app_config: create_test_config(&server.base_url(), output.path(), 4),
        log_file: output.path().join("debug.log"),
        output_path: Some(listing.clone()),
    };
    let count = run_list_packages(params).await.expect("listing should succeed");

    let lines: Vec<String> = std::fs::read_to_string(&listing)
        .expect("listing written")
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(count, 2);
    assert_eq!(
        lines,
        vec![server.url("dlc/core/a.zip"), server.url("dlc/core/b.pvr")]
    );
    assert_eq!(server.hits("dlc/core/a.zip"), 0);
    assert_eq!(server.hits("dlc/core/b.pvr"), 0);
    assert_eq!(server.hits(ROOT_MANIFEST_PATH), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_mirror_writes_json_report() {
    init_tracing();
    let server = TestServer::start().await.expect("start server");
    publish_root(&server, &[Some("dlc:gone:idx.zip")]);
    let output = tempfile::tempdir().expect("tempdir");
    let report_path = output.path().join("report.json");

    let params = MirrorParams {
        app_config: create_test_config(&server.base_url(), output.path(), 4),
        log_file: output.path().join("debug.log"),
        report_path: Some(report_path.clone()),
    };
    let report = run_mirror(params).await.expect("run should succeed");
    assert_eq!(report.secondary_manifests.skipped, 1);

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("report written"))
            .expect("valid JSON");
    assert_eq!(value["root_manifest"], "fresh");
    assert_eq!(value["secondary_manifests"]["skipped"], 1);
    assert_eq!(value["skipped"][0]["status"], 404);
    assert_eq!(value["skipped"][0]["role"], "secondary_manifest");
}
