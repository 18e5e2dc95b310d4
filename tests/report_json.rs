use covref::*;
use tempfile::tempdir;

#[test]
#[cfg(unix)]
fn test_report_lists_regressions_and_new_paths() {
    let tmp = tempdir().unwrap();
    let d = tmp.path();
    std::fs::write(d.join("coverage.csv"), "pkgA;80.0\nold;5.0\n").unwrap();
    std::fs::write(
        d.join("go_output.txt"),
        "ok  \tpkgA\t0.01s\tcoverage: 75.0% of statements\n\
ok  \tpkgB\t0.01s\tcoverage: 10.0% of statements\n",
    )
    .unwrap();
    let report_path = d.join("report.json");
    let cli = Cli {
        project_dir: Some(d.to_path_buf()),
        test_command: Some("cat go_output.txt".into()),
        report: Some(report_path.clone()),
        ..Cli::default()
    };
    assert_eq!(execute_cli(cli).unwrap(), Outcome::Regressed);

    let text = std::fs::read_to_string(&report_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["verdict"], "worse");
    assert_eq!(v["regressions"][0]["path"], "pkgA");
    assert_eq!(v["regressions"][0]["current"], 75.0);
    assert_eq!(v["regressions"][0]["reference"], 80.0);
    assert_eq!(v["new_paths"][0], "pkgB");
    assert_eq!(v["dropped_paths"][0], "old");
    assert_eq!(v["coverage"]["pkgB"], 10.0);
    assert!(v["generated_at"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_report_without_comparison_has_null_verdict() {
    let mut map = CoverageMap::new();
    map.insert("pkgA".into(), 1.0);
    let v = build_report(&map, None, None);
    assert!(v["verdict"].is_null());
    assert_eq!(v["regressions"].as_array().unwrap().len(), 0);
}
