use covref::*;

const GO_OUTPUT: &str = "\
go: downloading github.com/pkg/errors v0.9.1
ok  \tgithub.com/acme/proxy\t(cached)\tcoverage: 0.0% of statements [no tests to run]
ok  \tgithub.com/acme/proxy/router\t0.012s\tcoverage: 81.2% of statements
?   \tgithub.com/acme/proxy/cmd\t[no test files]
ok  \tgithub.com/acme/proxy/model\t0.004s\tcoverage: [no statements]
\tgithub.com/acme/proxy/api\t\tcoverage: 0.0% of statements

";

#[test]
fn test_parse_test_output_collects_every_package() {
    let map = parse_test_output(GO_OUTPUT);
    assert_eq!(map.len(), 5);
    assert_eq!(map["github.com/acme/proxy"], 0.0);
    assert_eq!(map["github.com/acme/proxy/router"], 81.2);
    assert_eq!(map["github.com/acme/proxy/cmd"], 0.0);
    assert_eq!(map["github.com/acme/proxy/model"], 0.0);
    assert_eq!(map["github.com/acme/proxy/api"], 0.0);
}

#[test]
fn test_download_notices_do_not_become_packages() {
    let map = parse_test_output(GO_OUTPUT);
    assert!(map.keys().all(|k| k.starts_with("github.com/acme")));
}

#[test]
fn test_duplicate_package_keeps_last_value() {
    let out = "ok  \tpkgA\t0.1s\tcoverage: 10.0% of statements\n\
ok  \tpkgA\t0.1s\tcoverage: 20.0% of statements\n";
    assert_eq!(parse_test_output(out)["pkgA"], 20.0);
}

#[test]
fn test_parse_line_reports_failed_packages() {
    let entry = parse_line("FAIL\tgithub.com/acme/proxy/router\t0.020s").unwrap();
    assert_eq!(entry.status, PackageStatus::Failed);
    assert_eq!(entry.percent, 0.0);
}
