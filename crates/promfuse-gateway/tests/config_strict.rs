#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promfuse_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
collect:
  paralel: true # typo should fail
targets:
  - url: "http://127.0.0.1:9100/metrics"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
targets:
  - url: "http://127.0.0.1:9100/metrics"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:9393");
    assert!(cfg.collect.parallel);
    assert!(cfg.collect.sort);
    assert!(!cfg.collect.abort_on_failure);
    assert_eq!(cfg.collect.fetch_pool_size, 100);
    assert_eq!(cfg.collect.render_pool_size, 900);
    assert_eq!(cfg.scrape.timeout_ms, 30_000);
    assert!(cfg.scrape.disable_compression);
}

#[test]
fn rejects_unsupported_version() {
    let bad = r#"
version: 2
targets:
  - url: "http://127.0.0.1:9100/metrics"
"#;
    config::load_from_str(bad).expect_err("must fail");
}

#[test]
fn rejects_empty_targets() {
    let bad = "version: 1\n";
    config::load_from_str(bad).expect_err("must fail");
}

#[test]
fn rejects_non_http_target() {
    let bad = r#"
version: 1
targets:
  - url: "ftp://127.0.0.1/metrics"
"#;
    config::load_from_str(bad).expect_err("must fail");
}

#[test]
fn rejects_label_without_separator() {
    let bad = r#"
version: 1
targets:
  - url: "http://127.0.0.1:9100/metrics"
    labels: ["not-a-pair"]
"#;
    config::load_from_str(bad).expect_err("must fail");
}

#[test]
fn rejects_zero_fetch_pool() {
    let bad = r#"
version: 1
collect:
  fetch_pool_size: 0
targets:
  - url: "http://127.0.0.1:9100/metrics"
"#;
    config::load_from_str(bad).expect_err("must fail");
}

#[test]
fn extra_labels_keep_order_and_strip_quotes() {
    let ok = r#"
version: 1
targets:
  - url: "http://127.0.0.1:9100/metrics"
    labels: ['app="api"', 'source=internet']
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(
        cfg.targets[0].extra_labels(),
        vec![
            ("app".to_string(), "api".to_string()),
            ("source".to_string(), "internet".to_string()),
        ]
    );
}
