use std::fs;

use ot::config::jsonc::strip_comments;
use ot::config::model::{Hook, StepAction};
use ot::config::{load_config, parse_config_str, validate_config};

const SAMPLE: &str = r#"{
  // continuous integration job
  "workflows": {
    "ci": [
      { "name": "lint", "cmd": "bun lint" },
      {
        "name": "test",
        "dependsOn": ["lint"],
        "branches": ["!wip-*"],
        "bun": { "script": "test", "timeout": 60000, "dependsOn": ["^test"] }
      },
      {
        "name": "sync-env",
        "worktree:cp": { "from": "worktree:main", "files": [".env*"], "allowMissing": true }
      }
    ],
    /* record form */
    "release": { "steps": [{ "name": "tag", "cmd": "git tag" }] }
  },
  "worktree": {
    "defaults": { "base_dir": "../wts" },
    "hooks": {
      "post_create": [
        { "type": "copy", "from": ".env", "to": ".env" },
        { "cmd": "bun install" }
      ]
    }
  }
}"#;

#[test]
fn parses_jsonc_sample() {
    let cfg = parse_config_str(SAMPLE).unwrap();
    validate_config(&cfg).unwrap();

    let ci = cfg.workflows.get("ci").unwrap();
    assert_eq!(ci.steps().len(), 3);

    let test_step = &ci.steps()[1];
    assert_eq!(test_step.depends_on, vec!["lint".to_string()]);
    match test_step.action() {
        Some(StepAction::Script(action)) => {
            assert_eq!(action.script, "test");
            assert_eq!(action.timeout, Some(60000));
            assert_eq!(action.depends_on, vec!["^test".to_string()]);
        }
        other => panic!("expected script action, got {other:?}"),
    }

    let cp_step = &ci.steps()[2];
    match cp_step.action() {
        Some(StepAction::WorktreeCp(action)) => {
            assert_eq!(action.from, "worktree:main");
            assert!(action.allow_missing);
        }
        other => panic!("expected worktree:cp action, got {other:?}"),
    }

    let release = cfg.workflows.get("release").unwrap();
    assert_eq!(release.steps()[0].name, "tag");

    let worktree = cfg.worktree.unwrap();
    assert_eq!(worktree.defaults.base_dir.as_deref(), Some("../wts"));
    assert_eq!(worktree.hooks.post_create.len(), 2);
    assert!(matches!(worktree.hooks.post_create[0], Hook::Copy { .. }));
    assert!(matches!(worktree.hooks.post_create[1], Hook::Cmd { .. }));
}

#[test]
fn comment_stripping_preserves_plain_json() {
    let json = r#"{"workflows": {"x": [{"name": "a", "cmd": "echo //"}]}}"#;
    assert_eq!(strip_comments(json), json);
}

#[test]
fn step_with_two_actions_is_rejected() {
    let bad = r#"{
      "workflows": {
        "ci": [{ "name": "both", "cmd": "echo x", "bun": { "script": "t" } }]
      }
    }"#;
    let cfg = parse_config_str(bad).unwrap();
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("exactly one action"), "got: {err}");
}

#[test]
fn step_without_any_action_is_rejected() {
    let bad = r#"{"workflows": {"ci": [{ "name": "idle" }]}}"#;
    let cfg = parse_config_str(bad).unwrap();
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("exactly one action"), "got: {err}");
}

#[test]
fn unknown_dependency_is_rejected() {
    let bad = r#"{"workflows": {"ci": [{ "name": "a", "cmd": "x", "dependsOn": ["ghost"] }]}}"#;
    let cfg = parse_config_str(bad).unwrap();
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("unknown dependency"), "got: {err}");
}

#[test]
fn dependency_cycle_is_rejected_before_any_run() {
    let bad = r#"{"workflows": {"ci": [
      { "name": "a", "cmd": "x", "dependsOn": ["b"] },
      { "name": "b", "cmd": "y", "dependsOn": ["a"] }
    ]}}"#;
    let cfg = parse_config_str(bad).unwrap();
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("cycle"), "got: {err}");
}

#[test]
fn duplicate_step_names_are_rejected() {
    let bad = r#"{"workflows": {"ci": [
      { "name": "a", "cmd": "x" },
      { "name": "a", "cmd": "y" }
    ]}}"#;
    let cfg = parse_config_str(bad).unwrap();
    let err = validate_config(&cfg).unwrap_err();
    assert!(err.to_string().contains("duplicate"), "got: {err}");
}

#[test]
fn empty_workflow_is_allowed() {
    let cfg = parse_config_str(r#"{"workflows": {"noop": []}}"#).unwrap();
    validate_config(&cfg).unwrap();
}

#[test]
fn discovery_finds_workflow_file_in_cwd() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("workflow.jsonc"),
        r#"{ "workflows": { "x": [{ "name": "a", "cmd": "echo" }] } } // eof"#,
    )
    .unwrap();

    let (cfg, path) = load_config(None, tmp.path(), Some(tmp.path())).unwrap();
    assert!(cfg.workflows.contains_key("x"));
    assert!(path.ends_with("workflow.jsonc"));
}

#[test]
fn discovery_walks_up_to_the_git_root() {
    let tmp = tempfile::tempdir().unwrap();
    let nested = tmp.path().join("packages/app");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        tmp.path().join("workflows.json"),
        r#"{ "workflows": { "root-level": [{ "name": "a", "cmd": "echo" }] } }"#,
    )
    .unwrap();

    let (cfg, _) = load_config(None, &nested, Some(tmp.path())).unwrap();
    assert!(cfg.workflows.contains_key("root-level"));
}

#[test]
fn discovery_reads_package_json_workflows_field() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("package.json"),
        r#"{ "name": "app", "workflows": { "dev": [{ "name": "serve", "cmd": "bun dev" }] } }"#,
    )
    .unwrap();

    let (cfg, path) = load_config(None, tmp.path(), Some(tmp.path())).unwrap();
    assert!(cfg.workflows.contains_key("dev"));
    assert!(path.ends_with("package.json"));
}

#[test]
fn discovery_checks_dot_config_at_git_root() {
    let tmp = tempfile::tempdir().unwrap();
    let nested = tmp.path().join("src");
    fs::create_dir_all(tmp.path().join(".config")).unwrap();
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        tmp.path().join(".config/workflow.jsonc"),
        r#"{ "workflows": { "hidden": [{ "name": "a", "cmd": "echo" }] } }"#,
    )
    .unwrap();

    let (cfg, _) = load_config(None, &nested, Some(tmp.path())).unwrap();
    assert!(cfg.workflows.contains_key("hidden"));
}

#[test]
fn explicit_config_path_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let custom = tmp.path().join("custom.jsonc");
    fs::write(
        &custom,
        r#"{ "workflows": { "picked": [{ "name": "a", "cmd": "echo" }] } }"#,
    )
    .unwrap();
    fs::write(
        tmp.path().join("workflow.json"),
        r#"{ "workflows": { "ignored": [{ "name": "b", "cmd": "echo" }] } }"#,
    )
    .unwrap();

    let (cfg, path) = load_config(Some(custom.as_path()), tmp.path(), Some(tmp.path())).unwrap();
    assert!(cfg.workflows.contains_key("picked"));
    assert_eq!(path, custom);
}

#[test]
fn missing_config_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_config(None, tmp.path(), Some(tmp.path())).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"), "got: {err}");
}
