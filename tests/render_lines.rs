use ot::engine::StepStatus;
use ot::render::{format_duration, ProgressRenderer};

fn plain_renderer() -> ProgressRenderer {
    colored::control::set_override(false);
    ProgressRenderer::with_tty(false)
}

#[test]
fn initial_lines_show_pending_icons_and_padded_names() {
    let mut renderer = plain_renderer();
    renderer.add_step("lint", StepStatus::Pending);
    renderer.add_step("build", StepStatus::Pending);

    let lines = renderer.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("○ lint"));
    assert!(lines[1].starts_with("○ build"));
    // Names are padded to a fixed 16 columns.
    assert!(lines[0].contains("lint        "));
}

#[test]
fn status_transitions_change_icon_and_text() {
    let mut renderer = plain_renderer();
    renderer.add_step("build", StepStatus::Pending);

    renderer.update_step("build", StepStatus::Running, None);
    assert!(renderer.lines()[0].contains('◐'));
    assert!(renderer.lines()[0].contains("running"));

    renderer.update_step("build", StepStatus::Done, Some(123));
    assert!(renderer.lines()[0].contains('✓'));
    assert!(renderer.lines()[0].contains("123ms"));
}

#[test]
fn failed_and_skipped_render_distinctly() {
    let mut renderer = plain_renderer();
    renderer.add_step("a", StepStatus::Pending);
    renderer.add_step("b", StepStatus::Skipped);

    renderer.update_step("a", StepStatus::Failed, Some(2500));
    let lines = renderer.lines();
    assert!(lines[0].contains('✗'));
    assert!(lines[0].contains("failed"));
    assert!(lines[0].contains("2.50s"));
    assert!(lines[1].contains("skipped"));
}

#[test]
fn nested_tasks_indent_under_their_step() {
    let mut renderer = plain_renderer();
    renderer.add_step("test", StepStatus::Running);
    renderer.register_nested(
        "test",
        &["engine#test".to_string(), "hcl#test".to_string()],
    );

    let lines = renderer.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("  ○ engine#test"));
    assert!(lines[2].starts_with("  ○ hcl#test"));

    renderer.update_nested("test", "engine#test", StepStatus::Done, Some(42));
    assert!(renderer.lines()[1].contains("42ms"));
}

#[test]
fn terminal_step_state_collapses_nested_frame() {
    let mut renderer = plain_renderer();
    renderer.add_step("test", StepStatus::Running);
    renderer.register_nested("test", &["a#t".to_string()]);
    assert_eq!(renderer.lines().len(), 2);

    renderer.update_step("test", StepStatus::Done, Some(10));
    assert_eq!(renderer.lines().len(), 1);
}

#[test]
fn duration_thresholds() {
    assert_eq!(format_duration(999), "999ms");
    assert_eq!(format_duration(1000), "1.00s");
}
