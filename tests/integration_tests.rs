//! Integration tests for the ergo CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to get an ergo command isolated from the user's config
fn ergo(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ergo").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".xdg"))
        .env("HOME", tmp.path())
        .env_remove("ERGO_WORKSPACE")
        .env_remove("ERGO_BACKEND")
        .env_remove("ERGO_AUTOSAVE_SECS")
        .env_remove("ERGO_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    ergo(&tmp).arg("init").assert().success();
    tmp
}

/// Helper to create a workspace with an active session on the sample checklist
fn setup_session() -> TempDir {
    let tmp = setup_workspace();
    ergo(&tmp)
        .args(["session", "new", "A사업장"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["checklist", "template", "--load"])
        .assert()
        .success();
    tmp
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Session id of the active session, read from `session show`
fn active_session_id(tmp: &TempDir) -> String {
    let out = stdout_of(ergo(tmp).args(["session", "show", "-f", "tsv"]));
    out.lines()
        .find_map(|l| l.strip_prefix("세션\t"))
        .unwrap_or_default()
        .to_string()
}

fn files_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_workspace_structure() {
    let tmp = TempDir::new().unwrap();
    ergo(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized ergo workspace"));

    assert!(tmp.path().join(".ergo/config.yaml").is_file());
    assert!(tmp.path().join("saved_sessions/backups").is_dir());
}

#[test]
fn test_init_twice_reports_existing_workspace() {
    let tmp = setup_workspace();
    ergo(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    ergo(&tmp)
        .args(["session", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an ergo workspace"));
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn test_editing_without_session_fails() {
    let tmp = setup_workspace();
    ergo(&tmp)
        .args(["checklist", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no active session"));
}

#[test]
fn test_session_new_requires_workplace_without_terminal() {
    let tmp = setup_workspace();
    ergo(&tmp)
        .args(["session", "new"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no workplace given"));
}

#[test]
fn test_session_new_rejects_blank_workplace() {
    let tmp = setup_workspace();
    ergo(&tmp).args(["session", "new", "  "]).assert().failure();
}

#[test]
fn test_session_new_starts_session() {
    let tmp = setup_workspace();
    ergo(&tmp)
        .args(["session", "new", "A사업장"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started session A사업장_"));

    let id = active_session_id(&tmp);
    assert!(id.starts_with("A사업장_"));
    assert!(tmp.path().join(".ergo/draft.json").is_file());
}

#[test]
fn test_session_save_list_and_reopen() {
    let tmp = setup_session();
    let id = active_session_id(&tmp);

    ergo(&tmp)
        .args(["session", "save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));
    assert!(tmp
        .path()
        .join("saved_sessions")
        .join(format!("{}.xlsx", id))
        .is_file());

    let list = stdout_of(ergo(&tmp).args(["session", "list", "-f", "tsv"]));
    assert!(list.lines().any(|l| l.starts_with(&format!("*\t{}", id))));

    ergo(&tmp).args(["session", "close"]).assert().success();
    ergo(&tmp).args(["checklist", "list"]).assert().failure();

    ergo(&tmp)
        .args(["session", "open", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened session"));
    ergo(&tmp)
        .args(["checklist", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("부품조립"));
}

#[test]
fn test_second_save_keeps_backup() {
    let tmp = setup_session();
    ergo(&tmp).args(["session", "save"]).assert().success();
    ergo(&tmp)
        .args(["session", "save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Previous save kept at"));
    assert_eq!(files_in(&tmp.path().join("saved_sessions/backups")).len(), 1);
}

#[test]
fn test_new_session_saves_the_previous_one() {
    let tmp = setup_session();
    let first = active_session_id(&tmp);

    ergo(&tmp)
        .args(["session", "new", "B사업장", "--suffix"])
        .assert()
        .success();
    assert!(files_in(&tmp.path().join("saved_sessions")).contains(&format!("{}.xlsx", first)));
    assert!(active_session_id(&tmp).starts_with("B사업장_"));
}

#[test]
fn test_open_unknown_session_fails() {
    let tmp = setup_workspace();
    ergo(&tmp)
        .args(["session", "open", "없는세션"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("saved session not found"));
}

#[test]
fn test_sqlite_backend_from_environment() {
    let tmp = setup_session();
    ergo(&tmp)
        .env("ERGO_BACKEND", "sqlite")
        .args(["session", "save"])
        .assert()
        .success();
    assert!(tmp.path().join("saved_sessions/sessions.db").is_file());

    let list = stdout_of(
        ergo(&tmp)
            .env("ERGO_BACKEND", "sqlite")
            .args(["session", "list", "-f", "tsv"]),
    );
    assert!(list.contains("A사업장"));
}

#[test]
fn test_session_import_workbook() {
    let tmp = setup_session();
    let id = active_session_id(&tmp);
    ergo(&tmp).args(["session", "save"]).assert().success();

    let other = setup_workspace();
    let saved = tmp.path().join("saved_sessions").join(format!("{}.xlsx", id));
    ergo(&other)
        .args(["session", "import"])
        .arg(&saved)
        .assert()
        .success();
    assert_eq!(active_session_id(&other), id);
}

// ============================================================================
// Overview & checklist
// ============================================================================

#[test]
fn test_overview_set_and_show() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["overview", "set", "소재지", "경기도 안산시"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["overview", "show", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("사업장명\tA사업장"))
        .stdout(predicate::str::contains("소재지\t경기도 안산시"));
}

#[test]
fn test_overview_unknown_field_fails() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["overview", "set", "주소", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown overview field"));
}

#[test]
fn test_checklist_add_with_marks() {
    let tmp = setup_session();
    ergo(&tmp)
        .args([
            "checklist", "add", "A회사", "생산1팀", "조립1반", "용접", "-m", "1=O", "-m", "3=△",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1호, 3호(잠재)"));

    let list = stdout_of(ergo(&tmp).args(["checklist", "list", "--unit", "조립1반", "-f", "tsv"]));
    assert_eq!(list.lines().count(), 4);
    assert!(list.contains("용접\t1호, 3호(잠재)"));
}

#[test]
fn test_checklist_add_rejects_bad_mark() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "add", "A회사", "생산1팀", "조립1반", "용접", "-m", "13=O"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_checklist_merge_rows() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "merge", "1", "2", "--name", "조립작업"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 rows"));

    let list = stdout_of(ergo(&tmp).args(["checklist", "list", "-f", "tsv"]));
    assert!(list.contains("조립작업"));
    assert!(!list.contains("나사체결"));
    assert_eq!(list.lines().count(), 5);
}

#[test]
fn test_checklist_merge_requires_name() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "merge", "1", "2", "--name", " "])
        .assert()
        .failure();
}

#[test]
fn test_checklist_remove_needs_confirmation() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "remove", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ergo(&tmp)
        .args(["checklist", "remove", "3", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("포장반"));
}

#[test]
fn test_checklist_set_renames_task() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "set", "1", "--task", "부품 조립", "-m", "1=X"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["checklist", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("부품 조립\t3호(잠재), 11호"));
}

#[test]
fn test_checklist_tree() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["checklist", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("A회사"))
        .stdout(predicate::str::contains("검사2반"))
        .stdout(predicate::str::contains("성능검사"));
}

#[test]
fn test_checklist_template_file_round_trip() {
    let tmp = setup_session();
    let path = tmp.path().join("template.csv");
    ergo(&tmp)
        .args(["checklist", "template", "-o"])
        .arg(&path)
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().starts_with("회사명,소속,반,단위작업명,1호"));

    ergo(&tmp)
        .args(["checklist", "import"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 5 row(s)"));
}

#[test]
fn test_checklist_import_xlsx_template() {
    let tmp = setup_session();
    let path = tmp.path().join("template.xlsx");
    ergo(&tmp)
        .args(["checklist", "template", "-o"])
        .arg(&path)
        .assert()
        .success();
    ergo(&tmp)
        .args(["checklist", "import"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 5 row(s)"));
}

#[test]
fn test_checklist_import_purges_missing_units() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["form", "set", "포장반", "조사자", "박민수"])
        .assert()
        .success();

    let path = tmp.path().join("upload.csv");
    fs::write(&path, "회사명,소속,반,단위작업명,1호\nA회사,생산1팀,조립1반,부품조립,O\n").unwrap();
    ergo(&tmp)
        .args(["checklist", "import"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("포장반"));

    ergo(&tmp)
        .args(["form", "show", "포장반"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("포장반"));
}

// ============================================================================
// Per-unit forms
// ============================================================================

#[test]
fn test_form_set_and_situation() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["form", "set", "조립1반", "date", "2024-05-01"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["form", "situation", "조립1반", "작업량", "증가", "--detail", "2024년 3월"])
        .assert()
        .success();

    ergo(&tmp)
        .args(["form", "show", "조립1반", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("조사일시\t2024-05-01"))
        .stdout(predicate::str::contains("부서명\t생산1팀"))
        .stdout(predicate::str::contains("작업량\t증가\t2024년 3월"));
}

#[test]
fn test_form_rejects_unknown_unit() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["form", "show", "없는반"])
        .assert()
        .failure();
}

#[test]
fn test_condition_rate_reports_total() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["condition", "rate", "조립1반", "1", "-w", "3", "-r", "계속(4)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("총점 12"));

    ergo(&tmp)
        .args(["condition", "show", "조립1반", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("약간 힘듦(3)\t계속(4)\t12"));
}

#[test]
fn test_condition_rate_rejects_invalid_option() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["condition", "rate", "조립1반", "1", "-w", "9"])
        .assert()
        .failure();
    ergo(&tmp)
        .args(["condition", "rate", "조립1반", "9", "-w", "3"])
        .assert()
        .failure();
}

#[test]
fn test_hazard_add_and_set() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["hazard", "add", "포장반"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["hazard", "set", "포장반", "1", "type", "force"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["hazard", "set", "포장반", "1", "중량물 무게(kg)", "25"])
        .assert()
        .success();

    ergo(&tmp)
        .args(["hazard", "list", "포장반", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"과도한 힘\""))
        .stdout(predicate::str::contains("\"25\""));
}

#[test]
fn test_hazard_measurement_of_other_category_fails() {
    let tmp = setup_session();
    ergo(&tmp).args(["hazard", "add", "포장반"]).assert().success();
    ergo(&tmp)
        .args(["hazard", "set", "포장반", "1", "type", "repetitive"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["hazard", "set", "포장반", "1", "중량물 무게(kg)", "25"])
        .assert()
        .failure();
}

// ============================================================================
// Workplace-wide sections
// ============================================================================

#[test]
fn test_detailed_add_set_remove() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["detailed", "add"])
        .assert()
        .success()
        .stdout(predicate::str::contains("정밀조사_1"));
    ergo(&tmp)
        .args(["detailed", "set", "정밀조사_1", "process", "도장"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["detailed", "set", "정밀조사_1", "tool", "RULA", "--row", "1"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["detailed", "list", "정밀조사_1", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("작업공정명\t도장"))
        .stdout(predicate::str::contains("RULA"));

    ergo(&tmp)
        .args(["detailed", "remove", "정밀조사_1", "--yes"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["detailed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No detailed investigations"));
}

#[test]
fn test_symptom_set_appends_row() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["symptom", "set", "기초현황", "1", "응답자(명)", "12"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["symptom", "show", "basic", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("조립1반\t12"));
}

#[test]
fn test_plan_is_seeded_from_burdens() {
    let tmp = setup_session();
    let plan = stdout_of(ergo(&tmp).args(["plan", "show", "-f", "tsv"]));
    assert_eq!(plan.lines().count(), 6);

    ergo(&tmp).args(["plan", "add-row"]).assert().success();
    ergo(&tmp)
        .args(["plan", "set", "6", "개선방안", "보조대차 도입"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["plan", "show", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("보조대차 도입"));
}

// ============================================================================
// Report & snapshot
// ============================================================================

#[test]
fn test_report_writes_workbook() {
    let tmp = setup_session();
    ergo(&tmp)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let reports: Vec<String> = files_in(tmp.path())
        .into_iter()
        .filter(|f| f.starts_with("근골격계_유해요인조사_A사업장_") && f.ends_with(".xlsx"))
        .collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_report_document_to_stdout() {
    let tmp = setup_session();
    ergo(&tmp)
        .args(["report", "--document"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# 근골격계 유해요인조사 보고서"))
        .stdout(predicate::str::contains("## 체크리스트"))
        .stdout(predicate::str::contains("## 개선계획서"));
}

#[test]
fn test_snapshot_round_trip() {
    let tmp = setup_session();
    let path = tmp.path().join("snapshot.json");
    ergo(&tmp)
        .args(["overview", "set", "업종", "자동차부품"])
        .assert()
        .success();
    ergo(&tmp)
        .args(["snapshot", "export", "-o"])
        .arg(&path)
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("ergo-survey-snapshot"));

    ergo(&tmp).args(["session", "new", "B사업장"]).assert().success();
    ergo(&tmp)
        .args(["snapshot", "import"])
        .arg(&path)
        .assert()
        .success();
    ergo(&tmp)
        .args(["overview", "show", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("업종\t자동차부품"));
}

#[test]
fn test_snapshot_import_rejects_other_json() {
    let tmp = setup_workspace();
    let path = tmp.path().join("other.json");
    fs::write(&path, r#"{"format":"something-else","version":1,"session_id":"x","workplace":"y"}"#)
        .unwrap();
    ergo(&tmp)
        .args(["snapshot", "import"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a session snapshot"));
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    ergo(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ergo"));
}

#[test]
fn test_global_workspace_flag() {
    let tmp = setup_session();
    let elsewhere = TempDir::new().unwrap();
    ergo(&elsewhere)
        .arg("--workspace")
        .arg(tmp.path())
        .args(["checklist", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("외관검사"));
}
