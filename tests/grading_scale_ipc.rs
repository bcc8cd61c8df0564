use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn standard_bands() -> serde_json::Value {
    json!([
        { "grade": "F", "minScore": 0, "maxScore": 39, "remark": "Fail" },
        { "grade": "D", "minScore": 40, "maxScore": 59, "remark": "Pass" },
        { "grade": "C", "minScore": 60, "maxScore": 69, "remark": "Good" },
        { "grade": "B", "minScore": 70, "maxScore": 79, "remark": "Very Good" },
        { "grade": "A", "minScore": 80, "maxScore": 100, "remark": "Excellent" }
    ])
}

#[test]
fn validate_sorts_bands_highest_first() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "scale.validate",
        json!({ "bands": standard_bands() }),
    );
    assert_eq!(resp["ok"], true, "expected success: {}", resp);
    let grades: Vec<&str> = resp["result"]["bands"]
        .as_array()
        .expect("bands")
        .iter()
        .map(|b| b["grade"].as_str().expect("grade"))
        .collect();
    assert_eq!(grades, vec!["A", "B", "C", "D", "F"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn validate_rejects_gaps_and_overlaps_with_the_offenders_named() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let gap = request(
        &mut stdin,
        &mut reader,
        "1",
        "scale.validate",
        json!({ "bands": [
            { "grade": "F", "minScore": 0, "maxScore": 39 },
            { "grade": "D", "minScore": 41, "maxScore": 100 }
        ]}),
    );
    assert_eq!(gap["ok"], false);
    let errors = gap["error"]["details"]["errors"].as_array().expect("errors");
    assert_eq!(errors[0]["code"], "incomplete_coverage");
    assert_eq!(errors[0]["after"], "F");

    let overlap = request(
        &mut stdin,
        &mut reader,
        "2",
        "scale.validate",
        json!({ "bands": [
            { "grade": "F", "minScore": 0, "maxScore": 40 },
            { "grade": "D", "minScore": 40, "maxScore": 100 }
        ]}),
    );
    assert_eq!(overlap["ok"], false);
    let errors = overlap["error"]["details"]["errors"].as_array().expect("errors");
    assert_eq!(errors[0]["code"], "overlap_detected");
    assert_eq!(errors[0]["first"], "F");
    assert_eq!(errors[0]["second"], "D");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn validate_accepts_string_scores_and_rejects_bad_ranges() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let ok_resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "scale.validate",
        json!({ "bands": [
            { "grade": "Fail", "minScore": "0", "maxScore": "49" },
            { "grade": "Pass", "minScore": "50", "maxScore": "100" }
        ]}),
    );
    assert_eq!(ok_resp["ok"], true, "expected success: {}", ok_resp);

    let bad = request(
        &mut stdin,
        &mut reader,
        "2",
        "scale.validate",
        json!({ "bands": [
            { "grade": "Fail", "minScore": "zero", "maxScore": 49 },
            { "grade": "Pass", "minScore": 90, "maxScore": 50 }
        ]}),
    );
    assert_eq!(bad["ok"], false);
    let codes: Vec<&str> = bad["error"]["details"]["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .map(|e| e["code"].as_str().expect("code"))
        .collect();
    assert_eq!(codes, vec!["invalid_range", "invalid_range"]);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn grade_resolution_covers_the_boundary_cases() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    for (id, percentage, expected) in [
        ("1", json!(40), "D"),
        ("2", json!(100), "A"),
        ("3", json!(39.999), "F"),
        ("4", json!("72.5"), "B"),
    ] {
        let resp = request(
            &mut stdin,
            &mut reader,
            id,
            "scale.resolveGrade",
            json!({ "bands": standard_bands(), "percentage": percentage }),
        );
        assert_eq!(resp["ok"], true);
        assert_eq!(resp["result"]["grade"], expected, "percentage case {}", id);
    }

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn missing_scale_resolves_to_the_sentinels() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let no_bands = request(
        &mut stdin,
        &mut reader,
        "1",
        "scale.resolveGrade",
        json!({ "percentage": 75 }),
    );
    assert_eq!(no_bands["ok"], true);
    assert_eq!(no_bands["result"]["grade"], "N/A");

    let null_bands = request(
        &mut stdin,
        &mut reader,
        "2",
        "scale.resolveGrade",
        json!({ "bands": null, "percentage": 75 }),
    );
    assert_eq!(null_bands["result"]["grade"], "N/A");

    let unreadable = request(
        &mut stdin,
        &mut reader,
        "3",
        "scale.resolveGrade",
        json!({ "bands": standard_bands(), "percentage": "seventy" }),
    );
    assert_eq!(unreadable["result"]["grade"], "N/A");

    let remark = request(
        &mut stdin,
        &mut reader,
        "4",
        "scale.resolveRemark",
        json!({ "grade": "A" }),
    );
    assert_eq!(remark["ok"], true);
    assert_eq!(remark["result"]["remark"], serde_json::Value::Null);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn remark_lookup_matches_the_grade_exactly() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let hit = request(
        &mut stdin,
        &mut reader,
        "1",
        "scale.resolveRemark",
        json!({ "bands": standard_bands(), "grade": "B" }),
    );
    assert_eq!(hit["result"]["remark"], "Very Good");

    let miss = request(
        &mut stdin,
        &mut reader,
        "2",
        "scale.resolveRemark",
        json!({ "bands": standard_bands(), "grade": "b" }),
    );
    assert_eq!(miss["result"]["remark"], serde_json::Value::Null);

    drop(stdin);
    let _ = child.wait();
}
