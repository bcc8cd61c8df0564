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

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health.check", json!({}));
    assert_eq!(health["ok"], true);
    assert!(health["result"]["version"].is_string());

    let components = json!([
        { "type": "CA", "percentage": 30, "order": 1 },
        { "type": "Exam", "percentage": 70, "order": 2 }
    ]);
    let validated = request(
        &mut stdin,
        &mut reader,
        "2",
        "structure.validate",
        json!({ "components": components }),
    );
    assert_eq!(validated["ok"], true);

    let bands = json!([
        { "grade": "Fail", "minScore": 0, "maxScore": 49 },
        { "grade": "Pass", "minScore": 50, "maxScore": 100 }
    ]);
    let scale = request(
        &mut stdin,
        &mut reader,
        "3",
        "scale.validate",
        json!({ "bands": bands }),
    );
    assert_eq!(scale["ok"], true);

    let aggregated = request(
        &mut stdin,
        &mut reader,
        "4",
        "results.aggregate",
        json!({
            "components": components,
            "scores": [{ "componentType": "CA", "value": 25 }],
            "bands": bands
        }),
    );
    assert_eq!(aggregated["ok"], true);

    let unknown = request(&mut stdin, &mut reader, "5", "workspace.select", json!({}));
    assert_eq!(unknown["ok"], false);
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_json_lines_get_a_bad_json_reply() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write junk");
    stdin.flush().expect("flush junk");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "bad_json");

    // The daemon keeps serving after a bad line.
    let health = request(&mut stdin, &mut reader, "1", "health.check", json!({}));
    assert_eq!(health["ok"], true);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn blank_lines_are_ignored() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin).expect("write blank");
    writeln!(stdin, "   ").expect("write whitespace");
    stdin.flush().expect("flush");

    let health = request(&mut stdin, &mut reader, "1", "health.check", json!({}));
    assert_eq!(health["ok"], true);

    drop(stdin);
    let _ = child.wait();
}
