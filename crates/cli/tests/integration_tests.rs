/// End-to-end tests for the dataset shell: spawn the binary, pipe commands in,
/// check stdout. The container persists between runs.
use byteorder::{BigEndian, WriteBytesExt};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Helper to run shell commands and capture stdout
fn run_cli_command(container: &Path, command: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_cli"))
        .env("DDS_CONTAINER", container.to_str().unwrap())
        .env("DDS_COMPRESSION", "zstd")
        .env("DDS_CHUNK_RECORDS", "16") // small chunks to exercise multi-chunk entries
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(command.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Writes a native WorldCup'98 log with one request per second.
fn write_wcup_log(path: &Path, n: u32) {
    let mut buf = Vec::new();
    for i in 0..n {
        buf.write_u32::<BigEndian>(894_000_000 + i).unwrap(); // timestamp
        buf.write_u32::<BigEndian>(i % 5).unwrap(); // client id
        buf.write_u32::<BigEndian>(1000 + i).unwrap(); // object id
        buf.write_u32::<BigEndian>(2048).unwrap(); // size
        buf.extend_from_slice(&[0, 2, (i % 3) as u8, (i % 2) as u8]);
    }
    fs::write(path, buf).unwrap();
}

#[test]
fn test_gen_and_info() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "GEN u 4 2 100 200 9\nINFO u\n");

    assert!(output.contains("OK (200 records)"));
    assert!(output.contains("<StreamDataset of length 200>"));
    assert!(output.contains("ts_range=[1, 200]"));
    assert!(output.contains("bye"));
}

#[test]
fn test_entries_persist_across_runs() {
    let dir = tempdir().unwrap();
    run_cli_command(dir.path(), "GEN a 2 2 10 50 1\nWINDOW a 10\n");

    let output = run_cli_command(dir.path(), "LIST\nINFO a\n");
    assert!(output.contains("(1 entries)"));
    assert!(output.contains("<StreamDataset of length 100>"));
    assert!(output.contains("ts_range=[1, 60]"));
}

#[test]
fn test_import_wcup() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("wc_day5_1");
    write_wcup_log(&log, 40);
    let container = dir.path().join("dds");

    let cmd = format!(
        "IMPORT WCUP {} wc\nIMPORT WCUP {} wc_obj method object_id\nINFO wc\nINFO wc_obj\n",
        log.display(),
        log.display()
    );
    let output = run_cli_command(&container, &cmd);

    assert!(output.contains("OK (40 records)"));
    assert!(output.contains("sid_field = \"type\""));
    assert!(output.contains("key_field = \"object_id\""));
    assert!(output.contains("streams={0, 1, 2}"));
    assert!(output.contains("key_range=[1000, 1039]"));
}

#[test]
fn test_merge_and_slice() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(
        dir.path(),
        "GEN a 2 2 10 30 1\nGEN b 2 2 10 30 2\nMERGE a b\nSLICE a s 10 20\nINFO s\n",
    );

    assert!(output.contains("OK (60 records)"));
    assert!(output.contains("OK (20 records)"));
    assert!(output.contains("ts_range=[11, 20]"));
}

#[test]
fn test_errors_keep_shell_alive() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "INFO nope\nFROB\nGEN ok 1 1 1 3\nLIST\n");

    assert!(output.contains("ERR"));
    assert!(output.contains("unknown command: FROB"));
    assert!(output.contains("ok\n(1 entries)"));
}
