#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

const MISSING_PORT: &str = "/dev/scanlink-test-missing-port";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "scanlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn scanlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scanlink"))
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("SCANLINK_PORT")
        .env_remove("SCANLINK_BAUD")
        .env_remove("SCANLINK_OCR_COMMAND")
        .output()
        .expect("scanlink should run")
}

#[test]
fn encode_writes_reference_frame() {
    let dir = unique_temp_dir("encode");
    let payload = dir.join("label.jpg");
    let frame = dir.join("label.frame");
    std::fs::write(&payload, vec![0x5Au8; 1000]).unwrap();

    let output = scanlink(&[
        "--format",
        "json",
        "encode",
        "--identifier",
        "1234567890123",
        "--file",
        payload.to_str().unwrap(),
        "--out",
        frame.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"frame_size\":1017"));

    let bytes = std::fs::read(&frame).unwrap();
    assert_eq!(bytes.len(), 1017);
    assert_eq!(&bytes[..4], &[0xE8, 0x03, 0x00, 0x00]);
    assert!(bytes[4..1004].iter().all(|b| *b == 0x5A));
    assert_eq!(&bytes[1004..], b"1234567890123");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_without_out_writes_raw_bytes_to_stdout() {
    let dir = unique_temp_dir("encode-stdout");
    let payload = dir.join("empty.bin");
    std::fs::write(&payload, b"").unwrap();

    let output = scanlink(&[
        "encode",
        "-i",
        "6901234567892",
        "-f",
        payload.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert_eq!(&output.stdout[..4], &[0, 0, 0, 0]);
    assert_eq!(&output.stdout[4..], b"6901234567892");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_rejects_wrong_identifier_length_with_60() {
    let dir = unique_temp_dir("encode-bad-id");
    let payload = dir.join("label.jpg");
    std::fs::write(&payload, b"x").unwrap();

    let output = scanlink(&[
        "encode",
        "--identifier",
        "123456789012",
        "--file",
        payload.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("13 bytes"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn search_filters_store_records() {
    let dir = unique_temp_dir("search");
    let store = dir.join("records.json");
    std::fs::write(
        &store,
        r#"[
  {"name": "张*", "phone": "13812345678", "raw_text": "", "identifier": "6901234567892"},
  {"name": "李*", "phone": "13912345678", "raw_text": "", "identifier": "6901234567893"}
]"#,
    )
    .unwrap();

    let output = scanlink(&[
        "--format",
        "json",
        "search",
        store.to_str().unwrap(),
        "139",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6901234567893"));
    assert!(!stdout.contains("6901234567892"));

    let output = scanlink(&["--format", "pretty", "search", store.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("张* - 13812345678 - 6901234567892"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn search_missing_store_returns_1() {
    let dir = unique_temp_dir("search-missing");
    let output = scanlink(&["search", dir.join("nope.json").to_str().unwrap(), "x"]);
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_to_missing_port_returns_3() {
    let dir = unique_temp_dir("send-missing");
    let payload = dir.join("label.jpg");
    std::fs::write(&payload, b"image").unwrap();

    let output = scanlink(&[
        "send",
        MISSING_PORT,
        "--identifier",
        "1234567890123",
        "--file",
        payload.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains(MISSING_PORT));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_on_missing_port_returns_3() {
    let output = scanlink(&["listen", MISSING_PORT, "--count", "1"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn watch_missing_directory_fails_before_opening_port() {
    let dir = unique_temp_dir("watch-missing");
    let output = scanlink(&[
        "watch",
        MISSING_PORT,
        dir.join("captures").to_str().unwrap(),
        "--once",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("watch failed"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_name_and_version() {
    let output = scanlink(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("scanlink {}", env!("CARGO_PKG_VERSION"))
    );
}
