use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn write_frames(dir: &Path, names: &[&str]) {
    for (idx, name) in names.iter().enumerate() {
        fs::write(dir.join(name), [0x89, b'P', b'N', b'G', idx as u8]).expect("write frame");
    }
}

fn file_lines(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with("file ")).collect()
}

#[test]
fn help_lists_playlist_flags() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg("--help")
        .output()
        .expect("--help runs");

    assert!(output.status.success());
    let text = combined_output(&output);
    for flag in [
        "--ext",
        "--output",
        "--frame-duration",
        "--fps",
        "--hold-duration",
        "--hold-repeats",
        "--header",
        "--format",
        "--progress",
    ] {
        assert!(text.contains(flag), "help text missing {flag}: {text}");
    }
}

#[test]
fn writes_sorted_manifest_with_held_last_frame() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(
        tmp.path(),
        &["1700000000300.png", "1700000000100.png", "1700000000200.png"],
    );
    fs::write(tmp.path().join("canvas.json"), b"[]").expect("write non-frame");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--progress")
        .arg("plain")
        .output()
        .expect("snapreel runs");
    assert!(output.status.success(), "{}", combined_output(&output));

    let manifest = fs::read_to_string(tmp.path().join("files.txt")).expect("manifest exists");
    let files = file_lines(&manifest);
    assert_eq!(files.len(), 3 + 4);
    assert_eq!(files[0], "file '1700000000100.png'");
    assert_eq!(files[1], "file '1700000000200.png'");
    for line in &files[2..] {
        assert_eq!(*line, "file '1700000000300.png'");
    }

    let durations: Vec<&str> = manifest
        .lines()
        .filter(|l| l.starts_with("duration "))
        .collect();
    assert_eq!(
        durations,
        vec![
            "duration 0.1",
            "duration 0.1",
            "duration 0.1",
            "duration 9.0",
            "duration 9.0",
            "duration 9.0",
        ]
    );
    assert!(manifest.ends_with("file '1700000000300.png'\n"));

    let text = combined_output(&output);
    assert!(text.contains("[PROGRESS] manifest"), "missing plain progress: {text}");
    assert!(text.contains("Manifest summary:"), "missing summary: {text}");
    assert!(text.contains("frames=3"), "missing frame count: {text}");
}

#[test]
fn empty_directory_fails_without_writing() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(tmp.path().join("readme.txt"), b"no frames here").expect("write");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--progress")
        .arg("quiet")
        .output()
        .expect("snapreel runs");

    assert!(!output.status.success(), "empty listing unexpectedly succeeded");
    let text = combined_output(&output);
    assert!(text.contains("no .png files found"), "missing error context: {text}");
    assert!(!tmp.path().join("files.txt").exists());
}

#[test]
fn rerun_overwrites_previous_manifest() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(tmp.path(), &["a.png", "b.png"]);
    let manifest_path = tmp.path().join("files.txt");
    fs::write(&manifest_path, "file 'stale.png'\n".repeat(50)).expect("seed manifest");

    for _ in 0..2 {
        Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
            .arg(tmp.path())
            .arg("--progress")
            .arg("quiet")
            .assert()
            .success();
    }

    let manifest = fs::read_to_string(&manifest_path).expect("manifest exists");
    assert!(!manifest.contains("stale.png"));
    assert_eq!(file_lines(&manifest).len(), 2 + 4);
}

#[test]
fn custom_extension_output_and_timing() {
    let tmp = TempDir::new().expect("tempdir");
    let frames = tmp.path().join("frames");
    fs::create_dir_all(&frames).expect("mkdir frames");
    write_frames(&frames, &["b.JPG", "a.jpg", "c.png"]);
    let out = tmp.path().join("playlist.ffconcat");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(&frames)
        .arg("--ext")
        .arg("jpg")
        .arg("--output")
        .arg(&out)
        .arg("--fps")
        .arg("4")
        .arg("--hold-duration")
        .arg("2")
        .arg("--hold-repeats")
        .arg("1")
        .arg("--header")
        .arg("--progress")
        .arg("quiet")
        .output()
        .expect("snapreel runs");
    assert!(output.status.success(), "{}", combined_output(&output));

    let manifest = fs::read_to_string(&out).expect("manifest exists");
    assert_eq!(
        manifest,
        "ffconcat version 1.0\n\
         file 'a.jpg'\nduration 0.25\n\
         file 'b.JPG'\nduration 0.25\n\
         file 'b.JPG'\nduration 2.0\n\
         file 'b.JPG'\n"
    );
    assert!(!frames.join("files.txt").exists());
}

#[test]
fn json_format_lists_entries() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(tmp.path(), &["x.png"]);
    let out = tmp.path().join("manifest.json");

    Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&out)
        .arg("--progress")
        .arg("quiet")
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read json")).expect("valid json");
    let entries = parsed.as_array().expect("array of entries");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["file"], "x.png");
    assert_eq!(entries[0]["duration"], 0.1);
    assert!(entries[4]["duration"].is_null());
}

#[test]
fn conflicting_timing_flags_are_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(tmp.path(), &["a.png"]);

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--fps")
        .arg("10")
        .arg("--frame-duration")
        .arg("0.5")
        .output()
        .expect("snapreel runs");
    assert!(!output.status.success());
    assert!(!tmp.path().join("files.txt").exists());
}

#[test]
fn oversized_hold_repeats_fail_cleanly() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(tmp.path(), &["a.png"]);

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--hold-repeats")
        .arg("1000000000000")
        .arg("--progress")
        .arg("quiet")
        .output()
        .expect("snapreel runs");

    assert!(!output.status.success(), "huge hold count unexpectedly succeeded");
    let text = combined_output(&output);
    assert!(text.contains("hold repeats must be at most"), "missing bound error: {text}");
    assert!(!tmp.path().join("files.txt").exists());
}

#[test]
fn output_in_missing_directory_reports_write_failure() {
    let tmp = TempDir::new().expect("tempdir");
    write_frames(tmp.path(), &["a.png"]);
    let out = tmp.path().join("no-such-dir").join("files.txt");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("snapreel"))
        .arg(tmp.path())
        .arg("--output")
        .arg(&out)
        .arg("--progress")
        .arg("quiet")
        .output()
        .expect("snapreel runs");

    assert!(!output.status.success(), "write into missing dir unexpectedly succeeded");
    let text = combined_output(&output);
    assert!(text.contains("failed to write manifest"), "missing write context: {text}");
}
