use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn playground(config: &Path, store: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shader-playground"))
        .env("SHADER_PLAYGROUND_CONFIG", config)
        .env("RUST_LOG", "warn")
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("failed to run shader-playground")
}

fn fixture() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let root = TempDir::new().unwrap();
    let store = root.path().join("shaders");
    fs::create_dir_all(store.join("fractals")).unwrap();
    fs::write(
        store.join("loop.frag"),
        "#include <common>\nvoid mainImage() {\n    fragColor = vec4(palette(fTime), 1.0);\n}\n",
    )
    .unwrap();
    fs::write(
        store.join("common.glsl"),
        "vec3 palette(float t) { return vec3(0.5 + 0.5 * cos(t)); }\n",
    )
    .unwrap();
    fs::write(
        store.join("fractals/mandel.frag"),
        "void mainImage() { fragColor = vec4(1.0); }\n",
    )
    .unwrap();
    fs::write(store.join("broken.frag"), "#include <missing>\n").unwrap();

    let config = root.path().join("config.toml");
    fs::write(&config, "window_size = [640, 480]\n").unwrap();
    (root, config, store)
}

#[test]
fn list_prints_sorted_shader_names() {
    let (_root, config, store) = fixture();
    let output = playground(&config, &store, &["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = stdout.lines().collect();
    assert_eq!(names, ["broken", "fractals/mandel", "loop"]);
}

#[test]
fn preprocess_prints_wrapped_source_with_includes_inlined() {
    let (_root, config, store) = fixture();
    let output = playground(&config, &store, &["preprocess", "loop"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("#version 330 core"));
    assert!(stdout.contains("#line 1\n"));
    assert!(stdout.contains("vec3 palette(float t)"));
    assert!(stdout.contains("fragColor = vec4(palette(fTime), 1.0);"));
    assert!(!stdout.contains("#include"));
}

#[test]
fn preprocess_honours_gl_version_flag() {
    let (_root, config, store) = fixture();
    let output = playground(
        &config,
        &store,
        &["preprocess", "fractals/mandel", "--gl-version", "4.5"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("#version 450 core"));
}

#[test]
fn preprocess_fails_for_missing_shader_or_include() {
    let (_root, config, store) = fixture();
    let missing = playground(&config, &store, &["preprocess", "nowhere"]);
    assert!(!missing.status.success());

    let broken = playground(&config, &store, &["preprocess", "broken"]);
    assert!(!broken.status.success());
    let stderr = String::from_utf8(broken.stderr).unwrap();
    assert!(stderr.contains("broken"));
}

#[test]
fn invalid_config_file_is_reported() {
    let (root, _config, store) = fixture();
    let bad = root.path().join("bad.toml");
    fs::write(&bad, "window_size = [0, 480]\n").unwrap();
    let output = playground(&bad, &store, &["list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("window_size"));
}
