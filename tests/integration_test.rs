//! Drives the built binary over small source trees on disk, checking the
//! rendered report and the exit status.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run_advisor(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_include-advisor"))
        .args(args)
        .output()
        .expect("failed to execute include-advisor");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    (output.status.success(), format!("{}{}", stdout, stderr))
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_unused_include_is_reported() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "used.h", "#define USED_VALUE 1\n");
    write_file(dir.path(), "unused.h", "#define UNUSED_VALUE 2\n");
    write_file(
        dir.path(),
        "main.cc",
        "#include \"used.h\"\n#include \"unused.h\"\n\nint main() { return USED_VALUE; }\n",
    );

    let main_cc = dir.path().join("main.cc");
    let (success, output) = run_advisor(&[main_cc.to_str().unwrap()]);

    assert!(!success, "unused include should fail the run. Output: {}", output);
    assert!(output.contains("should remove these lines:"), "Output: {}", output);
    assert!(output.contains("- #include \"unused.h\""), "Output: {}", output);
    assert!(
        output.contains("#include \"used.h\"  // for USED_VALUE"),
        "Output: {}",
        output
    );
}

#[test]
fn test_clean_file_passes() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "used.h", "#define USED_VALUE 1\n");
    write_file(
        dir.path(),
        "main.cc",
        "#include \"used.h\"\n\nint main() { return USED_VALUE; }\n",
    );

    let main_cc = dir.path().join("main.cc");
    let (success, output) = run_advisor(&[main_cc.to_str().unwrap()]);

    assert!(success, "clean file should pass. Output: {}", output);
    assert!(output.contains("correct #includes"), "Output: {}", output);
}

#[test]
fn test_keep_pragma_preserves_unused_include() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "unused.h", "#define UNUSED_VALUE 2\n");
    write_file(
        dir.path(),
        "main.cc",
        "#include \"unused.h\"  // IWYU pragma: keep\n\nint main() { return 0; }\n",
    );

    let main_cc = dir.path().join("main.cc");
    let (success, output) = run_advisor(&[main_cc.to_str().unwrap()]);

    assert!(success, "kept include should not be flagged. Output: {}", output);
}

#[test]
fn test_transitive_macro_use_suggests_direct_include() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "inner.h", "#define INNER_VALUE 3\n");
    write_file(dir.path(), "outer.h", "#include \"inner.h\"\n");
    write_file(
        dir.path(),
        "main.cc",
        "#include \"outer.h\"\n\nint main() { return INNER_VALUE; }\n",
    );

    let main_cc = dir.path().join("main.cc");
    let (success, output) = run_advisor(&[main_cc.to_str().unwrap()]);

    assert!(!success, "transitive use should be flagged. Output: {}", output);
    assert!(output.contains("should add these lines:"), "Output: {}", output);
    assert!(
        output.contains("#include \"inner.h\"  // for INNER_VALUE"),
        "Output: {}",
        output
    );
    assert!(output.contains("- #include \"outer.h\""), "Output: {}", output);
}

#[test]
fn test_associated_header_is_never_removed() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "foo.h", "#define FOO_LIMIT 10\n");
    write_file(
        dir.path(),
        "foo.cc",
        "#include \"foo.h\"\n\nint limit() { return FOO_LIMIT; }\n",
    );

    let foo_cc = dir.path().join("foo.cc");
    let (success, output) = run_advisor(&[foo_cc.to_str().unwrap()]);

    assert!(success, "associated header should be kept. Output: {}", output);
}

#[test]
fn test_check_also_glob_reports_headers_too() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "dep.h", "#define DEP_VALUE 4\n");
    write_file(
        dir.path(),
        "api.h",
        "#include \"dep.h\"\n#define API_VALUE DEP_VALUE\n",
    );
    write_file(
        dir.path(),
        "main.cc",
        "#include \"api.h\"\n\nint main() { return API_VALUE; }\n",
    );

    let main_cc = dir.path().join("main.cc");
    let glob = format!("{}/api.h", dir.path().to_str().unwrap());
    let (_, output) = run_advisor(&["--check-also", &glob, main_cc.to_str().unwrap()]);

    // api.h is in scope thanks to the glob, and its dep.h include is used
    // by the deferred macro-in-macro reference.
    assert!(
        output.contains("#include \"dep.h\"  // for DEP_VALUE"),
        "Output: {}",
        output
    );
}

#[test]
fn test_mapping_file_redirects_suggestion() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "impl.h", "#define IMPL_VALUE 5\n");
    write_file(dir.path(), "api.h", "#include \"impl.h\"\n");
    write_file(
        dir.path(),
        "main.cc",
        "#include \"api.h\"\n\nint main() { return IMPL_VALUE; }\n",
    );
    let impl_path = dir.path().join("impl.h");
    let api_path = dir.path().join("api.h");
    let mapping = format!(
        "- include: [\"\\\"{}\\\"\", private, \"\\\"{}\\\"\", public]\n",
        impl_path.display(),
        api_path.display()
    );
    write_file(dir.path(), "project.imp", &mapping);

    let main_cc = dir.path().join("main.cc");
    let mapping_file = dir.path().join("project.imp");
    let (success, output) = run_advisor(&[
        "--mapping-file",
        mapping_file.to_str().unwrap(),
        main_cc.to_str().unwrap(),
    ]);

    // impl.h is private and api.h is its public face, so the existing
    // include satisfies the use.
    assert!(success, "mapped use should be satisfied. Output: {}", output);
    assert!(
        output.contains("#include \"api.h\"  // for IMPL_VALUE"),
        "Output: {}",
        output
    );
}
