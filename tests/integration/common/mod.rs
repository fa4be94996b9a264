use std::process::Command;

pub fn opalc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_opalc"))
}

/// Compile a source string through the library, asserting success.
pub fn compile(source: &str) -> String {
    match opal::compile(source) {
        Ok(out) => out,
        Err(err) => panic!("compilation failed: {err}"),
    }
}

/// Compile a source string, asserting failure.
pub fn compile_err(source: &str) -> opal::diagnostics::CompileError {
    match opal::compile(source) {
        Ok(out) => panic!("compilation unexpectedly succeeded:\n{out}"),
        Err(err) => err,
    }
}

/// Compile a source file through the CLI and return the emitted output.
pub fn compile_via_cli(source: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("test.opal");
    let out_path = dir.path().join("test.js");

    std::fs::write(&src_path, source).unwrap();

    let output = opalc()
        .arg("compile")
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "compilation failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out_path.exists(), "output file was not created");

    std::fs::read_to_string(&out_path).unwrap()
}
