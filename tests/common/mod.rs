//! Shared helpers for integration tests: stub tagging-tool executables.

#![cfg(unix)]
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `/bin/sh` stub into `dir` and returns its path.
pub fn write_stub_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write stub script");
    let mut perms = fs::metadata(&path).expect("stat stub script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub script");
    path
}

/// Stub tagging tool that prints the given JSON lines for any input file.
pub fn fake_ctags(dir: &Path, json_lines: &str) -> PathBuf {
    write_stub_script(
        dir,
        "fake-ctags",
        &format!("cat <<'EOF'\n{}\nEOF", json_lines),
    )
}

/// Stub tagging tool that sleeps longer than any test timeout.
pub fn sleeping_ctags(dir: &Path) -> PathBuf {
    write_stub_script(dir, "sleeping-ctags", "sleep 5")
}
