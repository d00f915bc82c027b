//! Stamps the short commit hash into `--version` when building from a checkout.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|h| !h.is_empty());

    if let Some(hash) = hash {
        println!("cargo:rustc-env=TRAVELBOOK_GIT_HASH={hash}");
    }
}
