use std::{
    env,
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

/// Stamps `SENSIBO_VERSION` from the nearest git tag. Builds outside a
/// checkout fall back to the manifest version plus a build timestamp.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let version = match git_describe() {
        Some(tag) if tag.ends_with("-dirty") => format!("{}-{}", tag, timestamp()),
        Some(tag) => tag,
        None => {
            let manifest = env::var("CARGO_PKG_VERSION").unwrap_or_default();
            format!("{}-{}", manifest, timestamp())
        }
    };

    println!("cargo:rustc-env=SENSIBO_VERSION={}", version);
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    let version = described.strip_prefix('v').unwrap_or(described);
    (!version.is_empty()).then(|| version.to_string())
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
