fn main() {
    // Version suffix: CI-provided commit, else the local git short hash
    let git_hash = std::env::var("QUIZRUSH_BUILD_COMMIT")
        .ok()
        .map(|sha| sha.chars().take(7).collect::<String>())
        .filter(|sha| !sha.is_empty())
        .or_else(|| {
            std::process::Command::new("git")
                .args(["rev-parse", "--short", "HEAD"])
                .output()
                .ok()
                .filter(|o| o.status.success())
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rerun-if-env-changed=QUIZRUSH_BUILD_COMMIT");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
