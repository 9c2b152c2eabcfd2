use std::path::{Path, PathBuf};

/// Resolve the job definitions directory.
///
/// Priority:
/// 1. `--definitions-dir` flag / `LIFE_JOBS_DIR` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for a `jobs/` directory holding YAML documents
/// 3. Fall back to `~/.life/jobs`
pub fn resolve_definitions_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.clone();
    loop {
        let candidate = dir.join("jobs");
        if has_definitions(&candidate) {
            return candidate;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    home::home_dir()
        .map(|h| h.join(".life").join("jobs"))
        .unwrap_or_else(|| cwd.join("jobs"))
}

fn has_definitions(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|e| {
        matches!(
            e.path().extension().and_then(|x| x.to_str()),
            Some("yaml") | Some("yml")
        )
    })
}
