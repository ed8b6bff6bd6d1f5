//! State file naming.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// State file of the budget bot, which has no watch jobs.
pub const DEFAULT_STATE_FILE: &str = "state.json";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"))
}

/// Make a job id safe and stable as a file name component.
pub fn sanitize_id(id: &str) -> String {
    unsafe_chars().replace_all(id.trim(), "_").into_owned()
}

/// `<dir>/state_<sanitized id>.json`
pub fn state_file_for(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("state_{}.json", sanitize_id(id)))
}
