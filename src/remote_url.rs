//! Optional enrichment: maps a canonical anchor to a browsable web URL on the
//! hosting service behind one of the repository's remotes.

use crate::RemoteInfo;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCP_REMOTE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^(?:ssh://)?(?:[\w.-]+@)?([\w.-]+)[:/](.+?)(?:\.git)?/?$").unwrap());

/// Returns the first browsable URL for the given remotes, tried in order.
/// Lines are 1-based. Unknown hosting services yield `None`.
pub fn first_remote_code_url(
	remote_urls: &[String],
	sha: &str,
	file: &str,
	line_start: u32,
	line_end: u32,
) -> Option<String> {
	remote_urls
		.iter()
		.find_map(|remote| remote_code_url(remote, sha, file, line_start, line_end))
}

/// Builds the browsable URL for one remote, when its host is a known hosting
/// service (GitHub, GitLab, Bitbucket).
pub fn remote_code_url(remote_url: &str, sha: &str, file: &str, line_start: u32, line_end: u32) -> Option<String> {
	let (host, repo) = normalize_remote(remote_url)?;
	let file = file.trim_start_matches('/');

	let url = if matches_host(&host, "github") {
		format!("https://{host}/{repo}/blob/{sha}/{file}#L{line_start}-L{line_end}")
	} else if matches_host(&host, "gitlab") {
		format!("https://{host}/{repo}/-/blob/{sha}/{file}#L{line_start}-{line_end}")
	} else if matches_host(&host, "bitbucket") {
		format!("https://{host}/{repo}/src/{sha}/{file}#lines-{line_start}:{line_end}")
	} else {
		return None;
	};

	Some(url)
}

/// Remote URLs, `upstream` first, then `origin`, then the rest in input order.
pub fn sorted_remote_urls(remotes: &[RemoteInfo]) -> Vec<String> {
	let mut remotes: Vec<&RemoteInfo> = remotes.iter().collect();
	remotes.sort_by_key(|remote| remote_rank(&remote.name));
	remotes.into_iter().map(|remote| remote.url.clone()).collect()
}

// region:    --- Support

fn remote_rank(name: &str) -> u32 {
	match name {
		"upstream" => 0,
		"origin" => 1,
		_ => u32::MAX,
	}
}

fn matches_host(host: &str, service: &str) -> bool {
	host == format!("{service}.com") || host == format!("{service}.org") || host.starts_with(&format!("{service}."))
}

/// Normalizes a remote URL (https, ssh, or scp-like) to `(host, repo-path)`,
/// stripping credentials and the `.git` suffix.
fn normalize_remote(url: &str) -> Option<(String, String)> {
	let url = url.trim();

	if let Some(rest) = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
		let rest = rest.trim_end_matches('/');
		let (host, repo) = rest.split_once('/')?;
		let host = host.rsplit('@').next().unwrap_or(host);
		let repo = repo.strip_suffix(".git").unwrap_or(repo);
		if host.is_empty() || repo.is_empty() {
			return None;
		}
		return Some((host.to_string(), repo.to_string()));
	}

	let caps = RE_SCP_REMOTE.captures(url)?;
	Some((caps[1].to_string(), caps[2].to_string()))
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
