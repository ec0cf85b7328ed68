//! String-level path helpers.
//!
//! Paths come from tmux (`#{pane_current_path}`) and git output, so they are
//! compared as strings. Both `/` and `\` count as separators; comparison is
//! case-sensitive on every platform.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Marker segment for agent-managed worktrees.
const AGENT_WORKTREE_SEGMENT: &str = ".worktree";

/// Strip trailing separators. `"/"` normalizes to `""`.
pub fn normalize_path(path: &str) -> &str {
    path.trim_end_matches(SEPARATORS)
}

/// Normalized form of an optional path, or `None` when it is missing or
/// normalizes to empty.
pub fn normalized_non_empty(path: Option<&str>) -> Option<&str> {
    let normalized = normalize_path(path?);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Equal after normalization; an empty side never matches.
pub fn same_path(a: &str, b: &str) -> bool {
    match (normalized_non_empty(Some(a)), normalized_non_empty(Some(b))) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True when `path` contains a whole `.worktree` segment.
///
/// `/repo/.worktree/feature` matches; `/repo/.worktrees/x` and
/// `/repo/my.worktree` do not.
pub fn is_agent_worktree_path(path: &str) -> bool {
    path.split(SEPARATORS)
        .any(|segment| segment == AGENT_WORKTREE_SEGMENT)
}

/// `true` when `prefix` equals `path` or is an ancestor directory of it.
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
    let (Some(prefix), Some(path)) = (
        normalized_non_empty(Some(prefix)),
        normalized_non_empty(Some(path)),
    ) else {
        return false;
    };
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATORS),
        None => false,
    }
}

/// Last non-empty segment of a path.
pub fn basename(path: &str) -> Option<&str> {
    normalize_path(path)
        .rsplit(SEPARATORS)
        .next()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_separators() {
        assert_eq!(normalize_path("/tmp/project/"), "/tmp/project");
        assert_eq!(normalize_path("/tmp/project///"), "/tmp/project");
        assert_eq!(normalize_path("C:\\work\\repo\\"), "C:\\work\\repo");
        assert_eq!(normalize_path("/tmp/project"), "/tmp/project");
    }

    #[test]
    fn root_normalizes_to_empty() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalized_non_empty(Some("///")), None);
        assert_eq!(normalized_non_empty(Some("")), None);
        assert_eq!(normalized_non_empty(None), None);
    }

    #[test]
    fn same_path_ignores_trailing_separators() {
        assert!(same_path("/tmp/project/", "/tmp/project"));
        assert!(!same_path("/tmp/project", "/tmp/project/submodule"));
    }

    #[test]
    fn same_path_rejects_empty_sides() {
        assert!(!same_path("", ""));
        assert!(!same_path("/", "/"));
        assert!(!same_path("/tmp", ""));
    }

    #[test]
    fn same_path_is_case_sensitive() {
        assert!(!same_path("/tmp/Project", "/tmp/project"));
    }

    #[test]
    fn agent_worktree_segment_matching() {
        assert!(is_agent_worktree_path("/repo/.worktree/feature-a"));
        assert!(is_agent_worktree_path(".worktree/feature-a"));
        assert!(is_agent_worktree_path("/repo/.worktree"));
        assert!(is_agent_worktree_path("C:\\repo\\.worktree\\x"));
        assert!(!is_agent_worktree_path("/repo/.worktrees/feature-a"));
        assert!(!is_agent_worktree_path("/repo/my.worktree/feature-a"));
        assert!(!is_agent_worktree_path("/repo/.Worktree/feature-a"));
        assert!(!is_agent_worktree_path("/repo"));
    }

    #[test]
    fn path_prefix_respects_segments() {
        assert!(is_path_prefix("/repo", "/repo"));
        assert!(is_path_prefix("/repo/", "/repo/src"));
        assert!(!is_path_prefix("/repo", "/repository"));
        assert!(!is_path_prefix("", "/repo"));
    }

    #[test]
    fn basename_of_paths() {
        assert_eq!(basename("/tmp/project/"), Some("project"));
        assert_eq!(basename("project"), Some("project"));
        assert_eq!(basename("/"), None);
    }
}
