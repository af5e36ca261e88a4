//! Path algebra and read-only queries over the virtual filesystem tree.
//!
//! Every function here is pure: the tree is borrowed from the caller and never
//! mutated. Changes go through [`FsMutator`](crate::core::FsMutator).
//!
//! # Path Convention
//!
//! - Paths are absolute and `/`-separated: `/`, `/home`, `/home/guest/a.txt`
//! - No trailing slash except for the root itself
//! - `.` and `..` are resolved away by [`normalize`] before any lookup

use std::cmp::Ordering;

use crate::models::FsItem;

/// Which entries a path completion may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathFilter {
    #[default]
    Any,
    DirectoriesOnly,
}

impl PathFilter {
    fn accepts(self, item: &FsItem) -> bool {
        match self {
            Self::Any => true,
            Self::DirectoriesOnly => item.is_dir(),
        }
    }
}

// ============================================================================
// Path Algebra
// ============================================================================

/// Normalize a path by resolving `.` and `..` components.
///
/// Always returns an absolute path. `..` at the root is ignored.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/').filter(|s| !s.is_empty()) {
        match part {
            ".." => {
                parts.pop();
            }
            "." => {}
            _ => parts.push(part),
        }
    }

    format!("/{}", parts.join("/"))
}

/// Resolve `target` against the current directory.
///
/// - `/x/y` is absolute and only normalized
/// - `.` and the empty string return the current directory
/// - `..`, `../x`, `./x` and plain names are joined onto `current` first
pub fn resolve(current: &str, target: &str) -> String {
    if target.starts_with('/') {
        return normalize(target);
    }

    if target.is_empty() || target == "." {
        return normalize(current);
    }

    normalize(&format!("{}/{}", current, target))
}

/// Parent directory of a normalized path (`/` for the root).
pub fn parent_path(path: &str) -> String {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

/// Append a name to a directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// True when `ancestor` is `path` itself or one of its parents.
pub fn is_within(ancestor: &str, path: &str) -> bool {
    ancestor == "/"
        || path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

// ============================================================================
// Tree Queries
// ============================================================================

/// Find the node at `path`.
///
/// Only descends into children whose own path is a prefix of the target, so a
/// lookup touches one branch per level rather than the whole tree.
pub fn find<'a>(tree: &'a FsItem, path: &str) -> Option<&'a FsItem> {
    let target = normalize(path);
    find_normalized(tree, &target)
}

fn find_normalized<'a>(node: &'a FsItem, target: &str) -> Option<&'a FsItem> {
    if node.path == target {
        return Some(node);
    }
    if !node.is_dir() || !is_within(&node.path, target) {
        return None;
    }

    node.children
        .iter()
        .find_map(|child| find_normalized(child, target))
}

pub fn exists(tree: &FsItem, path: &str) -> bool {
    find(tree, path).is_some()
}

pub fn is_directory(tree: &FsItem, path: &str) -> bool {
    find(tree, path).is_some_and(FsItem::is_dir)
}

pub fn is_file(tree: &FsItem, path: &str) -> bool {
    find(tree, path).is_some_and(FsItem::is_file)
}

/// Children of a directory in stored order.
///
/// Empty for missing paths and files as well as empty directories; check
/// [`is_directory`] first when the difference matters.
pub fn list_directory<'a>(tree: &'a FsItem, path: &str) -> Vec<&'a FsItem> {
    match find(tree, path) {
        Some(dir) if dir.is_dir() => dir.children.iter().collect(),
        _ => Vec::new(),
    }
}

/// File content, or `None` for missing paths and directories.
pub fn read_file<'a>(tree: &'a FsItem, path: &str) -> Option<&'a str> {
    find(tree, path)
        .filter(|item| item.is_file())
        .map(|item| item.content.as_deref().unwrap_or(""))
}

/// Walk the subtree under `item` depth-first, parents before children.
pub fn walk<'a>(item: &'a FsItem, visit: &mut dyn FnMut(&'a FsItem)) {
    visit(item);
    for child in &item.children {
        walk(child, visit);
    }
}

/// Sort directories before files, then by name.
pub fn directories_first(a: &&FsItem, b: &&FsItem) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.cmp(&b.name))
}

// ============================================================================
// Path Completion
// ============================================================================

/// Complete a partially typed path.
///
/// Accepts `/` and `\` separators and an optional `C:` drive prefix. Returns
/// full replacements for the partial word: the typed directory part is kept
/// verbatim, matched directories get `separator` appended. Directories sort
/// first, then names alphabetically.
pub fn complete_path(
    tree: &FsItem,
    current: &str,
    partial: &str,
    filter: PathFilter,
    separator: char,
) -> Vec<String> {
    let split = partial
        .rfind(['/', '\\'])
        .map_or(0, |idx| idx + 1);
    let (dir_part, name_part) = partial.split_at(split);

    let dir_posix = strip_drive(dir_part).replace('\\', "/");
    let search_dir = if dir_posix.is_empty() {
        normalize(current)
    } else {
        resolve(current, &dir_posix)
    };

    let name_lower = name_part.to_lowercase();
    let mut matches: Vec<&FsItem> = list_directory(tree, &search_dir)
        .into_iter()
        .filter(|item| filter.accepts(item))
        .filter(|item| item.name.to_lowercase().starts_with(&name_lower))
        .collect();
    matches.sort_by(directories_first);

    matches
        .into_iter()
        .map(|item| {
            let mut completion = format!("{}{}", dir_part, item.name);
            if item.is_dir() {
                completion.push(separator);
            }
            completion
        })
        .collect()
}

/// Drop a leading `C:` drive designator.
pub fn strip_drive(path: &str) -> &str {
    match path.as_bytes() {
        [d, b':', ..] if d.is_ascii_alphabetic() => &path[2..],
        _ => path,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FsItem {
        FsItem::root(vec![
            FsItem::folder(
                "/home",
                vec![FsItem::folder(
                    "/home/guest",
                    vec![
                        FsItem::folder("/home/guest/Documents", vec![]),
                        FsItem::folder("/home/guest/Downloads", vec![]),
                        FsItem::file("/home/guest/diary.txt", "dear diary"),
                        FsItem::file("/home/guest/.bashrc", "export PS1"),
                    ],
                )],
            ),
            FsItem::folder("/etc", vec![FsItem::file("/etc/hosts", "127.0.0.1")]),
            FsItem::file("/readme.md", "# hello"),
        ])
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("//a///b/"), "/a/b");
        assert_eq!(normalize("/a/./b/../c"), "/a/c");
        assert_eq!(normalize("/../.."), "/");
        assert_eq!(normalize("a/b"), "/a/b");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for path in ["/", "/a/../b", "//x/./y//", "../..", "/a/b/c/../../d", "rel/./x"] {
            let once = normalize(path);
            assert_eq!(normalize(&once), once, "path {path}");
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/a/b/c", "../../x"), "/a/x");
        assert_eq!(resolve("/a/b", "."), "/a/b");
        assert_eq!(resolve("/a/b", ""), "/a/b");
        assert_eq!(resolve("/a/b", ".."), "/a");
        assert_eq!(resolve("/a/b", "./c"), "/a/b/c");
        assert_eq!(resolve("/a/b", "c/d"), "/a/b/c/d");
        assert_eq!(resolve("/a/b", "/etc//hosts"), "/etc/hosts");
        assert_eq!(resolve("/", ".."), "/");
    }

    #[test]
    fn test_resolve_parent_round_trip() {
        for cwd in ["/a", "/a/b", "/home/guest/Documents", "/x/./y/"] {
            let parent = resolve(cwd, "..");
            let back = resolve(&parent, last_segment_of(&normalize(cwd)));
            assert_eq!(back, normalize(cwd));
        }
    }

    fn last_segment_of(path: &str) -> &str {
        crate::models::last_segment(path)
    }

    #[test]
    fn test_parent_and_join() {
        assert_eq!(parent_path("/a/b"), "/a");
        assert_eq!(parent_path("/a"), "/");
        assert_eq!(parent_path("/"), "/");
        assert_eq!(join("/", "x"), "/x");
        assert_eq!(join("/a", "x"), "/a/x");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/", "/anything"));
        assert!(is_within("/a", "/a"));
        assert!(is_within("/a", "/a/b"));
        assert!(!is_within("/a", "/ab"));
    }

    #[test]
    fn test_find() {
        let tree = sample_tree();
        assert_eq!(find(&tree, "/").map(|i| i.path.as_str()), Some("/"));
        assert_eq!(
            find(&tree, "/home/guest/diary.txt").map(|i| i.name.as_str()),
            Some("diary.txt")
        );
        assert_eq!(
            find(&tree, "/home/../etc/hosts").map(|i| i.name.as_str()),
            Some("hosts")
        );
        assert!(find(&tree, "/home/nobody").is_none());
        assert!(find(&tree, "/readme.md/child").is_none());
    }

    #[test]
    fn test_queries() {
        let tree = sample_tree();
        assert!(exists(&tree, "/etc"));
        assert!(is_directory(&tree, "/etc"));
        assert!(!is_directory(&tree, "/etc/hosts"));
        assert!(is_file(&tree, "/etc/hosts"));
        assert_eq!(read_file(&tree, "/etc/hosts"), Some("127.0.0.1"));
        assert_eq!(read_file(&tree, "/etc"), None);
        assert_eq!(read_file(&tree, "/missing"), None);
    }

    #[test]
    fn test_list_directory_distinguishes_nothing_from_empty() {
        let tree = sample_tree();
        assert_eq!(list_directory(&tree, "/home/guest").len(), 4);
        assert!(list_directory(&tree, "/home/guest/Documents").is_empty());
        assert!(is_directory(&tree, "/home/guest/Documents"));
        assert!(list_directory(&tree, "/nowhere").is_empty());
        assert!(!exists(&tree, "/nowhere"));
    }

    #[test]
    fn test_complete_bare_name() {
        let tree = sample_tree();
        let matches = complete_path(&tree, "/home/guest", "d", PathFilter::Any, '/');
        assert_eq!(matches, vec!["Documents/", "Downloads/", "diary.txt"]);
    }

    #[test]
    fn test_complete_relative_and_absolute() {
        let tree = sample_tree();
        assert_eq!(
            complete_path(&tree, "/home", "guest/do", PathFilter::Any, '/'),
            vec!["guest/Documents/", "guest/Downloads/"]
        );
        assert_eq!(
            complete_path(&tree, "/home/guest", "/etc/h", PathFilter::Any, '/'),
            vec!["/etc/hosts"]
        );
    }

    #[test]
    fn test_complete_directories_only() {
        let tree = sample_tree();
        let matches = complete_path(&tree, "/home/guest", "d", PathFilter::DirectoriesOnly, '/');
        assert_eq!(matches, vec!["Documents/", "Downloads/"]);
    }

    #[test]
    fn test_complete_windows_style() {
        let tree = sample_tree();
        assert_eq!(
            complete_path(&tree, "/", "C:\\home\\g", PathFilter::Any, '\\'),
            vec!["C:\\home\\guest\\"]
        );
    }

    #[test]
    fn test_strip_drive() {
        assert_eq!(strip_drive("C:\\x"), "\\x");
        assert_eq!(strip_drive("c:"), "");
        assert_eq!(strip_drive("/x"), "/x");
    }
}
