//! Filesystem collaborator.
//!
//! The tree belongs to the surrounding desktop. The shell reads snapshots of it
//! and changes it only through the three [`FsMutator`] calls, each of which
//! reports failure as `false` instead of an error.

use std::cell::RefCell;

use crate::core::filesystem::{self, join, normalize, parent_path};
use crate::models::FsItem;
use crate::utils::clock::now_ms;

/// Mutations the shell may request from the filesystem owner.
pub trait FsMutator {
    /// Create a file named `name` inside `parent`.
    fn create_file(&self, parent: &str, name: &str, content: &str) -> bool;
    /// Create an empty folder named `name` inside `parent`.
    fn create_folder(&self, parent: &str, name: &str) -> bool;
    /// Remove the file or folder at `path`, with everything below it.
    fn remove_item(&self, path: &str) -> bool;
}

/// Owner of the virtual filesystem tree.
pub trait FileSystemStore: FsMutator {
    /// Current tree, copied for one command invocation.
    fn snapshot(&self) -> FsItem;
}

/// In-memory tree owner.
#[derive(Debug)]
pub struct MemoryStore {
    root: RefCell<FsItem>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(FsItem::root(Vec::new()))
    }
}

impl MemoryStore {
    pub fn new(root: FsItem) -> Self {
        Self {
            root: RefCell::new(root),
        }
    }

    /// A small home-directory layout for demos and tests.
    pub fn with_home(user: &str) -> Self {
        let home = format!("/home/{}", user);
        let tree = FsItem::root(vec![
            FsItem::folder(
                "/home",
                vec![FsItem::folder(
                    home.clone(),
                    vec![
                        FsItem::folder(format!("{}/Documents", home), vec![]),
                        FsItem::folder(format!("{}/Projects", home), vec![]),
                        FsItem::file(
                            format!("{}/readme.txt", home),
                            "Welcome! Type 'help' to see available commands.\n",
                        ),
                    ],
                )],
            ),
            FsItem::folder("/tmp", vec![]),
        ]);
        Self::new(tree)
    }

    fn insert(&self, parent: &str, name: &str, make: impl FnOnce(String) -> FsItem) -> bool {
        if !is_valid_name(name) {
            return false;
        }

        let parent = normalize(parent);
        let mut root = self.root.borrow_mut();
        let Some(dir) = find_mut(&mut root, &parent) else {
            return false;
        };
        if !dir.is_dir() || dir.child(name).is_some() {
            return false;
        }

        dir.children.push(make(join(&parent, name)));
        dir.modified = Some(now_ms());
        true
    }
}

impl FsMutator for MemoryStore {
    fn create_file(&self, parent: &str, name: &str, content: &str) -> bool {
        self.insert(parent, name, |path| {
            FsItem::file(path, content).with_modified(now_ms())
        })
    }

    fn create_folder(&self, parent: &str, name: &str) -> bool {
        self.insert(parent, name, |path| {
            FsItem::folder(path, Vec::new()).with_modified(now_ms())
        })
    }

    fn remove_item(&self, path: &str) -> bool {
        let path = normalize(path);
        if path == "/" {
            return false;
        }

        let mut root = self.root.borrow_mut();
        let Some(parent) = find_mut(&mut root, &parent_path(&path)) else {
            return false;
        };
        let before = parent.children.len();
        parent.children.retain(|child| child.path != path);
        before != parent.children.len()
    }
}

impl FileSystemStore for MemoryStore {
    fn snapshot(&self) -> FsItem {
        self.root.borrow().clone()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn find_mut<'a>(node: &'a mut FsItem, target: &str) -> Option<&'a mut FsItem> {
    if node.path == target {
        return Some(node);
    }
    if !node.is_dir() || !filesystem::is_within(&node.path, target) {
        return None;
    }

    node.children
        .iter_mut()
        .find_map(|child| find_mut(child, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filesystem::{find, read_file};

    #[test]
    fn test_create_file_and_folder() {
        let store = MemoryStore::default();
        assert!(store.create_folder("/", "docs"));
        assert!(store.create_file("/docs", "a.txt", "alpha"));

        let tree = store.snapshot();
        assert_eq!(read_file(&tree, "/docs/a.txt"), Some("alpha"));
        assert!(find(&tree, "/docs/a.txt").and_then(|f| f.modified).is_some());
    }

    #[test]
    fn test_create_rejects_collisions_and_bad_parents() {
        let store = MemoryStore::default();
        assert!(store.create_folder("/", "docs"));
        assert!(!store.create_folder("/", "docs"));
        assert!(!store.create_file("/", "docs", ""));
        assert!(!store.create_file("/missing", "a.txt", ""));
        assert!(store.create_file("/", "f", ""));
        assert!(!store.create_file("/f", "g", ""));
    }

    #[test]
    fn test_create_rejects_invalid_names() {
        let store = MemoryStore::default();
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(!store.create_folder("/", name), "name {name:?}");
        }
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::with_home("guest");
        assert!(store.remove_item("/home/guest/readme.txt"));
        assert!(!store.remove_item("/home/guest/readme.txt"));
        assert!(store.remove_item("/home"));
        assert!(find(&store.snapshot(), "/home/guest").is_none());
    }

    #[test]
    fn test_remove_root_refused() {
        let store = MemoryStore::with_home("guest");
        assert!(!store.remove_item("/"));
        assert!(!store.remove_item("/.."));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MemoryStore::default();
        let before = store.snapshot();
        store.create_folder("/", "x");
        assert!(before.children.is_empty());
        assert_eq!(store.snapshot().children.len(), 1);
    }
}
