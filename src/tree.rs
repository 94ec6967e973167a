//! Deferred directory-tree model for the lister.
//!
//! Printing during the traversal would interleave output in pool
//! scheduling order. Instead the workers record the shape of the tree
//! as they go and nothing is printed until the pool has joined; a
//! single-threaded pre-order walk then emits paths in tree order, so
//! the output is independent of how the walk was scheduled.
//!
//! Nodes live in an index-addressed arena behind one mutex. A worker
//! holds the id of the directory node it popped and appends children in
//! the order the OS yields them; no two workers ever append to the same
//! node, and readers only exist after the pool is gone.

use std::ffi::OsString;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::sync::Mutex;

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    name: OsString,
    is_dir: bool,
    children: Vec<NodeId>,
}

/// Arena of name nodes recording the shape of the walked tree.
#[derive(Debug)]
pub struct Tree {
    nodes: Mutex<Vec<Node>>,
}

impl Tree {
    /// Handle to the root node, which wraps the starting path.
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root_name: OsString) -> Self {
        Self {
            nodes: Mutex::new(vec![Node {
                name: root_name,
                is_dir: true,
                children: Vec::new(),
            }]),
        }
    }

    /// Append a child under `parent` and return its handle.
    pub fn attach(&self, parent: NodeId, name: OsString, is_dir: bool) -> NodeId {
        let mut nodes = self.nodes.lock().unwrap();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            name,
            is_dir,
            children: Vec::new(),
        });
        nodes[parent.0].children.push(id);
        id
    }

    /// Emit the path of every non-directory, pre-order, one record per
    /// entry with `terminator` after each.
    pub fn write_files<W: Write>(&self, out: &mut W, terminator: u8) -> io::Result<()> {
        let nodes = self.nodes.lock().unwrap();
        let mut prefix = Vec::new();
        emit_files(&nodes, Self::ROOT, &mut prefix, out, terminator)
    }

    /// Emit the path of every directory, root included, pre-order.
    pub fn write_dirs<W: Write>(&self, out: &mut W, terminator: u8) -> io::Result<()> {
        let nodes = self.nodes.lock().unwrap();
        let mut prefix = Vec::new();
        emit_dirs(&nodes, Self::ROOT, &mut prefix, out, terminator)
    }
}

fn emit_files<W: Write>(
    nodes: &[Node],
    id: NodeId,
    prefix: &mut Vec<u8>,
    out: &mut W,
    terminator: u8,
) -> io::Result<()> {
    let node = &nodes[id.0];
    let mark = prefix.len();
    prefix.extend_from_slice(node.name.as_bytes());
    prefix.push(b'/');

    for &child_id in &node.children {
        let child = &nodes[child_id.0];
        if child.is_dir {
            emit_files(nodes, child_id, prefix, out, terminator)?;
        } else {
            out.write_all(prefix)?;
            out.write_all(child.name.as_bytes())?;
            out.write_all(&[terminator])?;
        }
    }

    prefix.truncate(mark);
    Ok(())
}

fn emit_dirs<W: Write>(
    nodes: &[Node],
    id: NodeId,
    prefix: &mut Vec<u8>,
    out: &mut W,
    terminator: u8,
) -> io::Result<()> {
    let node = &nodes[id.0];
    let mark = prefix.len();
    prefix.extend_from_slice(node.name.as_bytes());

    out.write_all(prefix)?;
    out.write_all(&[terminator])?;

    prefix.push(b'/');
    for &child_id in &node.children {
        if nodes[child_id.0].is_dir {
            emit_dirs(nodes, child_id, prefix, out, terminator)?;
        }
    }

    prefix.truncate(mark);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r/{a, b/{c, d/}, e/} with a and c files.
    fn sample_tree() -> Tree {
        let tree = Tree::new("r".into());
        tree.attach(Tree::ROOT, "a".into(), false);
        let b = tree.attach(Tree::ROOT, "b".into(), true);
        tree.attach(b, "c".into(), false);
        tree.attach(b, "d".into(), true);
        tree.attach(Tree::ROOT, "e".into(), true);
        tree
    }

    fn render(write: impl Fn(&mut Vec<u8>)) -> String {
        let mut out = Vec::new();
        write(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_files_emitter() {
        let tree = sample_tree();
        let out = render(|w| tree.write_files(w, b'\n').unwrap());
        assert_eq!(out, "r/a\nr/b/c\n");
    }

    #[test]
    fn test_dirs_emitter_includes_root() {
        let tree = sample_tree();
        let out = render(|w| tree.write_dirs(w, b'\n').unwrap());
        assert_eq!(out, "r\nr/b\nr/b/d\nr/e\n");
    }

    #[test]
    fn test_nul_terminator() {
        let tree = sample_tree();
        let mut out = Vec::new();
        tree.write_files(&mut out, 0).unwrap();
        assert_eq!(out, b"r/a\0r/b/c\0");
    }

    #[test]
    fn test_children_keep_attach_order() {
        let tree = Tree::new("top".into());
        tree.attach(Tree::ROOT, "z".into(), false);
        tree.attach(Tree::ROOT, "a".into(), false);
        tree.attach(Tree::ROOT, "m".into(), false);

        let out = render(|w| tree.write_files(w, b'\n').unwrap());
        // yield order, not lexicographic
        assert_eq!(out, "top/z\ntop/a\ntop/m\n");
    }

    #[test]
    fn test_empty_dir_mode_prints_only_root() {
        let tree = Tree::new("lonely".into());
        let files = render(|w| tree.write_files(w, b'\n').unwrap());
        let dirs = render(|w| tree.write_dirs(w, b'\n').unwrap());
        assert_eq!(files, "");
        assert_eq!(dirs, "lonely\n");
    }
}
