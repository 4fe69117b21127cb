use crate::types::{Chevron, FileTreeNode, NodeKind, TreeRow};

/// Horizontal indentation applied per nesting level.
pub const INDENT_PX: u32 = 16;

fn file(name: &str) -> FileTreeNode {
    FileTreeNode {
        name: name.to_string(),
        kind: NodeKind::File,
        expanded: false,
        children: Vec::new(),
    }
}

fn folder(name: &str, expanded: bool, children: Vec<FileTreeNode>) -> FileTreeNode {
    FileTreeNode {
        name: name.to_string(),
        kind: NodeKind::Folder,
        expanded,
        children,
    }
}

/// Placeholder tree shown when no real project directory is available.
pub fn sample_tree() -> Vec<FileTreeNode> {
    vec![
        folder(
            "src",
            true,
            vec![
                folder(
                    "components",
                    false,
                    vec![file("CodeAnalysis.js"), file("FileTree.js")],
                ),
                folder("utils", false, vec![file("helpers.js")]),
                file("App.js"),
            ],
        ),
        folder("public", false, vec![file("index.html")]),
    ]
}

/// Flatten the visible part of the tree into rows, depth-first and in order.
/// A folder's children are only visited when the folder is expanded.
pub fn render_rows(items: &[FileTreeNode]) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut path = Vec::new();
    push_rows(items, 0, &mut path, &mut rows);
    rows
}

fn push_rows(items: &[FileTreeNode], depth: usize, path: &mut Vec<usize>, rows: &mut Vec<TreeRow>) {
    for (i, item) in items.iter().enumerate() {
        path.push(i);
        let chevron = match item.kind {
            NodeKind::Folder if item.expanded => Some(Chevron::Down),
            NodeKind::Folder => Some(Chevron::Right),
            NodeKind::File => None,
        };
        rows.push(TreeRow {
            name: item.name.clone(),
            kind: item.kind,
            depth,
            indent_px: depth as u32 * INDENT_PX,
            chevron,
            path: path.clone(),
        });
        if item.kind == NodeKind::Folder && item.expanded {
            push_rows(&item.children, depth + 1, path, rows);
        }
        path.pop();
    }
}

/// Build a tree from relative `/`-separated file paths.
/// Folders sort before files, then by name. Every folder starts collapsed.
pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Vec<FileTreeNode> {
    let mut roots = Vec::new();
    for p in paths {
        let parts: Vec<&str> = p.as_ref().split('/').filter(|s| !s.is_empty()).collect();
        insert(&mut roots, &parts);
    }
    sort_nodes(&mut roots);
    roots
}

fn insert(nodes: &mut Vec<FileTreeNode>, parts: &[&str]) {
    let Some((head, rest)) = parts.split_first() else {
        return;
    };
    if rest.is_empty() {
        if !nodes.iter().any(|n| n.kind == NodeKind::File && n.name == *head) {
            nodes.push(file(head));
        }
        return;
    }
    let pos = match nodes
        .iter()
        .position(|n| n.kind == NodeKind::Folder && n.name == *head)
    {
        Some(pos) => pos,
        None => {
            nodes.push(folder(head, false, Vec::new()));
            nodes.len() - 1
        }
    };
    insert(&mut nodes[pos].children, rest);
}

fn sort_nodes(nodes: &mut [FileTreeNode]) {
    nodes.sort_by(|a, b| {
        let rank = |n: &FileTreeNode| match n.kind {
            NodeKind::Folder => 0,
            NodeKind::File => 1,
        };
        rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
    });
    for n in nodes.iter_mut() {
        sort_nodes(&mut n.children);
    }
}

/// Flip the expanded flag of the folder at `path`.
/// Returns false if the path is out of range or names a file.
pub fn toggle(items: &mut [FileTreeNode], path: &[usize]) -> bool {
    let Some((&first, rest)) = path.split_first() else {
        return false;
    };
    let Some(node) = items.get_mut(first) else {
        return false;
    };
    if rest.is_empty() {
        if node.kind != NodeKind::Folder {
            return false;
        }
        node.expanded = !node.expanded;
        return true;
    }
    toggle(&mut node.children, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(rows: &[TreeRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sample_tree_renders_only_expanded_children() {
        let rows = render_rows(&sample_tree());
        assert_eq!(names(&rows), vec!["src", "components", "utils", "App.js", "public"]);
        assert_eq!(rows[0].chevron, Some(Chevron::Down));
        assert_eq!(rows[1].chevron, Some(Chevron::Right));
        assert_eq!(rows[3].chevron, None);
        assert_eq!(rows[4].chevron, Some(Chevron::Right));
    }

    #[test]
    fn indentation_is_proportional_to_depth() {
        let tree = vec![folder(
            "a",
            true,
            vec![folder("b", true, vec![folder("c", true, vec![file("d.rs")])])],
        )];
        let rows = render_rows(&tree);
        assert_eq!(rows.len(), 4);
        for (depth, row) in rows.iter().enumerate() {
            assert_eq!(row.depth, depth);
            assert_eq!(row.indent_px, depth as u32 * INDENT_PX);
        }
        assert_eq!(rows[3].path, vec![0, 0, 0, 0]);
    }

    #[test]
    fn expanded_file_does_not_render_children() {
        // Only folders descend, even if a malformed file node carries children.
        let mut odd = file("weird.txt");
        odd.expanded = true;
        odd.children.push(file("hidden"));
        assert_eq!(names(&render_rows(&[odd])), vec!["weird.txt"]);
    }

    #[test]
    fn toggle_expands_collapsed_folder() {
        let mut tree = sample_tree();
        assert!(toggle(&mut tree, &[1]));
        let rows = render_rows(&tree);
        assert_eq!(names(&rows).last(), Some(&"index.html"));
        assert_eq!(rows.last().map(|r| r.depth), Some(1));

        assert!(toggle(&mut tree, &[0, 0]));
        assert!(names(&render_rows(&tree)).contains(&"CodeAnalysis.js"));
    }

    #[test]
    fn toggle_rejects_files_and_bad_paths() {
        let mut tree = sample_tree();
        assert!(!toggle(&mut tree, &[0, 2]));
        assert!(!toggle(&mut tree, &[7]));
        assert!(!toggle(&mut tree, &[]));
        assert_eq!(tree, sample_tree());
    }

    #[test]
    fn from_paths_nests_and_sorts() {
        let tree = from_paths(&["src/main.rs", "README.md", "src/util/io.rs", "build.rs", "src/lib.rs"]);
        let top: Vec<_> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(top, vec!["src", "README.md", "build.rs"]);
        let src: Vec<_> = tree[0].children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(src, vec!["util", "lib.rs", "main.rs"]);
        assert!(!tree[0].expanded);
        assert_eq!(render_rows(&tree).len(), 3);
    }
}
