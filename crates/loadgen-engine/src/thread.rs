//! Reply-tree arena for the comments of one article.
//!
//! Nodes are stored in insertion order and refer to their parent by index.
//! The sibling counter of a node lives in its own slot, so attaching a reply
//! only ever touches the arena.

use crate::sortkey::{SortKey, ThreadError, MAX_LEVEL, MAX_POSITION};
use rand::Rng;

/// One comment of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment_no: i64,
    /// Arena index of the parent; `None` at root
    pub parent: Option<usize>,
    pub level: u8,
    /// Position among the parent's children
    pub position: u16,
    /// Children attached so far; the next child's position
    pub child_count: u32,
    pub sort_key: SortKey,
}

impl CommentNode {
    /// Whether another reply may be attached below this node.
    pub fn accepts_reply(&self) -> bool {
        self.level < MAX_LEVEL && self.child_count <= u32::from(MAX_POSITION)
    }
}

/// Arena of comment nodes.
#[derive(Debug, Default)]
pub struct ReplyTree {
    nodes: Vec<CommentNode>,
    /// Nodes that still accept replies
    open: Vec<usize>,
}

impl ReplyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a root comment; returns its index.
    pub fn add_root(&mut self, comment_no: i64) -> usize {
        self.push(CommentNode {
            comment_no,
            parent: None,
            level: 0,
            position: 0,
            child_count: 0,
            sort_key: SortKey::root(),
        })
    }

    /// Attach a reply below `parent`; returns its index.
    pub fn add_reply(&mut self, parent: usize, comment_no: i64) -> Result<usize, ThreadError> {
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or(ThreadError::UnknownComment(parent))?;

        let level = parent_node.level + 1;
        if level > MAX_LEVEL {
            return Err(ThreadError::LevelOverflow(level));
        }
        let position = parent_node.child_count;
        let sort_key = parent_node.sort_key.child(level, position)?;

        let parent_node = &mut self.nodes[parent];
        parent_node.child_count += 1;
        if !parent_node.accepts_reply() {
            self.open.retain(|&i| i != parent);
        }

        Ok(self.push(CommentNode {
            comment_no,
            parent: Some(parent),
            level,
            position: position as u16,
            child_count: 0,
            sort_key,
        }))
    }

    fn push(&mut self, node: CommentNode) -> usize {
        let index = self.nodes.len();
        if node.accepts_reply() {
            self.open.push(index);
        }
        self.nodes.push(node);
        index
    }

    /// Uniformly random node that still accepts replies.
    pub fn choose_open<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.open.is_empty() {
            return None;
        }
        Some(self.open[rng.gen_range(0..self.open.len())])
    }

    /// Comment number of the root reached by walking parent links.
    pub fn top_ancestor(&self, index: usize) -> Option<i64> {
        let mut node = self.nodes.get(index)?;
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
        }
        Some(node.comment_no)
    }

    /// Comment number of the immediate parent, or the node's own at root.
    pub fn parent_no(&self, index: usize) -> Option<i64> {
        let node = self.nodes.get(index)?;
        match node.parent {
            Some(parent) => self.nodes.get(parent).map(|p| p.comment_no),
            None => Some(node.comment_no),
        }
    }

    pub fn get(&self, index: usize) -> Option<&CommentNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommentNode> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_root_comment() {
        let mut tree = ReplyTree::new();
        let root = tree.add_root(100);
        let node = tree.get(root).unwrap();

        assert_eq!(node.level, 0);
        assert_eq!(node.position, 0);
        assert_eq!(node.sort_key, SortKey::root());
        assert_eq!(tree.top_ancestor(root), Some(100));
        assert_eq!(tree.parent_no(root), Some(100));
    }

    #[test]
    fn test_reply_derivation() {
        let mut tree = ReplyTree::new();
        let root = tree.add_root(1);
        let a = tree.add_reply(root, 2).unwrap();
        let b = tree.add_reply(root, 3).unwrap();
        let c = tree.add_reply(b, 4).unwrap();

        let node_a = tree.get(a).unwrap();
        let node_b = tree.get(b).unwrap();
        let node_c = tree.get(c).unwrap();

        assert_eq!((node_a.level, node_a.position), (1, 0));
        assert_eq!((node_b.level, node_b.position), (1, 1));
        assert_eq!((node_c.level, node_c.position), (2, 0));
        assert_eq!(tree.get(root).unwrap().child_count, 2);

        assert_eq!(node_a.sort_key.as_str(), "00000000000000000000");
        assert_eq!(node_b.sort_key.as_str(), "01000000000000000000");
        assert_eq!(node_c.sort_key.as_str(), "01000000000000000000");
        assert!(node_a.sort_key <= node_b.sort_key);

        assert_eq!(tree.top_ancestor(c), Some(1));
        assert_eq!(tree.parent_no(c), Some(3));
    }

    #[test]
    fn test_level_cap() {
        let mut tree = ReplyTree::new();
        let mut current = tree.add_root(0);
        for n in 1..=i64::from(MAX_LEVEL) {
            current = tree.add_reply(current, n).unwrap();
        }
        assert_eq!(tree.get(current).unwrap().level, MAX_LEVEL);
        assert!(!tree.get(current).unwrap().accepts_reply());
        assert_eq!(
            tree.add_reply(current, 99),
            Err(ThreadError::LevelOverflow(MAX_LEVEL + 1))
        );
    }

    #[test]
    fn test_position_cap() {
        let mut tree = ReplyTree::new();
        let root = tree.add_root(0);
        for n in 0..=i64::from(MAX_POSITION) {
            tree.add_reply(root, n + 1).unwrap();
        }
        let last = tree.get(tree.len() - 1).unwrap();
        assert_eq!(last.position, MAX_POSITION);
        assert!(!tree.get(root).unwrap().accepts_reply());
        assert_eq!(
            tree.add_reply(root, -1),
            Err(ThreadError::PositionOverflow(u32::from(MAX_POSITION) + 1))
        );
    }

    #[test]
    fn test_choose_open_skips_full_nodes() {
        let mut tree = ReplyTree::new();
        let mut current = tree.add_root(0);
        for n in 1..=i64::from(MAX_LEVEL) {
            current = tree.add_reply(current, n).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let chosen = tree.choose_open(&mut rng).unwrap();
            assert!(tree.get(chosen).unwrap().accepts_reply());
            assert_ne!(chosen, current);
        }
        assert_eq!(ReplyTree::new().choose_open(&mut rng), None);
    }
}
