use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use forum_types::api::CommentResponse;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Anything that can be placed in a reply tree.
pub trait Threaded {
    fn id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
}

impl Threaded for CommentResponse {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }
}

/// Page over root comments. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        }
    }

    /// Same as `new`, but caps the page size.
    pub fn capped(page: Option<u32>, size: Option<u32>, max_size: u32) -> Self {
        let mut p = Self::new(page, size);
        p.size = p.size.min(max_size.max(1));
        p
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.size as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode<T> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<CommentNode<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentTree<T> {
    pub roots: Vec<CommentNode<T>>,
    /// Number of roots before pagination.
    pub total_roots: usize,
}

/// Deepest reply level kept when assembling a thread. Replies are written one
/// level deep; anything further down is dropped.
pub const MAX_REPLY_DEPTH: usize = 32;

/// Assemble a page of reply trees from a flat comment list.
///
/// The input must already be ordered by root ancestor id, then parent id
/// (roots first), then creation time. Order is trusted, never re-sorted:
/// roots come out in input order and each reply list keeps input order.
///
/// A comment whose parent is not in the input is dropped along with anything
/// hanging off it, as is anything nested deeper than [`MAX_REPLY_DEPTH`].
/// Only roots are paginated; a root always carries all of its replies.
pub fn build_comment_tree<T: Threaded>(comments: Vec<T>, page: Pagination) -> CommentTree<T> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(comments.len());
    for (slot, comment) in comments.iter().enumerate() {
        index.insert(comment.id(), slot);
    }

    // Arena: children[i] holds the slots of i's direct replies.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (slot, comment) in comments.iter().enumerate() {
        match comment.parent_id() {
            None => roots.push(slot),
            Some(parent_id) => match index.get(&parent_id) {
                Some(&parent) if parent != slot => children[parent].push(slot),
                _ => trace!(
                    "Dropping comment {} with missing parent {}",
                    comment.id(),
                    parent_id
                ),
            },
        }
    }

    let total_roots = roots.len();
    let mut slots: Vec<Option<T>> = comments.into_iter().map(Some).collect();

    let roots = roots
        .into_iter()
        .skip(page.offset())
        .take(page.size as usize)
        .filter_map(|slot| take_thread(slot, &mut slots, &children))
        .collect();

    CommentTree { roots, total_roots }
}

// Walks with an explicit stack so a long reply chain cannot exhaust the call
// stack. Each slot is taken at most once.
fn take_thread<T: Threaded>(
    root: usize,
    slots: &mut [Option<T>],
    children: &[Vec<usize>],
) -> Option<CommentNode<T>> {
    let mut preorder: Vec<usize> = Vec::new();
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    while let Some((slot, depth)) = stack.pop() {
        preorder.push(slot);
        if depth == MAX_REPLY_DEPTH {
            if !children[slot].is_empty() {
                trace!("Dropping replies nested below depth {}", MAX_REPLY_DEPTH);
            }
            continue;
        }
        stack.extend(children[slot].iter().rev().map(|&child| (child, depth + 1)));
    }

    // Reverse preorder finishes every reply before its parent.
    let mut built: HashMap<usize, CommentNode<T>> = HashMap::with_capacity(preorder.len());
    for &slot in preorder.iter().rev() {
        let Some(comment) = slots[slot].take() else {
            continue;
        };
        let replies = children[slot]
            .iter()
            .filter_map(|child| built.remove(child))
            .collect();
        built.insert(slot, CommentNode { comment, replies });
    }
    built.remove(&root)
}
