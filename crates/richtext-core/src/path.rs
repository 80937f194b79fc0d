//! Index-sequence addressing of nodes.
//!
//! A path descends from the document root through child indices. Paths are
//! not stable across structural edits: anything held across an operation has
//! to be carried through [`transform`].

use std::cmp::Ordering;

use thiserror::Error;

use crate::ops::Op;

pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid path {path:?}: {reason}")]
pub struct PathError {
    pub path: Path,
    pub reason: String,
}

impl PathError {
    pub fn new(path: &[usize], reason: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }
}

/// Lexicographic order over the index sequences. A strict prefix sorts before
/// its descendants.
pub fn compare(a: &[usize], b: &[usize]) -> Ordering {
    a.cmp(b)
}

/// True iff `a` is a strict prefix of `b`.
pub fn is_ancestor(a: &[usize], b: &[usize]) -> bool {
    a.len() < b.len() && b.starts_with(a)
}

pub fn is_ancestor_or_equal(a: &[usize], b: &[usize]) -> bool {
    b.starts_with(a)
}

pub fn parent(path: &[usize]) -> Result<Path, PathError> {
    match path.split_last() {
        Some((_, parent)) => Ok(parent.to_vec()),
        None => Err(PathError::new(path, "The root has no parent")),
    }
}

pub fn next(path: &[usize]) -> Result<Path, PathError> {
    let Some((&last, parent)) = path.split_last() else {
        return Err(PathError::new(path, "The root has no next sibling"));
    };
    let mut out = parent.to_vec();
    out.push(last + 1);
    Ok(out)
}

pub fn previous(path: &[usize]) -> Result<Path, PathError> {
    match path.split_last() {
        Some((&last, parent)) if last > 0 => {
            let mut out = parent.to_vec();
            out.push(last - 1);
            Ok(out)
        }
        Some(_) => Err(PathError::new(path, "First child has no previous sibling")),
        None => Err(PathError::new(path, "The root has no previous sibling")),
    }
}

pub fn child(path: &[usize], index: usize) -> Path {
    let mut out = path.to_vec();
    out.push(index);
    out
}

/// Longest shared prefix of two paths.
pub fn common_ancestor(a: &[usize], b: &[usize]) -> Path {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}

/// True iff `a` is an earlier sibling of `b` or of one of `b`'s ancestors.
pub fn ends_before(a: &[usize], b: &[usize]) -> bool {
    let Some((&av, a_parent)) = a.split_last() else {
        return false;
    };
    let depth = a_parent.len();
    match b.get(depth) {
        Some(&bv) => b[..depth] == *a_parent && av < bv,
        None => false,
    }
}

/// Carry `path` through `op`. Returns `None` when the addressed node no longer
/// exists after the operation. Ops addressing the root leave `path` unchanged.
pub fn transform(path: &[usize], op: &Op) -> Option<Path> {
    let mut p = path.to_vec();
    if op.path().is_empty() {
        return Some(p);
    }
    match op {
        Op::InsertText { .. } | Op::RemoveText { .. } | Op::SetNodeProperties { .. } => {}
        Op::InsertNode { path: at, .. } => {
            if at.as_slice() == path || ends_before(at, path) || is_ancestor(at, path) {
                p[at.len() - 1] += 1;
            }
        }
        Op::RemoveNode { path: at } => {
            if is_ancestor_or_equal(at, path) {
                return None;
            }
            if ends_before(at, path) {
                p[at.len() - 1] -= 1;
            }
        }
        Op::SplitNode {
            path: at, position, ..
        } => {
            if ends_before(at, path) {
                p[at.len() - 1] += 1;
            } else if is_ancestor(at, path) && path[at.len()] >= *position {
                p[at.len() - 1] += 1;
                p[at.len()] -= position;
            }
        }
        Op::MergeNode {
            path: at, position, ..
        } => {
            if at.as_slice() == path || ends_before(at, path) {
                p[at.len() - 1] -= 1;
            } else if is_ancestor(at, path) {
                p[at.len() - 1] -= 1;
                p[at.len()] += position;
            }
        }
        Op::WrapNodes {
            path: at, count, ..
        } => {
            let depth = at.len() - 1;
            let start = at[depth];
            if path.len() > depth && path[..depth] == at[..depth] {
                let ix = path[depth];
                if ix >= start && ix < start + count {
                    p[depth] = start;
                    p.insert(depth + 1, ix - start);
                } else if ix >= start + count {
                    p[depth] = ix + 1 - count;
                }
            }
        }
        Op::UnwrapNodes { path: at, count } => {
            if at.as_slice() == path {
                return None;
            }
            let depth = at.len() - 1;
            if is_ancestor(at, path) {
                let lifted = at[depth] + path[depth + 1];
                p.remove(depth + 1);
                p[depth] = lifted;
            } else if ends_before(at, path) {
                p[depth] = p[depth] + count - 1;
            }
        }
    }
    Some(p)
}
