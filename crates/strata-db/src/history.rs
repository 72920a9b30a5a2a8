//! History traversal over the commit DAG.
//!
//! Cycles are impossible by construction, since a parent's hash cannot
//! depend on its child. A visited set is still maintained so merge
//! diamonds are walked once, not exponentially.

use std::collections::{HashMap, HashSet, VecDeque};

use strata_types::{CancelToken, Hash};
use strata_value::Ref;

use crate::commit::Commit;
use crate::database::Database;
use crate::error::DbResult;

/// Is the commit at `ancestor` an ancestor of (or equal to) the commit at
/// `descendant`?
///
/// Breadth-first search from `descendant` through parent edges,
/// short-circuiting on a hash match. Bounded in practice by commit-graph
/// depth; the visited set memoizes within the call.
pub fn is_ancestor(
    db: &Database,
    ctx: &CancelToken,
    ancestor: Hash,
    descendant: &Ref,
) -> DbResult<bool> {
    let mut visited: HashSet<Hash> = HashSet::new();
    let mut queue: VecDeque<Ref> = VecDeque::new();
    queue.push_back(descendant.clone());

    while let Some(r) = queue.pop_front() {
        if r.target() == ancestor {
            return Ok(true);
        }
        if !visited.insert(r.target()) {
            continue;
        }
        let commit = db.resolve_commit(ctx, &r)?;
        for parent in commit.parents() {
            queue.push_back(parent.clone());
        }
    }
    Ok(false)
}

/// Reverse-chronological (latest-first) list of the most recent `n`
/// ancestors of `commit`, including the commit itself.
///
/// `None` returns all ancestors. Ordering is descending by the metadata's
/// user timestamp, with ties broken by commit hash so the result is stable
/// and deterministic.
pub fn time_sorted_commits(
    db: &Database,
    ctx: &CancelToken,
    commit: &Commit,
    n: Option<usize>,
) -> DbResult<Vec<Commit>> {
    let mut seen: HashMap<Hash, Commit> = HashMap::new();
    add_commits(db, ctx, commit, &mut seen, n)?;

    let mut commits: Vec<Commit> = seen.into_values().collect();
    commits.sort_by(|a, b| {
        b.meta()
            .user_timestamp
            .cmp(&a.meta().user_timestamp)
            .then_with(|| a.address().cmp(&b.address()))
    });
    Ok(commits)
}

/// Depth-first collection in parent index order, stopping once `seen`
/// holds `n` distinct commits.
fn add_commits(
    db: &Database,
    ctx: &CancelToken,
    commit: &Commit,
    seen: &mut HashMap<Hash, Commit>,
    n: Option<usize>,
) -> DbResult<()> {
    if seen.contains_key(&commit.address()) {
        return Ok(());
    }
    seen.insert(commit.address(), commit.clone());

    for i in 0..commit.num_parents() {
        if n.is_some_and(|limit| seen.len() == limit) {
            break;
        }
        let parent_ref = commit.parent(i).expect("parent index in range");
        let parent = db.resolve_commit(ctx, parent_ref)?;
        add_commits(db, ctx, &parent, seen, n)?;
    }
    Ok(())
}
