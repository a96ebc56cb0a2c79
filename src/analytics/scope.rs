use rusqlite::Statement;

use crate::model::Scope;

/// Which task actor a query is restricted to.
///
/// Scope semantics are deliberately asymmetric per metric (creation is always
/// attributed to the creator, "my work" metrics match the assignee, insights
/// match either), so each consuming aggregator picks its own named predicate
/// via the constructors below instead of sharing one unified rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorScope {
    /// No restriction (global scope).
    All,
    /// Tasks the caller created.
    Creator(i64),
    /// Tasks assigned to the caller.
    Assignee(i64),
    /// Tasks the caller created or is assigned to.
    CreatorOrAssignee(i64),
}

impl ActorScope {
    /// Completion counting for trends: personal means created-or-assigned.
    pub fn for_trend_completions(scope: Scope, caller_id: i64) -> Self {
        match scope {
            Scope::Personal => ActorScope::CreatorOrAssignee(caller_id),
            Scope::Global => ActorScope::All,
        }
    }

    /// Creation counting for trends: always attributed to the creator.
    pub fn for_trend_creations(scope: Scope, caller_id: i64) -> Self {
        match scope {
            Scope::Personal => ActorScope::Creator(caller_id),
            Scope::Global => ActorScope::All,
        }
    }

    /// Active-task views: the priority distribution and the insight rules.
    pub fn for_active_tasks(scope: Scope, caller_id: i64) -> Self {
        match scope {
            Scope::Personal => ActorScope::CreatorOrAssignee(caller_id),
            Scope::Global => ActorScope::All,
        }
    }

    /// "My work" metrics: productivity, efficiency, and the heatmap only
    /// consider tasks assigned to the caller under personal scope.
    pub fn for_assigned_work(scope: Scope, caller_id: i64) -> Self {
        match scope {
            Scope::Personal => ActorScope::Assignee(caller_id),
            Scope::Global => ActorScope::All,
        }
    }

    /// SQL fragment restricting task alias `t`, starting at placeholder
    /// `?first_idx`. Empty for [`ActorScope::All`].
    pub fn where_clause(&self, first_idx: usize) -> String {
        match self {
            ActorScope::All => String::new(),
            ActorScope::Creator(_) => format!(" AND t.creator_id = ?{first_idx}"),
            ActorScope::Assignee(_) => format!(" AND t.assignee_id = ?{first_idx}"),
            ActorScope::CreatorOrAssignee(_) => format!(
                " AND (t.creator_id = ?{first_idx} OR t.assignee_id = ?{})",
                first_idx + 1
            ),
        }
    }

    /// Bind this scope's parameters starting at `first_idx`; returns the next
    /// free placeholder index.
    pub fn bind(&self, stmt: &mut Statement<'_>, first_idx: usize) -> rusqlite::Result<usize> {
        match self {
            ActorScope::All => Ok(first_idx),
            ActorScope::Creator(id) | ActorScope::Assignee(id) => {
                stmt.raw_bind_parameter(first_idx, id)?;
                Ok(first_idx + 1)
            }
            ActorScope::CreatorOrAssignee(id) => {
                stmt.raw_bind_parameter(first_idx, id)?;
                stmt.raw_bind_parameter(first_idx + 1, id)?;
                Ok(first_idx + 2)
            }
        }
    }
}
