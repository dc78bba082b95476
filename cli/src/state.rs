//! Client-side task list with optimistic mutations.
//!
//! [`TodoState`] never talks to the network. Every user action mutates the
//! local list immediately and hands back a [`Request`] for the caller to
//! perform; the outcome comes back through [`TodoState::settle`], which either
//! commits the server's record or rolls the local change back.
//!
//! A stored todo with mutations in flight keeps its last confirmed record plus
//! the unconfirmed changes, ordered by [`Ticket`]. The visible entry is always
//! the confirmed record with those changes replayed on top, so a failure
//! removes exactly its own change even when newer ones are still pending, and
//! once every change has settled the entry equals what the store last
//! confirmed. A success older than one already applied for the same field is
//! reported as [`Phase::Stale`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use todos_core::{Filter, Stats, Task, TaskId, TaskPatch, TaskText};

use crate::api::ApiError;

/// Identity of a list entry: placeholder until the store assigns an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalId {
    Placeholder(u64),
    Stored(TaskId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: LocalId,
    pub text: TaskText,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for Entry {
    fn from(task: Task) -> Self {
        Self {
            id: LocalId::Stored(task.id),
            text: task.text,
            completed: task.completed,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Network call the caller must perform for a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load,
    Create { text: TaskText },
    Update { id: TaskId, patch: TaskPatch },
    Delete { id: TaskId },
    DeleteMany { ids: Vec<TaskId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub ticket: Ticket,
    pub call: Call,
}

/// Result of performing a [`Call`].
#[derive(Debug)]
pub enum Reply {
    Loaded(Result<Vec<Task>, ApiError>),
    Created(Result<Task, ApiError>),
    Updated(Result<Task, ApiError>),
    Deleted(Result<(), ApiError>),
    DeletedMany(Vec<(TaskId, Result<(), ApiError>)>),
}

/// Where a mutation ended up once its reply was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Committed,
    RolledBack,
    /// A newer confirmation already landed, or the reply matched nothing.
    Stale,
}

/// Unconfirmed change to a stored todo.
#[derive(Debug, Clone)]
enum Op {
    Complete(bool),
    Retext(TaskText),
    Remove,
}

#[derive(Debug)]
enum Outcome {
    Saved(Task),
    Removed,
    Failed,
}

/// Confirmed record of a stored todo plus its changes still in flight.
#[derive(Debug)]
struct Tracked {
    base: Entry,
    text_ticket: Ticket,
    completed_ticket: Ticket,
    ops: BTreeMap<Ticket, Op>,
}

impl Tracked {
    fn new(base: Entry) -> Self {
        Self {
            base,
            text_ticket: Ticket(0),
            completed_ticket: Ticket(0),
            ops: BTreeMap::new(),
        }
    }

    /// The entry as the user should see it; `None` while a delete is pending.
    fn projected(&self) -> Option<Entry> {
        let mut entry = self.base.clone();
        for op in self.ops.values() {
            match op {
                Op::Complete(completed) => entry.completed = *completed,
                Op::Retext(text) => entry.text = text.clone(),
                Op::Remove => return None,
            }
        }
        Some(entry)
    }

    /// Folds a saved record into the base, unless a newer save of the same
    /// field already did.
    fn confirm(&mut self, ticket: Ticket, op: Op, task: Task) -> Phase {
        match op {
            Op::Complete(_) if ticket > self.completed_ticket => {
                self.completed_ticket = ticket;
                self.base.completed = task.completed;
            }
            Op::Retext(_) if ticket > self.text_ticket => {
                self.text_ticket = ticket;
                self.base.text = task.text;
            }
            _ => return Phase::Stale,
        }
        Phase::Committed
    }
}

#[derive(Debug)]
enum Pending {
    Create(u64),
    Update(TaskId),
    Delete(TaskId),
    Clear(Vec<TaskId>),
}

#[derive(Debug, Default)]
pub struct TodoState {
    entries: Vec<Entry>,
    filter: Filter,
    loading: bool,
    submitting: usize,
    error: Option<String>,
    next_ticket: u64,
    next_placeholder: u64,
    load_ticket: Option<Ticket>,
    pending: BTreeMap<Ticket, Pending>,
    tracked: HashMap<TaskId, Tracked>,
}

impl TodoState {
    pub fn new() -> Self {
        Self::default()
    }

    // Queries

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn visible(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| self.filter.matches(e.completed))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::from_flags(self.entries.iter().map(|e| e.completed))
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// True while the entry differs from, or has yet to get, a confirmed record.
    pub fn is_pending(&self, id: &LocalId) -> bool {
        match id {
            LocalId::Placeholder(_) => true,
            LocalId::Stored(id) => self.tracked.contains_key(id),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // Actions

    pub fn begin_load(&mut self) -> Request {
        self.loading = true;
        let ticket = self.issue_ticket();
        self.load_ticket = Some(ticket);
        Request { ticket, call: Call::Load }
    }

    pub fn add(&mut self, text: &str) -> Option<Request> {
        self.add_at(text, Utc::now())
    }

    pub fn add_at(&mut self, text: &str, now: DateTime<Utc>) -> Option<Request> {
        let text = TaskText::parse(text).ok()?;
        self.error = None;
        self.submitting += 1;

        self.next_placeholder += 1;
        let placeholder = self.next_placeholder;
        self.entries.insert(
            0,
            Entry {
                id: LocalId::Placeholder(placeholder),
                text: text.clone(),
                completed: false,
                created_at: now,
            },
        );

        let ticket = self.issue_ticket();
        self.pending.insert(ticket, Pending::Create(placeholder));
        Some(Request { ticket, call: Call::Create { text } })
    }

    pub fn toggle(&mut self, id: &LocalId) -> Option<Request> {
        let (task_id, index) = self.stored_index(id)?;
        let completed = !self.entries[index].completed;

        let ticket = self.record(&[task_id], Op::Complete(completed));
        self.pending.insert(ticket, Pending::Update(task_id));
        Some(Request {
            ticket,
            call: Call::Update { id: task_id, patch: TaskPatch::completed(completed) },
        })
    }

    pub fn edit(&mut self, id: &LocalId, text: &str) -> Option<Request> {
        let text = TaskText::parse(text).ok()?;
        let (task_id, index) = self.stored_index(id)?;
        if self.entries[index].text == text {
            return None;
        }

        let ticket = self.record(&[task_id], Op::Retext(text.clone()));
        self.pending.insert(ticket, Pending::Update(task_id));
        Some(Request {
            ticket,
            call: Call::Update { id: task_id, patch: TaskPatch::text(text) },
        })
    }

    pub fn delete(&mut self, id: &LocalId) -> Option<Request> {
        let (task_id, _) = self.stored_index(id)?;

        let ticket = self.record(&[task_id], Op::Remove);
        self.pending.insert(ticket, Pending::Delete(task_id));
        Some(Request { ticket, call: Call::Delete { id: task_id } })
    }

    /// Removes every completed stored entry and asks for one delete per id.
    pub fn clear_completed(&mut self) -> Option<Request> {
        let ids: Vec<TaskId> = self
            .entries
            .iter()
            .filter(|e| e.completed)
            .filter_map(|e| match e.id {
                LocalId::Stored(id) => Some(id),
                LocalId::Placeholder(_) => None,
            })
            .collect();
        if ids.is_empty() {
            return None;
        }

        let ticket = self.record(&ids, Op::Remove);
        self.pending.insert(ticket, Pending::Clear(ids.clone()));
        Some(Request { ticket, call: Call::DeleteMany { ids } })
    }

    /// Applies the reply for `ticket` and reports the mutation's final phase.
    pub fn settle(&mut self, ticket: Ticket, reply: Reply) -> Phase {
        if let Reply::Loaded(result) = reply {
            return self.settle_load(ticket, result);
        }

        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::warn!(?ticket, "reply for an unknown ticket");
            return Phase::Stale;
        };

        let phase = match (pending, reply) {
            (Pending::Create(placeholder), Reply::Created(result)) => {
                self.settle_create(placeholder, result)
            }
            (Pending::Update(id), Reply::Updated(result)) => {
                let outcome = match result {
                    Ok(task) => Outcome::Saved(task),
                    Err(error) => {
                        self.fail("Failed to update todo", &error);
                        Outcome::Failed
                    }
                };
                self.settle_one(ticket, id, outcome)
            }
            (Pending::Delete(id), Reply::Deleted(result)) => {
                let outcome = match result {
                    Ok(()) => Outcome::Removed,
                    Err(error) => {
                        self.fail("Failed to delete todo", &error);
                        Outcome::Failed
                    }
                };
                self.settle_one(ticket, id, outcome)
            }
            (Pending::Clear(_), Reply::DeletedMany(results)) => {
                self.settle_delete_many(ticket, results)
            }
            (pending, reply) => {
                tracing::error!(?ticket, ?pending, ?reply, "reply does not match the request");
                Phase::Stale
            }
        };

        tracing::debug!(?ticket, ?phase, "settled");
        phase
    }

    // Internals

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Queues `op` on each id under a fresh ticket and updates the entries.
    fn record(&mut self, ids: &[TaskId], op: Op) -> Ticket {
        let ticket = self.issue_ticket();
        for id in ids {
            if let Some(tracked) = self.tracked.get_mut(id) {
                tracing::warn!(%id, ?ticket, "overlapping mutations on the same todo");
                tracked.ops.insert(ticket, op.clone());
            } else if let Some(entry) = self.entries.iter().find(|e| e.id == LocalId::Stored(*id)) {
                let mut tracked = Tracked::new(entry.clone());
                tracked.ops.insert(ticket, op.clone());
                self.tracked.insert(*id, tracked);
            }
            self.refresh(id);
        }
        ticket
    }

    /// Rewrites the entry for `id` from its confirmed record and pending ops.
    /// An entry that reappears goes to the end of the list.
    fn refresh(&mut self, id: &TaskId) {
        let Some(tracked) = self.tracked.get(id) else {
            return;
        };
        let settled = tracked.ops.is_empty();
        let projected = tracked.projected();

        let local = LocalId::Stored(*id);
        match (self.entries.iter().position(|e| e.id == local), projected) {
            (Some(index), Some(entry)) => self.entries[index] = entry,
            (Some(index), None) => {
                self.entries.remove(index);
            }
            (None, Some(entry)) => self.entries.push(entry),
            (None, None) => {}
        }

        if settled {
            self.tracked.remove(id);
        }
    }

    fn settle_one(&mut self, ticket: Ticket, id: TaskId, outcome: Outcome) -> Phase {
        let Some(tracked) = self.tracked.get_mut(&id) else {
            tracing::debug!(%id, ?ticket, "reply for a todo that is no longer tracked");
            return Phase::Stale;
        };
        let Some(op) = tracked.ops.remove(&ticket) else {
            tracing::debug!(%id, ?ticket, "reply for a change that is no longer pending");
            return Phase::Stale;
        };
        let superseded = tracked.ops.keys().next_back().is_some_and(|newest| *newest > ticket);

        let phase = match outcome {
            Outcome::Saved(task) => tracked.confirm(ticket, op, task),
            Outcome::Removed => {
                self.tracked.remove(&id);
                self.entries.retain(|e| e.id != LocalId::Stored(id));
                Phase::Committed
            }
            Outcome::Failed => Phase::RolledBack,
        };
        self.refresh(&id);

        if superseded {
            tracing::warn!(%id, ?ticket, ?phase, "settled under a newer mutation on the same todo");
        }
        phase
    }

    fn stored_index(&self, id: &LocalId) -> Option<(TaskId, usize)> {
        let LocalId::Stored(task_id) = id else {
            tracing::debug!(?id, "ignoring action on an unconfirmed todo");
            return None;
        };
        let index = self.entries.iter().position(|e| e.id == *id)?;
        Some((*task_id, index))
    }

    /// Records a failed request: detail to the log, fixed message to the user.
    fn fail(&mut self, message: &str, error: &ApiError) {
        tracing::warn!(%error, "{}", message);
        self.error = Some(message.to_string());
    }

    fn settle_create(&mut self, placeholder: u64, result: Result<Task, ApiError>) -> Phase {
        self.submitting = self.submitting.saturating_sub(1);
        let local = LocalId::Placeholder(placeholder);
        match result {
            Ok(task) => {
                if let Some(entry) = self.entries.iter_mut().find(|e| e.id == local) {
                    *entry = Entry::from(task);
                }
                Phase::Committed
            }
            Err(error) => {
                self.entries.retain(|e| e.id != local);
                self.fail("Failed to create todo", &error);
                Phase::RolledBack
            }
        }
    }

    fn settle_load(&mut self, ticket: Ticket, result: Result<Vec<Task>, ApiError>) -> Phase {
        if self.load_ticket != Some(ticket) {
            tracing::debug!(?ticket, "ignoring superseded load");
            return Phase::Stale;
        }
        self.load_ticket = None;
        self.loading = false;

        let tasks = match result {
            Ok(tasks) => tasks,
            Err(error) => {
                self.fail("Failed to fetch todos", &error);
                return Phase::RolledBack;
            }
        };

        // Unconfirmed adds stay in front of the fetched list
        let mut entries: Vec<Entry> = self
            .entries
            .drain(..)
            .filter(|e| matches!(e.id, LocalId::Placeholder(_)))
            .collect();
        entries.extend(tasks.into_iter().map(Entry::from));
        self.entries = entries;

        // Fetched records become the confirmed base for todos with changes in flight
        let ids: Vec<TaskId> = self.tracked.keys().copied().collect();
        for id in &ids {
            let local = LocalId::Stored(*id);
            match self.entries.iter().find(|e| e.id == local) {
                Some(fetched) => {
                    if let Some(tracked) = self.tracked.get_mut(id) {
                        tracked.base = fetched.clone();
                    }
                }
                None => {
                    tracing::debug!(%id, "todo with pending changes is gone from the store");
                    self.tracked.remove(id);
                }
            }
            self.refresh(id);
        }
        Phase::Committed
    }

    fn settle_delete_many(
        &mut self,
        ticket: Ticket,
        results: Vec<(TaskId, Result<(), ApiError>)>,
    ) -> Phase {
        let total = results.len();
        let mut failed = 0;
        for (id, result) in results {
            let outcome = match result {
                Ok(()) => Outcome::Removed,
                Err(error) => {
                    tracing::warn!(%id, %error, "delete failed while clearing completed");
                    failed += 1;
                    Outcome::Failed
                }
            };
            self.settle_one(ticket, id, outcome);
        }
        if failed == 0 {
            return Phase::Committed;
        }

        self.error = Some(format!(
            "Failed to clear completed todos: {} of {} could not be deleted",
            failed, total
        ));
        Phase::RolledBack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn rejected(message: &str) -> ApiError {
        ApiError::Status { status: 500, message: message.to_string() }
    }

    fn stored(text: &str, completed: bool) -> Task {
        let mut task = Task::new(TaskText::parse(text).unwrap());
        task.completed = completed;
        task
    }

    fn loaded(tasks: Vec<Task>) -> TodoState {
        let mut state = TodoState::new();
        let request = state.begin_load();
        assert_eq!(state.settle(request.ticket, Reply::Loaded(Ok(tasks))), Phase::Committed);
        state
    }

    fn local(task: &Task) -> LocalId {
        LocalId::Stored(task.id)
    }

    #[test]
    fn load_success_fills_the_list() {
        let tasks = vec![stored("b", false), stored("a", true)];
        let mut state = TodoState::new();
        let request = state.begin_load();
        assert!(state.is_loading());
        assert_eq!(request.call, Call::Load);

        state.settle(request.ticket, Reply::Loaded(Ok(tasks.clone())));
        assert!(!state.is_loading());
        let ids: Vec<_> = state.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![local(&tasks[0]), local(&tasks[1])]);
    }

    #[test]
    fn load_failure_leaves_list_empty_with_error() {
        let mut state = TodoState::new();
        let request = state.begin_load();
        let phase = state.settle(request.ticket, Reply::Loaded(Err(rejected("boom"))));

        assert_eq!(phase, Phase::RolledBack);
        assert!(!state.is_loading());
        assert!(state.entries().is_empty());
        assert_eq!(state.error(), Some("Failed to fetch todos"));
    }

    #[test]
    fn add_inserts_placeholder_at_head_then_confirms() {
        let existing = stored("existing", false);
        let mut state = loaded(vec![existing.clone()]);

        let now = Utc::now();
        let request = state.add_at("  Buy milk ", now).unwrap();
        assert!(state.is_submitting());
        let head = &state.entries()[0];
        assert!(matches!(head.id, LocalId::Placeholder(_)));
        assert_eq!(head.text.as_str(), "Buy milk");
        assert!(!head.completed);
        assert_eq!(head.created_at, now);
        assert_eq!(request.call, Call::Create { text: TaskText::parse("Buy milk").unwrap() });

        let confirmed = stored("Buy milk", false);
        let phase = state.settle(request.ticket, Reply::Created(Ok(confirmed.clone())));
        assert_eq!(phase, Phase::Committed);
        assert!(!state.is_submitting());
        assert_eq!(state.entries()[0], Entry::from(confirmed));
        assert_eq!(state.entries()[1].id, local(&existing));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn failed_add_drops_the_placeholder() {
        let mut state = loaded(vec![]);
        let request = state.add("Buy milk").unwrap();
        assert_eq!(state.entries().len(), 1);

        let phase = state.settle(request.ticket, Reply::Created(Err(rejected("store down"))));
        assert_eq!(phase, Phase::RolledBack);
        assert!(state.entries().is_empty());
        assert!(!state.is_submitting());
        assert_eq!(state.error(), Some("Failed to create todo"));
    }

    #[test]
    fn concurrent_adds_get_distinct_placeholders() {
        let mut state = loaded(vec![]);
        let now = Utc::now();
        let first = state.add_at("one", now).unwrap();
        let second = state.add_at("two", now).unwrap();
        assert_ne!(state.entries()[0].id, state.entries()[1].id);

        // Second settles first; each replaces only its own placeholder
        let two = stored("two", false);
        let one = stored("one", false);
        state.settle(second.ticket, Reply::Created(Ok(two.clone())));
        state.settle(first.ticket, Reply::Created(Err(rejected("nope"))));

        assert_eq!(state.entries(), &[Entry::from(two)][..]);
        assert!(state.entries().iter().all(|e| e.id != local(&one)));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_add_is_ignored(#[case] text: &str) {
        let mut state = loaded(vec![]);
        assert!(state.add(text).is_none());
        assert!(state.entries().is_empty());
        assert!(!state.is_submitting());
    }

    #[test]
    fn add_clears_previous_error() {
        let mut state = TodoState::new();
        let load = state.begin_load();
        state.settle(load.ticket, Reply::Loaded(Err(rejected("x"))));
        assert!(state.error().is_some());

        state.add("next").unwrap();
        assert!(state.error().is_none());
    }

    #[test]
    fn toggle_is_optimistic_and_confirms() {
        let task = stored("Walk dog", false);
        let mut state = loaded(vec![task.clone()]);

        let request = state.toggle(&local(&task)).unwrap();
        assert!(state.entries()[0].completed);
        assert!(state.is_pending(&local(&task)));
        assert_eq!(
            request.call,
            Call::Update { id: task.id, patch: TaskPatch::completed(true) }
        );

        let mut confirmed = task.clone();
        confirmed.completed = true;
        assert_eq!(state.settle(request.ticket, Reply::Updated(Ok(confirmed))), Phase::Committed);
        assert!(state.entries()[0].completed);
        assert!(!state.is_pending(&local(&task)));
    }

    #[test]
    fn failed_toggle_reverts() {
        let task = stored("Walk dog", false);
        let mut state = loaded(vec![task.clone()]);

        let request = state.toggle(&local(&task)).unwrap();
        let phase = state.settle(request.ticket, Reply::Updated(Err(rejected("offline"))));

        assert_eq!(phase, Phase::RolledBack);
        assert_eq!(state.entries()[0], Entry::from(task));
        assert_eq!(state.error(), Some("Failed to update todo"));
    }

    #[test]
    fn double_toggle_returns_to_original() {
        let task = stored("Stretch", false);
        let mut state = loaded(vec![task.clone()]);

        let first = state.toggle(&local(&task)).unwrap();
        let second = state.toggle(&local(&task)).unwrap();
        assert!(!state.entries()[0].completed);

        let mut on = task.clone();
        on.completed = true;
        let off = task.clone();

        // The first save lands but the second toggle still shows on top of it
        assert_eq!(state.settle(first.ticket, Reply::Updated(Ok(on))), Phase::Committed);
        assert!(!state.entries()[0].completed);
        assert!(state.is_pending(&local(&task)));
        assert_eq!(state.settle(second.ticket, Reply::Updated(Ok(off))), Phase::Committed);
        assert!(!state.entries()[0].completed);
        assert!(!state.is_pending(&local(&task)));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn older_save_after_newer_one_is_stale() {
        let task = stored("Stretch", false);
        let mut state = loaded(vec![task.clone()]);

        let first = state.toggle(&local(&task)).unwrap();
        let second = state.toggle(&local(&task)).unwrap();

        let mut on = task.clone();
        on.completed = true;
        assert_eq!(state.settle(second.ticket, Reply::Updated(Ok(task.clone()))), Phase::Committed);
        assert_eq!(state.settle(first.ticket, Reply::Updated(Ok(on))), Phase::Stale);
        assert_eq!(state.entries()[0], Entry::from(task));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn stale_failure_does_not_clobber_newer_edit() {
        let task = stored("v1", false);
        let mut state = loaded(vec![task.clone()]);

        let first = state.edit(&local(&task), "v2").unwrap();
        let second = state.edit(&local(&task), "v3").unwrap();

        let phase = state.settle(first.ticket, Reply::Updated(Err(rejected("x"))));
        assert_eq!(phase, Phase::RolledBack);
        assert_eq!(state.entries()[0].text.as_str(), "v3");
        assert!(state.error().is_some());

        let mut confirmed = task.clone();
        confirmed.text = TaskText::parse("v3").unwrap();
        let phase = state.settle(second.ticket, Reply::Updated(Ok(confirmed.clone())));
        assert_eq!(phase, Phase::Committed);
        assert_eq!(state.entries()[0], Entry::from(confirmed));
    }

    #[rstest]
    #[case::in_order(false)]
    #[case::newest_first(true)]
    fn failed_edit_and_toggle_restore_confirmed_record(#[case] newest_first: bool) {
        let task = stored("v1", false);
        let mut state = loaded(vec![task.clone()]);

        let edit = state.edit(&local(&task), "v2").unwrap();
        let toggle = state.toggle(&local(&task)).unwrap();
        assert_eq!(state.entries()[0].text.as_str(), "v2");
        assert!(state.entries()[0].completed);

        let mut tickets = vec![edit.ticket, toggle.ticket];
        if newest_first {
            tickets.reverse();
        }
        for ticket in tickets {
            let phase = state.settle(ticket, Reply::Updated(Err(rejected("offline"))));
            assert_eq!(phase, Phase::RolledBack);
        }

        assert_eq!(state.entries(), &[Entry::from(task.clone())][..]);
        assert!(!state.is_pending(&local(&task)));
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn failed_edit_keeps_newer_confirmed_toggle() {
        let task = stored("v1", false);
        let mut state = loaded(vec![task.clone()]);

        let edit = state.edit(&local(&task), "v2").unwrap();
        let toggle = state.toggle(&local(&task)).unwrap();

        let mut toggled = task.clone();
        toggled.completed = true;
        let phase = state.settle(toggle.ticket, Reply::Updated(Ok(toggled.clone())));
        assert_eq!(phase, Phase::Committed);
        let phase = state.settle(edit.ticket, Reply::Updated(Err(rejected("offline"))));
        assert_eq!(phase, Phase::RolledBack);

        assert_eq!(state.entries()[0], Entry::from(toggled));
    }

    #[rstest]
    #[case("Same")]
    #[case("  Same  ")]
    #[case("")]
    fn edit_without_change_is_a_no_op(#[case] text: &str) {
        let task = stored("Same", false);
        let mut state = loaded(vec![task.clone()]);
        assert!(state.edit(&local(&task), text).is_none());
        assert_eq!(state.pending_count(), 0);
    }

    #[test]
    fn failed_edit_reverts_text() {
        let task = stored("Before", true);
        let mut state = loaded(vec![task.clone()]);

        let request = state.edit(&local(&task), "After").unwrap();
        assert_eq!(state.entries()[0].text.as_str(), "After");
        assert_eq!(
            request.call,
            Call::Update { id: task.id, patch: TaskPatch::text(TaskText::parse("After").unwrap()) }
        );

        state.settle(request.ticket, Reply::Updated(Err(rejected("x"))));
        assert_eq!(state.entries()[0], Entry::from(task));
    }

    #[test]
    fn failed_delete_reinserts_at_the_end() {
        let a = stored("a", false);
        let b = stored("b", false);
        let c = stored("c", false);
        let mut state = loaded(vec![a.clone(), b.clone(), c.clone()]);

        let request = state.delete(&local(&a)).unwrap();
        assert_eq!(state.entries().len(), 2);
        assert_eq!(request.call, Call::Delete { id: a.id });

        let phase = state.settle(request.ticket, Reply::Deleted(Err(rejected("x"))));
        assert_eq!(phase, Phase::RolledBack);
        let ids: Vec<_> = state.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![local(&b), local(&c), local(&a)]);
        assert_eq!(state.error(), Some("Failed to delete todo"));
    }

    #[test]
    fn confirmed_delete_stays_removed() {
        let a = stored("a", false);
        let mut state = loaded(vec![a.clone()]);
        let request = state.delete(&local(&a)).unwrap();
        assert_eq!(state.settle(request.ticket, Reply::Deleted(Ok(()))), Phase::Committed);
        assert!(state.entries().is_empty());
    }

    #[rstest]
    #[case::in_order(false)]
    #[case::newest_first(true)]
    fn failed_toggle_and_delete_reinsert_confirmed_record(#[case] newest_first: bool) {
        let a = stored("a", false);
        let b = stored("b", false);
        let mut state = loaded(vec![a.clone(), b.clone()]);

        let toggle = state.toggle(&local(&a)).unwrap();
        let delete = state.delete(&local(&a)).unwrap();
        assert_eq!(state.entries().len(), 1);

        let (first, second) = if newest_first {
            (
                state.settle(delete.ticket, Reply::Deleted(Err(rejected("x")))),
                state.settle(toggle.ticket, Reply::Updated(Err(rejected("x")))),
            )
        } else {
            (
                state.settle(toggle.ticket, Reply::Updated(Err(rejected("x")))),
                state.settle(delete.ticket, Reply::Deleted(Err(rejected("x")))),
            )
        };
        assert_eq!((first, second), (Phase::RolledBack, Phase::RolledBack));

        assert_eq!(state.entries(), &[Entry::from(b), Entry::from(a.clone())][..]);
        assert!(!state.is_pending(&local(&a)));
    }

    #[test]
    fn failed_delete_reinserts_with_confirmed_toggle() {
        let a = stored("a", false);
        let mut state = loaded(vec![a.clone()]);

        let toggle = state.toggle(&local(&a)).unwrap();
        let delete = state.delete(&local(&a)).unwrap();

        let mut done = a.clone();
        done.completed = true;
        assert_eq!(state.settle(toggle.ticket, Reply::Updated(Ok(done.clone()))), Phase::Committed);
        assert!(state.entries().is_empty());
        state.settle(delete.ticket, Reply::Deleted(Err(rejected("x"))));

        assert_eq!(state.entries(), &[Entry::from(done)][..]);
    }

    #[test]
    fn actions_on_placeholders_are_ignored() {
        let mut state = loaded(vec![]);
        state.add("pending").unwrap();
        let placeholder = state.entries()[0].id;

        assert!(state.toggle(&placeholder).is_none());
        assert!(state.edit(&placeholder, "changed").is_none());
        assert!(state.delete(&placeholder).is_none());
        assert_eq!(state.entries()[0].text.as_str(), "pending");
    }

    #[test]
    fn clear_completed_without_completed_is_a_no_op() {
        let mut state = loaded(vec![stored("open", false)]);
        assert!(state.clear_completed().is_none());
        assert_eq!(state.entries().len(), 1);
    }

    #[test]
    fn clear_completed_restores_only_failed_deletes() {
        let open = stored("open", false);
        let done_ok = stored("done ok", true);
        let done_fail = stored("done fail", true);
        let mut state = loaded(vec![open.clone(), done_ok.clone(), done_fail.clone()]);

        let request = state.clear_completed().unwrap();
        assert_eq!(request.call, Call::DeleteMany { ids: vec![done_ok.id, done_fail.id] });
        assert_eq!(state.entries().len(), 1);

        let phase = state.settle(
            request.ticket,
            Reply::DeletedMany(vec![
                (done_ok.id, Ok(())),
                (done_fail.id, Err(rejected("locked"))),
            ]),
        );
        assert_eq!(phase, Phase::RolledBack);
        let ids: Vec<_> = state.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![local(&open), local(&done_fail)]);
        assert_eq!(
            state.error(),
            Some("Failed to clear completed todos: 1 of 2 could not be deleted")
        );
    }

    #[test]
    fn clear_completed_commits_when_all_succeed() {
        let done = stored("done", true);
        let mut state = loaded(vec![done.clone()]);
        let request = state.clear_completed().unwrap();
        let phase = state.settle(request.ticket, Reply::DeletedMany(vec![(done.id, Ok(()))]));
        assert_eq!(phase, Phase::Committed);
        assert!(state.entries().is_empty());
        assert!(state.error().is_none());
    }

    #[rstest]
    #[case(Filter::All, 3)]
    #[case(Filter::Active, 2)]
    #[case(Filter::Completed, 1)]
    fn visible_follows_filter(#[case] filter: Filter, #[case] expected: usize) {
        let mut state = loaded(vec![stored("a", false), stored("b", true), stored("c", false)]);
        state.set_filter(filter);
        assert_eq!(state.visible().len(), expected);
        assert_eq!(state.stats(), Stats { total: 3, active: 2, completed: 1 });
    }

    #[test]
    fn load_keeps_unconfirmed_adds() {
        let mut state = TodoState::new();
        let load = state.begin_load();
        let add = state.add_at("early", Utc::now() - Duration::seconds(1)).unwrap();

        let fetched = stored("fetched", false);
        state.settle(load.ticket, Reply::Loaded(Ok(vec![fetched.clone()])));
        assert_eq!(state.entries().len(), 2);
        assert!(matches!(state.entries()[0].id, LocalId::Placeholder(_)));

        let created = stored("early", false);
        state.settle(add.ticket, Reply::Created(Ok(created.clone())));
        assert_eq!(state.entries()[0], Entry::from(created));
        assert_eq!(state.entries()[1], Entry::from(fetched));
    }

    #[test]
    fn unknown_ticket_is_stale() {
        let mut state = loaded(vec![]);
        let phase = state.settle(Ticket(999), Reply::Deleted(Ok(())));
        assert_eq!(phase, Phase::Stale);
    }
}
