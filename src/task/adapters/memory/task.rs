//! In-memory [`TaskRepository`], used by tests and ephemeral sessions.

use crate::task::domain::{Tag, TagId, Task, TaskId};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    task_order: Vec<TaskId>,
    tags: HashMap<TagId, Tag>,
    tag_order: Vec<TagId>,
    task_tags: HashSet<(TaskId, TagId)>,
}

/// Thread-safe in-memory task repository.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    state: RwLock<State>,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_read(state: &RwLock<State>) -> std::sync::RwLockReadGuard<'_, State> {
    state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn lock_write(state: &RwLock<State>) -> std::sync::RwLockWriteGuard<'_, State> {
    state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert_task(&self, task: Task) -> Result<Task, TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        state.task_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, TaskRepositoryError> {
        lock_read(&self.state)
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(id))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        Ok(state
            .task_order
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    async fn list_children(&self, parent_id: Option<TaskId>) -> Result<Vec<Task>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        Ok(state
            .task_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| task.parent_id() == parent_id)
            .cloned()
            .collect())
    }

    async fn ancestors(&self, id: TaskId) -> Result<Vec<TaskId>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        let mut result = Vec::new();
        let mut current = state
            .tasks
            .get(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?
            .parent_id();
        while let Some(ancestor_id) = current {
            result.push(ancestor_id);
            current = state.tasks.get(&ancestor_id).and_then(Task::parent_id);
        }
        Ok(result)
    }

    async fn descendants(&self, id: TaskId) -> Result<Vec<TaskId>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        if !state.tasks.contains_key(&id) {
            return Err(TaskRepositoryError::NotFound(id));
        }
        let mut result = Vec::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for task in state.tasks.values() {
                if task.parent_id() == Some(current) {
                    result.push(task.id());
                    frontier.push(task.id());
                }
            }
        }
        Ok(result)
    }

    async fn update_task(&self, task: Task) -> Result<Task, TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        for id in ids {
            state.tasks.remove(id);
            state.task_order.retain(|existing| existing != id);
            state.task_tags.retain(|(task_id, _)| task_id != id);
        }
        Ok(())
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, TaskRepositoryError> {
        Ok(lock_read(&self.state)
            .tags
            .values()
            .find(|tag| tag.name() == name)
            .cloned())
    }

    async fn insert_tag(&self, tag: Tag) -> Result<Tag, TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        state.tag_order.push(tag.id());
        state.tags.insert(tag.id(), tag.clone());
        Ok(tag)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        Ok(state
            .tag_order
            .iter()
            .filter_map(|id| state.tags.get(id).cloned())
            .collect())
    }

    async fn attach_tag(&self, task_id: TaskId, tag_id: TagId) -> Result<bool, TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        if !state.tasks.contains_key(&task_id) {
            return Err(TaskRepositoryError::NotFound(task_id));
        }
        if !state.tags.contains_key(&tag_id) {
            return Err(TaskRepositoryError::TagNotFound(tag_id));
        }
        Ok(state.task_tags.insert((task_id, tag_id)))
    }

    async fn detach_tag(&self, task_id: TaskId, tag_id: TagId) -> Result<bool, TaskRepositoryError> {
        let mut state = lock_write(&self.state);
        Ok(state.task_tags.remove(&(task_id, tag_id)))
    }

    async fn tags_for_task(&self, task_id: TaskId) -> Result<Vec<Tag>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        Ok(state
            .task_tags
            .iter()
            .filter(|(task, _)| *task == task_id)
            .filter_map(|(_, tag_id)| state.tags.get(tag_id).cloned())
            .collect())
    }

    async fn tag_usage_counts(&self) -> Result<HashMap<TagId, i64>, TaskRepositoryError> {
        let state = lock_read(&self.state);
        let mut counts: HashMap<TagId, i64> = HashMap::new();
        for (_, tag_id) in &state.task_tags {
            *counts.entry(*tag_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
