use crate::entities::tasks;
use crate::task::store::{TaskColumns, TaskStore};
use crate::task::{Priority, Status, StoreError, Task, TaskError, TaskInput, tags};
use chrono::Utc;

impl TryFrom<tasks::Model> for Task {
    type Error = StoreError;

    fn try_from(model: tasks::Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let malformed = |reason: String| StoreError::MalformedRow { id, reason };

        let priority = model
            .priority
            .parse::<Priority>()
            .map_err(|err| malformed(err.to_string()))?;
        let status = model
            .status
            .parse::<Status>()
            .map_err(|err| malformed(err.to_string()))?;
        let tags = tags::from_stored(&model.tags)
            .ok_or_else(|| malformed(format!("unreadable tags value {}", model.tags)))?;

        Ok(Task {
            id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            due_date: model.due_date.map(|date| date.with_timezone(&Utc)),
            priority,
            status,
            tags,
        })
    }
}

/// Translates task operations into owner-scoped store queries and normalizes
/// what comes back into [`Task`] values.
pub struct TaskRepository<S> {
    store: S,
}

impl<S: TaskStore> TaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the user's tasks, earliest due date first.
    ///
    /// A user without tasks gets an empty list, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, TaskError> {
        let rows = self
            .store
            .select_by_owner(user_id)
            .await
            .map_err(StoreError::from)?;
        let tasks = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Validates the input and persists one new task for the user.
    ///
    /// # Errors
    ///
    /// A [`TaskError::Validation`] is returned before the store is contacted.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_task(&self, user_id: &str, input: TaskInput) -> Result<Task, TaskError> {
        let draft = input.validate()?;
        let created = self
            .store
            .insert_one(user_id, TaskColumns::from(&draft))
            .await
            .map_err(StoreError::from)?;
        Ok(Task::try_from(created)?)
    }

    /// Replaces every field of an existing task.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_task(
        &self,
        user_id: &str,
        id: i32,
        input: TaskInput,
    ) -> Result<Task, TaskError> {
        let draft = input.validate()?;
        let updated = self
            .store
            .update_by_id(user_id, id, TaskColumns::from(&draft))
            .await
            .map_err(StoreError::from)?
            .ok_or(StoreError::TaskNotFound(id))?;
        Ok(Task::try_from(updated)?)
    }

    /// Deletes a task. A missing ID is reported as [`StoreError::TaskNotFound`].
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, user_id: &str, id: i32) -> Result<(), TaskError> {
        let deleted = self
            .store
            .delete_by_id(user_id, id)
            .await
            .map_err(StoreError::from)?;
        if deleted == 0 {
            return Err(StoreError::TaskNotFound(id).into());
        }
        Ok(())
    }
}
