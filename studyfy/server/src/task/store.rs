use crate::entities::tasks;
use crate::task::TaskDraft;
use crate::task::tags;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::NullOrdering;
use sea_orm::*;

/// Column values written by an insert or a full-record update.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskColumns {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: String,
    pub status: String,
    pub tags: serde_json::Value,
}

impl From<&TaskDraft> for TaskColumns {
    fn from(draft: &TaskDraft) -> Self {
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: draft.due_date,
            priority: draft.priority.to_string(),
            status: draft.status.to_string(),
            tags: tags::to_stored(&draft.tags),
        }
    }
}

/// Query surface of the `tasks` table.
///
/// Every operation is scoped to the owning user; a row belonging to someone
/// else behaves exactly like a missing row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns the owner's rows ordered by due date, undated rows last.
    async fn select_by_owner(&self, user_id: &str) -> Result<Vec<tasks::Model>, DbErr>;

    /// Inserts one row and returns it with its assigned ID.
    async fn insert_one(&self, user_id: &str, columns: TaskColumns)
    -> Result<tasks::Model, DbErr>;

    /// Overwrites every column of a row. Returns `None` when no such row exists.
    async fn update_by_id(
        &self,
        user_id: &str,
        id: i32,
        columns: TaskColumns,
    ) -> Result<Option<tasks::Model>, DbErr>;

    /// Deletes a row and returns the number of rows removed.
    async fn delete_by_id(&self, user_id: &str, id: i32) -> Result<u64, DbErr>;
}

pub struct SeaOrmTaskStore<'a> {
    db: &'a DatabaseConnection,
}

impl SeaOrmTaskStore<'_> {
    pub fn new(db: &DatabaseConnection) -> SeaOrmTaskStore<'_> {
        SeaOrmTaskStore { db }
    }

    async fn find_owned(&self, user_id: &str, id: i32) -> Result<Option<tasks::Model>, DbErr> {
        tasks::Entity::find_by_id(id)
            .filter(tasks::Column::UserId.eq(user_id))
            .one(self.db)
            .await
    }
}

#[async_trait]
impl TaskStore for SeaOrmTaskStore<'_> {
    #[tracing::instrument(skip(self))]
    async fn select_by_owner(&self, user_id: &str) -> Result<Vec<tasks::Model>, DbErr> {
        tasks::Entity::find()
            .filter(tasks::Column::UserId.eq(user_id))
            .order_by_with_nulls(tasks::Column::DueDate, Order::Asc, NullOrdering::Last)
            .order_by_asc(tasks::Column::Id)
            .all(self.db)
            .await
    }

    #[tracing::instrument(skip(self, columns))]
    async fn insert_one(
        &self,
        user_id: &str,
        columns: TaskColumns,
    ) -> Result<tasks::Model, DbErr> {
        let active_model = tasks::ActiveModel {
            user_id: ActiveValue::Set(user_id.to_string()),
            title: ActiveValue::Set(columns.title),
            description: ActiveValue::Set(columns.description),
            due_date: ActiveValue::Set(columns.due_date.map(|date| date.fixed_offset())),
            priority: ActiveValue::Set(columns.priority),
            status: ActiveValue::Set(columns.status),
            tags: ActiveValue::Set(columns.tags),
            ..Default::default()
        };
        active_model.insert(self.db).await
    }

    #[tracing::instrument(skip(self, columns))]
    async fn update_by_id(
        &self,
        user_id: &str,
        id: i32,
        columns: TaskColumns,
    ) -> Result<Option<tasks::Model>, DbErr> {
        let Some(task_to_update) = self.find_owned(user_id, id).await? else {
            return Ok(None);
        };

        let mut active_model: tasks::ActiveModel = task_to_update.into();
        active_model.title = ActiveValue::Set(columns.title);
        active_model.description = ActiveValue::Set(columns.description);
        active_model.due_date = ActiveValue::Set(columns.due_date.map(|date| date.fixed_offset()));
        active_model.priority = ActiveValue::Set(columns.priority);
        active_model.status = ActiveValue::Set(columns.status);
        active_model.tags = ActiveValue::Set(columns.tags);
        let updated_model = active_model.update(self.db).await?;
        Ok(Some(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, user_id: &str, id: i32) -> Result<u64, DbErr> {
        let result = tasks::Entity::delete_many()
            .filter(tasks::Column::Id.eq(id))
            .filter(tasks::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
