//! Recipient directory used by senders when addressing an invite.

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

use crate::application::database::DbConn;
use crate::application::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::student;
use crate::services::contact::RawEmail;

pub const SEARCH_LIMIT: u64 = 10;

#[derive(Clone)]
pub struct StudentService {
    db: DbConn,
}

impl StudentService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Case-insensitive substring search over name, roll number and email.
    pub async fn search(&self, query: &str) -> Result<Vec<student::Model>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", query);

        let matches = |column: student::Column| {
            Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone())
        };

        let students = Student::find()
            .filter(
                Condition::any()
                    .add(matches(student::Column::Name))
                    .add(matches(student::Column::RollNumber))
                    .add(matches(student::Column::Email)),
            )
            .order_by_asc(student::Column::Name)
            .limit(SEARCH_LIMIT)
            .all(&self.db)
            .await?;

        Ok(students)
    }

    /// Find a recipient by email, creating one if needed.
    pub async fn find_or_create(&self, name: &str, email: &str) -> Result<student::Model> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() {
            return Err(AppError::Validation("Name and email are required".to_string()));
        }
        let email = RawEmail::parse(email)
            .ok_or_else(|| AppError::Validation("Please enter a valid email address".to_string()))?;

        if let Some(existing) = self.find_by_email(email.as_str()).await? {
            return Ok(existing);
        }

        let created = student::ActiveModel {
            name: Set(name.to_string()),
            roll_number: Set(None),
            email: Set(Some(email.to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match created {
            Ok(student) => {
                tracing::info!(student_id = student.id, "Recipient added");
                Ok(student)
            }
            // Lost a race with another sender adding the same address.
            Err(e) if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => self
                .find_by_email(email.as_str())
                .await?
                .ok_or_else(|| AppError::Internal("Recipient vanished after insert conflict".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<student::Model>> {
        Ok(Student::find()
            .filter(student::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}
