pub use sea_orm_migration::prelude::*;

mod m20260214_000001_create_users;
mod m20260214_000002_create_students;
mod m20260214_000003_create_invites;
mod m20260214_000004_create_feedback;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260214_000001_create_users::Migration),
            Box::new(m20260214_000002_create_students::Migration),
            Box::new(m20260214_000003_create_invites::Migration),
            Box::new(m20260214_000004_create_feedback::Migration),
        ]
    }
}
