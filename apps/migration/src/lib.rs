//! Schema migrations for the Quill backend.

pub use sea_orm_migration::prelude::*;

mod m20250610_000001_create_users;
mod m20250610_000002_create_posts;
mod m20250610_000003_create_comments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250610_000001_create_users::Migration),
            Box::new(m20250610_000002_create_posts::Migration),
            Box::new(m20250610_000003_create_comments::Migration),
        ]
    }
}
