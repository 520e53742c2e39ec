//! Database migrations for the Civitas application

pub use sea_orm_migration::prelude::*;

mod migration;
pub use migration::Migrator;
