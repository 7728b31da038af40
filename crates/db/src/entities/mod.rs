//! `SeaORM` entity definitions.

pub mod prelude;

pub mod account_members;
pub mod accounts;
pub mod refresh_tokens;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
