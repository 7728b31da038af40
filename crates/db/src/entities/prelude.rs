//! Entity re-exports.

pub use super::account_members::Entity as AccountMembers;
pub use super::accounts::Entity as Accounts;
pub use super::refresh_tokens::Entity as RefreshTokens;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
