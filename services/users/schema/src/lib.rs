//! sea-orm entities for the users service tables.

pub mod accounts;
pub mod permissions;
pub mod resource_permissions;
pub mod resources;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;
