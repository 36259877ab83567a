// handlers/mod.rs
//
// Public:  /, /health
// Guarded: /api/users/:user_id[/...], /api/profile?userId=
//
// Guarded handlers take a `GuardedIdentity` (or `OwnerIdentity`) argument,
// so the identity check runs once, before any resource query.

pub mod system;
pub mod users;
