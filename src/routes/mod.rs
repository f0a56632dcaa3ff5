//! Router modules, split by who the routes are for.
//!
//! Every route sits behind the global identity middleware, which never rejects. Role and
//! ownership checks happen per operation in the handlers, through the rules in
//! [`crate::guard::rules`].

/// Routes reachable without a credential.
pub mod public;

/// Routes for signed-in users: employers, job seekers, and `/auth/me` for anyone.
pub mod authenticated;

/// Routes for the admin role, nested under `/admin`.
pub mod admin;
