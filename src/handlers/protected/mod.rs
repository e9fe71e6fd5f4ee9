// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: JWT validation; every handler receives the caller's `AuthUser`
// and works inside its tenant scope.

pub mod auth;
pub mod currency;
pub mod integrations;
pub mod invoices;
pub mod leave;
pub mod probations;
pub mod reconciliations;
pub mod referrals;
pub mod resources;
