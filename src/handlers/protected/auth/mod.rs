// handlers/protected/auth/mod.rs - Session introspection

pub mod whoami;

pub use whoami::whoami;
