// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: /auth/*
pub mod auth;
