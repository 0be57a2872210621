// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware, which provides `AuthUser` and `RequestContext`
pub mod audit;
pub mod auth;
pub mod resource;
