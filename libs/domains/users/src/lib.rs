//! Users Domain
//!
//! League user accounts: registration with email confirmation, login with
//! bearer tokens, role grants and role-based authorization.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, caller roles from the JWT
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌────────────────┐
//! │   Service   │ ───► │ IdentityStore  │  credentials, confirmation tokens
//! └──────┬──────┘      │ TokenIssuer    │  bearer tokens
//!        │             └────────────────┘
//! ┌──────▼──────┐
//! │ Repository  │  ← users + outbox, committed together
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌────────────────┐
//! │ OutboxRelay │ ───► │ Team/Messaging │  carpool registration, email
//! └─────────────┘      └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{InMemoryUserRepository, UserService, handlers};
//! use std::sync::Arc;
//!
//! let jwt = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-thirty-two-chars"));
//! let service = UserService::new(InMemoryUserRepository::new(), Arc::new(jwt.clone()));
//!
//! let router = handlers::router(service, jwt);
//! ```

pub mod authorization;
pub mod clients;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod mapper;
pub mod models;
pub mod outbox;
pub mod postgres;
pub mod repository;
pub mod role;
pub mod service;
pub mod tokens;

pub use clients::{HttpMessagingClient, HttpTeamClient, MessagingClient, TeamClient};
pub use config::{OutboxConfig, RegistrationConfig, ServiceClientsConfig};
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use identity::{Argon2IdentityStore, IdentityStore};
pub use models::{
    Actor, AuthResponse, CreateUser, EditUser, LoggedInUserView, LoginRequest, RoleView, User,
    UserFilter, UserView,
};
pub use outbox::{InMemoryOutbox, OutboxRelay, PostgresOutbox};
pub use postgres::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use role::Role;
pub use service::UserService;
pub use tokens::TokenIssuer;
