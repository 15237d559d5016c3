use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::authorization::{allowed_to_alter_user, can_grant};
use crate::clients::EmailMessage;
use crate::config::RegistrationConfig;
use crate::error::{UserError, UserResult};
use crate::identity::{Argon2IdentityStore, IdentityStore};
use crate::mapper::to_logged_in_view;
use crate::models::{
    Actor, AuthResponse, CreateUser, EditUser, EmailConfirmationQuery, ListUsersResponse,
    LoggedInUserView, RoleView, User, UserFilter, UserView, changed_value, is_blank, normalize,
};
use crate::outbox::OutboxEvent;
use crate::repository::UserRepository;
use crate::role::Role;
use crate::tokens::TokenIssuer;

const CONFIRMATION_SUBJECT: &str = "Confirm your league account";

/// Service layer for account and role business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    identity: Arc<dyn IdentityStore>,
    tokens: Arc<dyn TokenIssuer>,
    registration: RegistrationConfig,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            identity: Arc::clone(&self.identity),
            tokens: Arc::clone(&self.tokens),
            registration: self.registration.clone(),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            repository: Arc::new(repository),
            identity: Arc::new(Argon2IdentityStore::new()),
            tokens,
            registration: RegistrationConfig::default(),
        }
    }

    pub fn with_identity_store(mut self, identity: Arc<dyn IdentityStore>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_registration(mut self, registration: RegistrationConfig) -> Self {
        self.registration = registration;
        self
    }

    /// Register a new account.
    ///
    /// The very first registrant becomes Admin. Everyone else starts as
    /// UnconfirmedUser with the requested role parked for approval. A
    /// confirmation email is queued in the same commit.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<AuthResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if self.repository.username_exists(&username).await? {
            return Err(UserError::DuplicateUsername(username));
        }
        if self.repository.email_exists(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        let mut user = User::new(
            username,
            email,
            input.full_name.trim().to_string(),
            input.phone_number.trim().to_string(),
            input.team_id,
        );

        let admin_exists = self
            .repository
            .count(UserFilter::with_role(Role::Admin))
            .await?
            > 0;
        if admin_exists {
            user.requested_role = input.role_name.filter(|role| role.is_confirmed());
        } else {
            user.role = Role::Admin;
            tracing::warn!(username = %user.username, "No Admin exists yet; bootstrapping registrant as Admin");
        }

        self.identity.create_account(&mut user, &input.password)?;

        let token = self.identity.issue_email_confirmation_token(&mut user);
        let base = input
            .client_uri
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| self.registration.default_confirmation_url());
        let link = confirmation_link(&base, &user.email, &token);

        let email = OutboxEvent::SendEmail(EmailMessage {
            to: vec![user.email.clone()],
            subject: CONFIRMATION_SUBJECT.to_string(),
            content: format!(
                "Hello {},\n\nPlease confirm your account by following this link:\n{}",
                user.full_name, link
            ),
        });

        let created = self.repository.create(user, vec![email]).await?;

        Ok(AuthResponse {
            is_auth_successful: true,
            error_message: None,
            user: Some(created.into()),
        })
    }

    /// Complete the email confirmation started at registration.
    pub async fn confirm_email(&self, query: EmailConfirmationQuery) -> UserResult<()> {
        let mut user = self
            .repository
            .get_by_email(&query.email)
            .await?
            .ok_or(UserError::InvalidConfirmationRequest)?;

        self.identity.confirm_email(&mut user, &query.token)?;
        user.touch();

        let user = self.repository.update(user, vec![]).await?;
        tracing::info!(user_id = %user.id, "Email confirmed");
        Ok(())
    }

    /// Check a username/password pair. Unconfirmed accounts are rejected
    /// only after the password matched.
    pub async fn authenticate(&self, username: &str, password: &str) -> UserResult<User> {
        let user = self
            .repository
            .get_by_username(username)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.identity.verify_credential(&user, password)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(UserError::InvalidCredentials);
        }

        if !user.email_confirmed {
            return Err(UserError::EmailNotConfirmed);
        }

        Ok(user)
    }

    pub fn login_user(&self, user: &User) -> UserResult<LoggedInUserView> {
        let token = self.tokens.issue(user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(to_logged_in_view(user, token))
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> UserResult<Option<UserView>> {
        Ok(self.repository.get_by_id(id).await?.map(UserView::from))
    }

    pub async fn get_user_by_username(&self, username: &str) -> UserResult<Option<UserView>> {
        Ok(self
            .repository
            .get_by_username(username)
            .await?
            .map(UserView::from))
    }

    /// List users with filters
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<ListUsersResponse> {
        let total = self.repository.count(filter.clone()).await?;
        let (limit, offset) = (filter.limit, filter.offset);
        let users = self.repository.list(filter).await?;

        Ok(ListUsersResponse {
            data: users.into_iter().map(UserView::from).collect(),
            total,
            limit,
            offset,
        })
    }

    pub async fn get_user_role(&self, id: Uuid) -> UserResult<Option<Role>> {
        Ok(self.repository.get_by_id(id).await?.map(|user| user.role))
    }

    /// True when either the username or the email is taken.
    pub async fn user_exists(&self, username: &str, email: &str) -> UserResult<bool> {
        Ok(self.repository.username_exists(username).await?
            || self.repository.email_exists(email).await?)
    }

    pub fn get_roles(&self) -> Vec<RoleView> {
        Role::all().into_iter().map(RoleView::from).collect()
    }

    /// Accepts either the identifier or the display name.
    pub fn get_role_by_id(&self, id: &str) -> Option<RoleView> {
        id.trim().parse::<Role>().ok().map(RoleView::from)
    }

    /// Whether `actor_id` may alter `target_id`.
    ///
    /// Self always may. A target that does not exist is `NotFound`; a caller
    /// that does not exist may not.
    pub async fn allowed_to_alter_user(&self, actor_id: Uuid, target_id: Uuid) -> UserResult<bool> {
        if actor_id == target_id {
            return Ok(true);
        }

        let target = self
            .repository
            .get_by_id(target_id)
            .await?
            .ok_or(UserError::NotFound(target_id))?;

        Ok(match self.repository.get_by_id(actor_id).await? {
            Some(caller) => allowed_to_alter_user(&caller, &target),
            None => false,
        })
    }

    /// Apply a sparse edit. Blank or unchanged fields are left alone.
    pub async fn edit_user(&self, id: Uuid, input: EditUser, actor: &Actor) -> UserResult<UserView> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let mut user = self.load(id).await?;
        let caller = self.authorize(actor, &user).await?;
        let mut events = Vec::new();

        if let Some(full_name) = changed_value(&user.full_name, input.full_name.as_deref()) {
            user.full_name = full_name;
        }

        if let Some(email) = changed_value(&user.email, input.email.as_deref()) {
            if normalize(&email) != user.normalized_email
                && self.repository.email_exists(&email).await?
            {
                return Err(UserError::DuplicateEmail(email));
            }
            user.set_email(email);
        }

        if let Some(phone_number) = changed_value(&user.phone_number, input.phone_number.as_deref()) {
            user.phone_number = phone_number;
        }

        match (input.old_password.as_deref(), input.new_password.as_deref()) {
            (old, new) if is_blank(old) && is_blank(new) => {}
            (Some(old), Some(new)) if !is_blank(Some(old)) && !is_blank(Some(new)) => {
                self.identity.change_password(&mut user, old, new)?;
            }
            _ => {
                return Err(UserError::Validation(
                    "old_password and new_password must be supplied together".to_string(),
                ));
            }
        }

        if input.team_id.is_some() && input.team_id != user.team_id {
            user.team_id = input.team_id;
        }

        if !is_blank(input.role_name.as_deref()) {
            let requested = input.role_name.as_deref().unwrap_or_default().trim();
            let role: Role = requested
                .parse()
                .map_err(|_| UserError::Validation(format!("Unknown role '{}'", requested)))?;

            if role != user.role {
                self.apply_grant(&caller, &mut user, role, actor, &mut events)?;
            }
        }

        user.touch();
        let updated = self.repository.update(user, events).await?;
        Ok(updated.into())
    }

    /// Replace the user's role with `role`.
    pub async fn add_user_role(&self, id: Uuid, role: Role, actor: &Actor) -> UserResult<UserView> {
        self.grant_role(id, Some(role), actor).await
    }

    /// Grant the role the user asked for at registration.
    pub async fn approve_user_role(&self, id: Uuid, actor: &Actor) -> UserResult<UserView> {
        self.grant_role(id, None, actor).await
    }

    pub async fn delete_user(&self, id: Uuid, actor: &Actor) -> UserResult<()> {
        let user = self.load(id).await?;
        self.authorize(actor, &user).await?;

        if !self.repository.delete(id).await? {
            return Err(UserError::NotFound(id));
        }

        tracing::info!(user_id = %id, actor_id = %actor.user_id, "User deleted");
        Ok(())
    }

    async fn grant_role(&self, id: Uuid, role: Option<Role>, actor: &Actor) -> UserResult<UserView> {
        let mut user = self.load(id).await?;
        let caller = self.authorize(actor, &user).await?;

        let role = role
            .or(user.requested_role)
            .ok_or_else(|| UserError::Validation(format!("User {} has no pending role request", id)))?;

        let mut events = Vec::new();
        self.apply_grant(&caller, &mut user, role, actor, &mut events)?;

        user.touch();
        let updated = self.repository.update(user, events).await?;
        Ok(updated.into())
    }

    /// The single place a role changes hands. Becoming a Parent also queues
    /// the carpool registration for the user's team.
    fn apply_grant(
        &self,
        caller: &User,
        user: &mut User,
        role: Role,
        actor: &Actor,
        events: &mut Vec<OutboxEvent>,
    ) -> UserResult<()> {
        if !can_grant(caller.role, role) {
            return Err(UserError::Forbidden(format!(
                "{} may not grant the {} role",
                caller.role.display_name(),
                role.display_name()
            )));
        }

        if role == Role::Parent {
            let team_id = user.team_id.ok_or_else(|| {
                UserError::Validation("A Parent must belong to a team".to_string())
            })?;
            events.push(OutboxEvent::RegisterCarpoolRecipient {
                user_id: user.id,
                team_id,
                bearer_token: actor.bearer_token.clone(),
            });
        }

        tracing::info!(
            user_id = %user.id,
            granted_by = %caller.id,
            from = %user.role,
            to = %role,
            "Role granted"
        );

        user.role = role;
        user.requested_role = None;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Resolve the caller and check they may alter `target`.
    async fn authorize(&self, actor: &Actor, target: &User) -> UserResult<User> {
        let caller = if actor.user_id == target.id {
            target.clone()
        } else {
            self.repository
                .get_by_id(actor.user_id)
                .await?
                .ok_or_else(|| UserError::Forbidden("Caller no longer exists".to_string()))?
        };

        if !allowed_to_alter_user(&caller, target) {
            return Err(UserError::Forbidden(format!(
                "{} may not alter user {}",
                caller.role.display_name(),
                target.id
            )));
        }

        Ok(caller)
    }
}

/// `base` with `token` and `email` appended as query parameters.
fn confirmation_link(base: &str, email: &str, token: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{}{}token={}&email={}",
        base,
        separator,
        urlencoding::encode(token),
        urlencoding::encode(email)
    )
}
