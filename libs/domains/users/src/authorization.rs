//! Who may alter whom, and which roles a caller may hand out.

use crate::models::User;
use crate::role::Role;

/// Whether a caller holding `caller` may alter a user holding `target`.
///
/// Managers (HeadCoach and above) may alter strictly lower ranks; nobody
/// else may alter other users.
pub fn can_alter(caller: Role, target: Role) -> bool {
    caller.is_manager() && caller.rank() > target.rank()
}

/// Users may always alter themselves; otherwise [`can_alter`] decides.
pub fn allowed_to_alter_user(caller: &User, target: &User) -> bool {
    caller.id == target.id || can_alter(caller.role, target.role)
}

/// Whether `caller` may grant `granted`. Admins may mint Admins; everyone
/// else only grants roles below their own.
pub fn can_grant(caller: Role, granted: Role) -> bool {
    match caller {
        Role::Admin => true,
        _ => caller.is_manager() && granted.rank() < caller.rank(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    fn user(role: Role) -> User {
        let mut user = User::new(
            format!("{role}").to_lowercase(),
            format!("{role}@league.test").to_lowercase(),
            role.display_name().to_string(),
            "5550102030".to_string(),
            None,
        );
        user.role = role;
        user
    }

    #[test]
    fn test_self_is_always_allowed() {
        for role in Role::all() {
            let me = user(role);
            assert!(allowed_to_alter_user(&me, &me), "{role} should alter self");
        }
    }

    #[test]
    fn test_league_manager_cannot_alter_admin() {
        assert!(!can_alter(LeagueManager, Admin));
        assert!(!allowed_to_alter_user(&user(LeagueManager), &user(Admin)));
    }

    #[test]
    fn test_admin_alters_everyone_but_admins() {
        assert!(!can_alter(Admin, Admin));
        for target in [LeagueManager, HeadCoach, AssistantCoach, Parent, Player, UnconfirmedUser] {
            assert!(can_alter(Admin, target), "Admin -> {target}");
        }
    }

    #[test]
    fn test_league_manager_scope() {
        assert!(!can_alter(LeagueManager, LeagueManager));
        for target in [HeadCoach, AssistantCoach, Parent, Player, UnconfirmedUser] {
            assert!(can_alter(LeagueManager, target), "LeagueManager -> {target}");
        }
    }

    #[test]
    fn test_head_coach_scope() {
        for target in [Admin, LeagueManager, HeadCoach] {
            assert!(!can_alter(HeadCoach, target), "HeadCoach -> {target}");
        }
        for target in [AssistantCoach, Parent, Player, UnconfirmedUser] {
            assert!(can_alter(HeadCoach, target), "HeadCoach -> {target}");
        }
    }

    #[test]
    fn test_non_managers_alter_nobody_else() {
        for caller in [AssistantCoach, Parent, Player, UnconfirmedUser] {
            for target in Role::all() {
                assert!(!can_alter(caller, target), "{caller} -> {target}");
            }
        }
    }

    #[test]
    fn test_two_distinct_users_of_same_role() {
        let a = user(HeadCoach);
        let b = user(HeadCoach);
        assert!(!allowed_to_alter_user(&a, &b));
    }

    #[test]
    fn test_grant_rules() {
        assert!(can_grant(Admin, Admin));
        assert!(can_grant(LeagueManager, HeadCoach));
        assert!(!can_grant(LeagueManager, LeagueManager));
        assert!(!can_grant(LeagueManager, Admin));
        assert!(can_grant(HeadCoach, Parent));
        assert!(!can_grant(HeadCoach, HeadCoach));
        assert!(!can_grant(AssistantCoach, Player));
    }
}
