//! Permission catalog and built-in roles

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Namespaced capability identifiers, `resource:action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    #[serde(rename = "book:read")]
    BookRead,
    #[serde(rename = "book:create")]
    BookCreate,
    #[serde(rename = "book:update")]
    BookUpdate,
    #[serde(rename = "book:delete")]
    BookDelete,
    #[serde(rename = "borrow:create")]
    BorrowCreate,
    #[serde(rename = "borrow:read")]
    BorrowRead,
    #[serde(rename = "borrow:return")]
    BorrowReturn,
    #[serde(rename = "member:read")]
    MemberRead,
    #[serde(rename = "member:create")]
    MemberCreate,
    #[serde(rename = "member:update")]
    MemberUpdate,
    #[serde(rename = "member:delete")]
    MemberDelete,
    #[serde(rename = "role:manage")]
    RoleManage,
}

impl Permission {
    /// Every permission known to the system
    pub const ALL: [Permission; 12] = [
        Permission::BookRead,
        Permission::BookCreate,
        Permission::BookUpdate,
        Permission::BookDelete,
        Permission::BorrowCreate,
        Permission::BorrowRead,
        Permission::BorrowReturn,
        Permission::MemberRead,
        Permission::MemberCreate,
        Permission::MemberUpdate,
        Permission::MemberDelete,
        Permission::RoleManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::BookRead => "book:read",
            Permission::BookCreate => "book:create",
            Permission::BookUpdate => "book:update",
            Permission::BookDelete => "book:delete",
            Permission::BorrowCreate => "borrow:create",
            Permission::BorrowRead => "borrow:read",
            Permission::BorrowReturn => "borrow:return",
            Permission::MemberRead => "member:read",
            Permission::MemberCreate => "member:create",
            Permission::MemberUpdate => "member:update",
            Permission::MemberDelete => "member:delete",
            Permission::RoleManage => "role:manage",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Built-in role names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    Librarian,
    Member,
}

impl RoleName {
    pub const ALL: [RoleName; 3] = [RoleName::Admin, RoleName::Librarian, RoleName::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::Librarian => "librarian",
            RoleName::Member => "member",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(RoleName::Admin),
            "librarian" => Ok(RoleName::Librarian),
            "member" => Ok(RoleName::Member),
            _ => Err(format!("Unknown role name: {}", s)),
        }
    }
}

/// Permissions granted to each built-in role.
/// Admin holds everything, sorted by identifier; librarian manages the
/// catalog, borrows and members but not roles or member deletion; member
/// reads the catalog and handles their own borrows.
pub static ROLE_PERMISSIONS: Lazy<Vec<(RoleName, Vec<Permission>)>> = Lazy::new(|| {
    let mut all = Permission::ALL.to_vec();
    all.sort_by_key(|p| p.as_str());

    vec![
        (RoleName::Admin, all),
        (
            RoleName::Librarian,
            vec![
                Permission::BookRead,
                Permission::BookCreate,
                Permission::BookUpdate,
                Permission::BookDelete,
                Permission::BorrowCreate,
                Permission::BorrowRead,
                Permission::BorrowReturn,
                Permission::MemberRead,
                Permission::MemberCreate,
                Permission::MemberUpdate,
            ],
        ),
        (
            RoleName::Member,
            vec![
                Permission::BookRead,
                Permission::BorrowCreate,
                Permission::BorrowRead,
                Permission::BorrowReturn,
            ],
        ),
    ]
});

/// Permissions for a single built-in role
pub fn role_permissions(role: RoleName) -> &'static [Permission] {
    ROLE_PERMISSIONS
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, perms)| perms.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        let perms = role_permissions(RoleName::Admin);
        assert_eq!(perms.len(), Permission::ALL.len());
        for p in Permission::ALL {
            assert!(perms.contains(&p), "admin is missing {}", p);
        }
    }

    #[test]
    fn librarian_cannot_manage_roles_or_delete_members() {
        let perms = role_permissions(RoleName::Librarian);
        assert!(!perms.contains(&Permission::RoleManage));
        assert!(!perms.contains(&Permission::MemberDelete));
        assert!(perms.contains(&Permission::BookDelete));
        assert!(perms.contains(&Permission::MemberUpdate));
    }

    #[test]
    fn member_is_limited_to_reading_and_own_borrows() {
        let perms = role_permissions(RoleName::Member);
        assert_eq!(
            perms,
            &[
                Permission::BookRead,
                Permission::BorrowCreate,
                Permission::BorrowRead,
                Permission::BorrowReturn,
            ]
        );
    }

    #[test]
    fn role_names_round_trip() {
        for role in RoleName::ALL {
            assert_eq!(role.as_str().parse::<RoleName>().unwrap(), role);
        }
        assert!("superuser".parse::<RoleName>().is_err());
    }
}
