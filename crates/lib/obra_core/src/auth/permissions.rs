//! Static role → (resource, action) permission matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed set of user roles. Serialized with the stored names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "dueño", alias = "dueno")]
    Owner,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "vendedor")]
    Salesperson,
    #[serde(rename = "cliente")]
    Client,
    #[serde(rename = "demo")]
    Demo,
}

impl Role {
    /// Parse a stored role string. Case-insensitive; both owner spellings
    /// (`dueño`, `dueno`) are accepted.
    pub fn parse(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "dueño" | "dueno" | "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "vendedor" | "salesperson" => Some(Role::Salesperson),
            "cliente" | "client" => Some(Role::Client),
            "demo" => Some(Role::Demo),
            _ => None,
        }
    }

    /// Name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "dueño",
            Role::Admin => "admin",
            Role::Salesperson => "vendedor",
            Role::Client => "cliente",
            Role::Demo => "demo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role '{s}'"))
    }
}

/// Protected resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Dashboard,
    Quotes,
    SalesNotes,
    Clients,
    Obras,
    Targets,
    Stock,
    Reports,
    Admin,
    Users,
    Settings,
}

impl Resource {
    pub const ALL: [Resource; 11] = [
        Resource::Dashboard,
        Resource::Quotes,
        Resource::SalesNotes,
        Resource::Clients,
        Resource::Obras,
        Resource::Targets,
        Resource::Stock,
        Resource::Reports,
        Resource::Admin,
        Resource::Users,
        Resource::Settings,
    ];
}

/// Operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    Manage,
    Export,
    Import,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Create,
        Action::Read,
        Action::Update,
        Action::Delete,
        Action::Manage,
        Action::Export,
        Action::Import,
    ];
}

/// A role's actions on one resource.
pub type Grant = (Resource, &'static [Action]);

use Action::{Create, Delete, Export, Manage, Read, Update};

const ALL_ACTIONS: &[Action] = &Action::ALL;
const READ_ONLY: &[Action] = &[Read];

const OWNER: &[Grant] = &[
    (Resource::Dashboard, ALL_ACTIONS),
    (Resource::Quotes, ALL_ACTIONS),
    (Resource::SalesNotes, ALL_ACTIONS),
    (Resource::Clients, ALL_ACTIONS),
    (Resource::Obras, ALL_ACTIONS),
    (Resource::Targets, ALL_ACTIONS),
    (Resource::Stock, ALL_ACTIONS),
    (Resource::Reports, ALL_ACTIONS),
    (Resource::Admin, ALL_ACTIONS),
    (Resource::Users, ALL_ACTIONS),
    (Resource::Settings, ALL_ACTIONS),
];

// Admins manage everything except creating users, which stays with the owner.
const ADMIN: &[Grant] = &[
    (Resource::Dashboard, ALL_ACTIONS),
    (Resource::Quotes, ALL_ACTIONS),
    (Resource::SalesNotes, ALL_ACTIONS),
    (Resource::Clients, ALL_ACTIONS),
    (Resource::Obras, ALL_ACTIONS),
    (Resource::Targets, ALL_ACTIONS),
    (Resource::Stock, ALL_ACTIONS),
    (Resource::Reports, ALL_ACTIONS),
    (Resource::Admin, &[Read, Manage]),
    (Resource::Users, &[Read, Update, Delete, Manage]),
    (Resource::Settings, &[Read, Update]),
];

const SALESPERSON: &[Grant] = &[
    (Resource::Dashboard, READ_ONLY),
    (Resource::Quotes, &[Create, Read, Update, Export]),
    (Resource::SalesNotes, &[Create, Read, Update, Export]),
    (Resource::Clients, &[Create, Read, Update]),
    (Resource::Obras, &[Create, Read, Update]),
    (Resource::Targets, READ_ONLY),
    (Resource::Stock, READ_ONLY),
    (Resource::Reports, &[Read, Export]),
];

const CLIENT: &[Grant] = &[
    (Resource::Dashboard, READ_ONLY),
    (Resource::Quotes, READ_ONLY),
    (Resource::SalesNotes, READ_ONLY),
    (Resource::Obras, READ_ONLY),
];

const DEMO: &[Grant] = &[
    (Resource::Dashboard, READ_ONLY),
    (Resource::Quotes, READ_ONLY),
    (Resource::SalesNotes, READ_ONLY),
    (Resource::Clients, READ_ONLY),
    (Resource::Obras, READ_ONLY),
    (Resource::Targets, READ_ONLY),
    (Resource::Stock, READ_ONLY),
    (Resource::Reports, READ_ONLY),
];

/// The matrix rows for `role`.
pub fn grants(role: Role) -> &'static [Grant] {
    match role {
        Role::Owner => OWNER,
        Role::Admin => ADMIN,
        Role::Salesperson => SALESPERSON,
        Role::Client => CLIENT,
        Role::Demo => DEMO,
    }
}

/// Flattened `(resource, action)` pairs for `role`, in table order.
/// Unknown roles get nothing.
pub fn permissions_for(role: &str) -> Vec<(Resource, Action)> {
    let Some(role) = Role::parse(role) else {
        return Vec::new();
    };
    grants(role)
        .iter()
        .flat_map(|(resource, actions)| actions.iter().map(move |a| (*resource, *a)))
        .collect()
}

pub fn has_permission(role: &str, resource: Resource, action: Action) -> bool {
    let Some(role) = Role::parse(role) else {
        return false;
    };
    grants(role)
        .iter()
        .any(|(r, actions)| *r == resource && actions.contains(&action))
}

pub fn has_any(role: &str, resource: Resource, actions: &[Action]) -> bool {
    actions.iter().any(|a| has_permission(role, resource, *a))
}

pub fn has_all(role: &str, resource: Resource, actions: &[Action]) -> bool {
    actions.iter().all(|a| has_permission(role, resource, *a))
}

pub fn can_read(role: &str, resource: Resource) -> bool {
    has_permission(role, resource, Read)
}

/// Any of create, update or delete.
pub fn can_write(role: &str, resource: Resource) -> bool {
    has_any(role, resource, &[Create, Update, Delete])
}

pub fn can_manage(role: &str, resource: Resource) -> bool {
    has_permission(role, resource, Manage)
}

/// Outcome of gating a UI subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuardDecision {
    /// No authenticated user: send to the login entry point.
    RedirectToLogin,
    /// Authenticated but not allowed: render the fallback panel.
    Denied,
    Allowed,
}

/// Decide what a rendering layer shows for `role` on `(resource, action)`.
///
/// This is a presentation gate; handlers enforce the same matrix themselves.
pub fn guard(role: Option<&str>, resource: Resource, action: Action) -> GuardDecision {
    match role {
        None => GuardDecision::RedirectToLogin,
        Some(role) if has_permission(role, resource, action) => GuardDecision::Allowed,
        Some(_) => GuardDecision::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salesperson_reads_but_cannot_delete_clients() {
        assert!(has_permission("vendedor", Resource::Clients, Read));
        assert!(!has_permission("vendedor", Resource::Clients, Delete));
    }

    #[test]
    fn admin_cannot_create_users_but_can_delete_them() {
        assert!(!has_permission("admin", Resource::Users, Create));
        assert!(has_permission("admin", Resource::Users, Delete));
    }

    #[test]
    fn owner_spellings_and_case_are_aliases() {
        for role in ["dueño", "dueno", "DUEÑO", "Dueno"] {
            assert_eq!(Role::parse(role), Some(Role::Owner), "{role}");
            assert!(has_permission(role, Resource::Users, Create));
        }
        assert!(has_permission("VENDEDOR", Resource::Quotes, Create));
    }

    #[test]
    fn unknown_role_has_nothing() {
        assert!(!has_permission("intruso", Resource::Dashboard, Read));
        assert!(permissions_for("intruso").is_empty());
    }

    #[test]
    fn derived_helpers() {
        assert!(can_read("demo", Resource::Stock));
        assert!(!can_write("demo", Resource::Stock));
        assert!(can_write("vendedor", Resource::Quotes));
        assert!(!can_manage("vendedor", Resource::Quotes));
        assert!(can_manage("admin", Resource::Users));
        assert!(has_all("vendedor", Resource::Quotes, &[Create, Read]));
        assert!(!has_all("vendedor", Resource::Quotes, &[Create, Delete]));
        assert!(has_any("cliente", Resource::Quotes, &[Delete, Read]));
    }

    #[test]
    fn owner_has_every_pair() {
        let pairs = permissions_for("dueño");
        assert_eq!(pairs.len(), Resource::ALL.len() * Action::ALL.len());
    }

    #[test]
    fn guard_decisions() {
        assert_eq!(
            guard(None, Resource::Dashboard, Read),
            GuardDecision::RedirectToLogin
        );
        assert_eq!(
            guard(Some("cliente"), Resource::Users, Read),
            GuardDecision::Denied
        );
        assert_eq!(
            guard(Some("cliente"), Resource::Quotes, Read),
            GuardDecision::Allowed
        );
    }

    #[test]
    fn wire_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Resource::SalesNotes).unwrap(),
            "\"sales-notes\""
        );
        assert_eq!(serde_json::to_string(&Export).unwrap(), "\"export\"");
    }

    #[test]
    fn role_serializes_with_stored_names() {
        for role in [
            Role::Owner,
            Role::Admin,
            Role::Salesperson,
            Role::Client,
            Role::Demo,
        ] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(serde_json::from_str::<Role>(&json).unwrap(), role);
        }
        assert_eq!(
            serde_json::from_str::<Role>("\"dueno\"").unwrap(),
            Role::Owner
        );
    }
}
