use serde::{Deserialize, Serialize};

/// Role of an authenticated account.
///
/// The categories are mutually exclusive. Unknown role strings are kept
/// verbatim so a newer API role never fails deserialization of the user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Attorney,
    Paralegal,
    Client,
    Superadmin,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "attorney" => Role::Attorney,
            "paralegal" => Role::Paralegal,
            "client" => Role::Client,
            "superadmin" => Role::Superadmin,
            _ => Role::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Attorney => "attorney",
            Role::Paralegal => "paralegal",
            Role::Client => "client",
            Role::Superadmin => "superadmin",
            Role::Other(raw) => raw,
        }
    }

    /// Roles that belong to a firm and therefore carry a `companyId`.
    pub fn is_company_scoped(&self) -> bool {
        matches!(self, Role::Attorney | Role::Paralegal | Role::Client)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            is_attorney: *self == Role::Attorney,
            is_paralegal: *self == Role::Paralegal,
            is_client: *self == Role::Client,
            is_superadmin: *self == Role::Superadmin,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean flags derived purely from the role.
///
/// Exactly one flag is set for a known role, none for `Role::Other` or when
/// nobody is logged in (`Capabilities::default()`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub is_attorney: bool,
    pub is_paralegal: bool,
    pub is_client: bool,
    pub is_superadmin: bool,
}

impl Capabilities {
    /// Attorney screens: the specific role or superadmin.
    pub fn can_act_as_attorney(&self) -> bool {
        self.is_attorney || self.is_superadmin
    }

    /// Firm staff (attorney or paralegal), or superadmin.
    pub fn is_staff(&self) -> bool {
        self.is_attorney || self.is_paralegal || self.is_superadmin
    }
}
