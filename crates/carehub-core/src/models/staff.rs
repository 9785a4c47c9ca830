//! Staff directory models.

use serde::{Deserialize, Serialize};

/// Staff role, taken from the collection a record was fetched from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Doctor,
    Admin,
}

impl StaffRole {
    /// Map a collection name to a role.
    pub fn from_collection(collection: &str) -> Option<Self> {
        match collection.to_lowercase().as_str() {
            "doctors" | "doctor" => Some(StaffRole::Doctor),
            "admins" | "admin" => Some(StaffRole::Admin),
            _ => None,
        }
    }
}

/// A member of hospital staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    /// Store document id
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    pub phone: Option<String>,
    /// Specialization (doctors) or department (admins)
    pub specialization: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_collection() {
        assert_eq!(StaffRole::from_collection("doctors"), Some(StaffRole::Doctor));
        assert_eq!(StaffRole::from_collection("Admins"), Some(StaffRole::Admin));
        assert_eq!(StaffRole::from_collection("patients"), None);
    }
}
