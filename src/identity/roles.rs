//! Role set arithmetic, independent of transport.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PREMIUM: &str = "premium";

/// True when the principal's role set intersects the required set.
/// No hierarchy, no inheritance between roles.
pub fn has_any(principal_roles: &[String], required: &[&str]) -> bool {
    required
        .iter()
        .any(|role| principal_roles.iter().any(|r| r == role))
}

/// Add roles to a set, keeping existing order and dropping duplicates.
pub fn add_roles(current: &[String], to_add: &[String]) -> Vec<String> {
    let mut updated = current.to_vec();
    for role in to_add {
        if !updated.contains(role) {
            updated.push(role.clone());
        }
    }
    updated
}

/// Remove roles from a set.
pub fn remove_roles(current: &[String], to_remove: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|role| !to_remove.contains(role))
        .cloned()
        .collect()
}
