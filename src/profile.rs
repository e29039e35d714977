use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::ApiClient;
use crate::models::User;
use crate::store::{Store, keys};

/// Payload for `PUT /users/profile`. Fields the caller leaves unset are
/// omitted from the body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub industry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_industry: Option<String>,
    pub experience: u32,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_expectation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_provider: Option<String>,
}

pub fn fetch_profile(api: &ApiClient) -> Result<User> {
    api.get("/users/profile").context("Failed to load profile")
}

/// Update the profile and refresh the stored `userData` blob.
pub fn update_profile(api: &ApiClient, store: &Store, update: &ProfileUpdate) -> Result<User> {
    let user: User = api
        .put("/users/profile", update)
        .context("Failed to save profile. Please try again.")?;
    store.set(keys::USER_DATA, &user)?;
    Ok(user)
}

/// Add a skill unless an identical entry (case-sensitive) already exists.
/// Returns whether the list changed. Shared by the profile editor and the
/// resume builder.
pub fn add_skill(skills: &mut Vec<String>, skill: &str) -> bool {
    let skill = skill.trim();
    if skill.is_empty() || skills.iter().any(|s| s == skill) {
        return false;
    }
    skills.push(skill.to_string());
    true
}

/// Remove entries exactly matching `skill`. Returns whether anything was
/// removed.
pub fn remove_skill(skills: &mut Vec<String>, skill: &str) -> bool {
    let before = skills.len();
    skills.retain(|s| s != skill);
    skills.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skill_rejects_duplicates() {
        let mut skills = vec!["Rust".to_string()];
        assert!(!add_skill(&mut skills, "Rust"));
        assert_eq!(skills, vec!["Rust"]);

        // case-sensitive: "rust" is a different entry
        assert!(add_skill(&mut skills, "rust"));
        assert_eq!(skills, vec!["Rust", "rust"]);
    }

    #[test]
    fn test_add_skill_trims_and_rejects_empty() {
        let mut skills = Vec::new();
        assert!(add_skill(&mut skills, "  SQL  "));
        assert_eq!(skills, vec!["SQL"]);
        assert!(!add_skill(&mut skills, "   "));
        assert_eq!(skills.len(), 1);
    }

    #[test]
    fn test_remove_skill_exact_match() {
        let mut skills = vec!["Rust".to_string(), "Go".to_string()];
        assert!(remove_skill(&mut skills, "Go"));
        assert_eq!(skills, vec!["Rust"]);
        assert!(!remove_skill(&mut skills, "go"));
        assert_eq!(skills, vec!["Rust"]);
    }

    #[test]
    fn test_profile_update_omits_unset_fields() {
        let update = ProfileUpdate {
            industry: "Technology".to_string(),
            experience: 3,
            skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body["industry"], "Technology");
        assert!(body.get("subIndustry").is_none());
        assert!(body.get("salaryExpectation").is_none());
    }
}
