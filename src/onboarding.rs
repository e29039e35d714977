use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::insights;
use crate::models::User;
use crate::profile::{self, ProfileUpdate};
use crate::store::Store;

/// One selectable industry with its specializations.
pub struct Industry {
    pub id: &'static str,
    pub name: &'static str,
    pub sub_industries: &'static [&'static str],
}

/// The catalog shipped with the client.
pub const INDUSTRIES: &[Industry] = &[
    Industry {
        id: "tech",
        name: "Technology",
        sub_industries: &[
            "Software Development",
            "Web Development",
            "Mobile App Development",
            "Game Development",
            "Embedded Systems Development",
            "API Development",
            "DevOps Engineering",
            "Backend Development",
            "Frontend Development",
            "Full Stack Development",
            "Data Science",
            "Data Engineering",
            "Big Data",
            "Business Intelligence (BI)",
            "Artificial Intelligence (AI)",
            "Machine Learning (ML)",
            "Deep Learning",
            "Natural Language Processing (NLP)",
            "Computer Vision",
            "Data Analytics",
            "Cybersecurity",
            "Cloud Computing",
            "UI/UX Design",
            "Product Design",
            "Product Management",
            "Technical Program Management",
            "Project Management (IT)",
            "Technology Consulting",
            "Tech Strategy & Innovation",
            "Digital Transformation",
            "IT Support",
            "Managed Services",
            "Technical Support",
            "IT Service Management (ITSM)",
            "Help Desk Support",
            "Database Administration",
            "Data Warehousing",
            "Cloud Storage",
            "NoSQL & SQL Technologies",
            "Online Tech Education",
            "Bootcamps & Certifications",
            "Open Source Development",
            "Community & Developer Advocacy",
        ],
    },
    Industry {
        id: "finance",
        name: "Finance",
        sub_industries: &["Banking", "Investment", "Insurance", "Fintech"],
    },
    Industry {
        id: "healthcare",
        name: "Healthcare",
        sub_industries: &[
            "Medical Devices",
            "Pharmaceuticals",
            "Healthcare IT",
            "Biotechnology",
        ],
    },
];

pub fn industry_by_name(name: &str) -> Option<&'static Industry> {
    INDUSTRIES.iter().find(|i| i.name == name)
}

pub const STEP_TITLES: [&str; 4] = [
    "Select Your Industry",
    "Your Experience",
    "Your Skills",
    "Your Country",
];

/// Outcome of a forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to the next step
    Advanced,
    /// The final step passed validation; the form is ready to submit
    Complete,
    /// A required field is missing; the step is unchanged and `error` is set
    Rejected,
}

/// The four-step onboarding wizard. Navigation is linear: forward moves are
/// gated by per-step required-field checks, back moves are not. Nothing is
/// persisted until completion.
#[derive(Debug, Default)]
pub struct OnboardingForm {
    step: usize,
    pub industry: String,
    pub sub_industry: String,
    pub experience: String,
    pub salary_expectation: String,
    pub skills: String,
    pub country: String,
    error: Option<String>,
}

impl OnboardingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn next(&mut self) -> StepOutcome {
        let missing = match self.step {
            0 if self.industry.is_empty() => Some("Please select an industry"),
            1 if self.experience.is_empty() => Some("Please enter your experience level"),
            2 if self.skills.is_empty() => Some("Please enter at least one skill"),
            3 if self.country.is_empty() => Some("Please enter your country"),
            _ => None,
        };

        if let Some(message) = missing {
            self.error = Some(message.to_string());
            return StepOutcome::Rejected;
        }

        self.error = None;
        if self.step < 3 {
            self.step += 1;
            StepOutcome::Advanced
        } else {
            StepOutcome::Complete
        }
    }

    pub fn back(&mut self) {
        if self.step > 0 {
            self.step -= 1;
        }
    }

    /// Split the comma-separated skills input into trimmed, non-empty entries.
    pub fn skill_list(&self) -> Vec<String> {
        self.skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            industry: self.industry.clone(),
            sub_industry: (!self.sub_industry.is_empty()).then(|| self.sub_industry.clone()),
            experience: self.experience.trim().parse().unwrap_or(0),
            skills: self.skill_list(),
            country: Some(self.country.clone()),
            salary_expectation: (!self.salary_expectation.is_empty())
                .then(|| self.salary_expectation.clone()),
            auth_provider: Some("local".to_string()),
        }
    }
}

/// Completion: update the profile, then generate insights for it. Two
/// sequential calls; a failure in either leaves the user to resubmit.
pub fn complete(api: &ApiClient, store: &Store, form: &OnboardingForm) -> Result<User> {
    let user = profile::update_profile(api, store, &form.profile_update())?;

    insights::generate(api, &insights::generate_request_for(&user))
        .context("Profile saved, but generating insights failed. Please try again.")?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_zero_requires_industry() {
        let mut form = OnboardingForm::new();

        assert_eq!(form.next(), StepOutcome::Rejected);
        assert_eq!(form.step(), 0);
        assert_eq!(form.error(), Some("Please select an industry"));

        form.industry = "Technology".to_string();
        assert_eq!(form.next(), StepOutcome::Advanced);
        assert_eq!(form.step(), 1);
        assert!(form.error().is_none());
    }

    #[test]
    fn test_full_walk_through_all_steps() {
        let mut form = OnboardingForm::new();
        form.industry = "Technology".to_string();
        form.sub_industry = "Web Development".to_string();
        assert_eq!(form.next(), StepOutcome::Advanced);

        assert_eq!(form.next(), StepOutcome::Rejected);
        assert_eq!(form.error(), Some("Please enter your experience level"));
        form.experience = "4".to_string();
        form.salary_expectation = "75000".to_string();
        assert_eq!(form.next(), StepOutcome::Advanced);

        assert_eq!(form.next(), StepOutcome::Rejected);
        assert_eq!(form.error(), Some("Please enter at least one skill"));
        form.skills = "Rust, SQL".to_string();
        assert_eq!(form.next(), StepOutcome::Advanced);

        assert_eq!(form.next(), StepOutcome::Rejected);
        assert_eq!(form.error(), Some("Please enter your country"));
        form.country = "Canada".to_string();
        assert_eq!(form.next(), StepOutcome::Complete);
        assert_eq!(form.step(), 3);
    }

    #[test]
    fn test_back_is_unguarded() {
        let mut form = OnboardingForm::new();
        form.back();
        assert_eq!(form.step(), 0);

        form.industry = "Finance".to_string();
        form.next();
        form.back();
        assert_eq!(form.step(), 0);
    }

    #[test]
    fn test_skill_list_splits_and_trims() {
        let mut form = OnboardingForm::new();
        form.skills = " Rust , SQL ,, Postgres ".to_string();
        assert_eq!(form.skill_list(), vec!["Rust", "SQL", "Postgres"]);
    }

    #[test]
    fn test_profile_update_payload() {
        let mut form = OnboardingForm::new();
        form.industry = "Technology".to_string();
        form.sub_industry = "Data Science".to_string();
        form.experience = "7".to_string();
        form.skills = "Python, SQL".to_string();
        form.country = "India".to_string();

        let update = form.profile_update();
        assert_eq!(update.industry, "Technology");
        assert_eq!(update.sub_industry.as_deref(), Some("Data Science"));
        assert_eq!(update.experience, 7);
        assert_eq!(update.skills, vec!["Python", "SQL"]);
        assert_eq!(update.country.as_deref(), Some("India"));
        assert!(update.salary_expectation.is_none());
    }

    #[test]
    fn test_industry_catalog_lookup() {
        let tech = industry_by_name("Technology").unwrap();
        assert_eq!(tech.id, "tech");
        assert!(tech.sub_industries.contains(&"Web Development"));
        assert!(industry_by_name("Agriculture").is_none());
    }
}
