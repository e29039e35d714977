use serde::{Deserialize, Serialize};

/// User profile as exchanged with the backend. Also the shape of the
/// `userData` blob in the local store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub name: String,
    pub email: String,
    pub industry: Option<String>,
    pub sub_industry: Option<String>,
    pub experience: Option<u32>,
    pub skills: Vec<String>,
    pub country: Option<String>,
    pub salary_expectation: Option<String>,
    pub is_profile_complete: bool,
    pub competency_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Written to the store after every successful auth or insights load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousUser {
    pub email: String,
    pub last_login: String,
}

// --- Quiz ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitResponse {
    pub improvement_tip: Option<String>,
    pub recommendations: Option<Recommendations>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendations {
    pub job_recommendations: Vec<JobRecommendation>,
    pub learning_resources: Vec<LearningResource>,
    pub skill_development_areas: Vec<String>,
    pub career_insights: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRecommendation {
    pub title: String,
    pub match_percentage: Option<u32>,
    pub required_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub potential_career_path: Option<String>,
    pub company_types: Vec<String>,
    pub growth_potential: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LearningResource {
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub difficulty: Option<String>,
    pub focus_areas: Vec<String>,
    pub estimated_completion_time: Option<String>,
    pub platform: Option<String>,
    pub recommendation_reason: Option<String>,
}

/// One entry of the assessment history returned by `GET /quiz/assessments`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assessment {
    pub category: String,
    pub sub_industry: Option<String>,
    pub quiz_score: Option<f64>,
    pub created_at: Option<String>,
}

// --- Industry insights ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndustryInsight {
    pub industry_overview: Option<String>,
    pub market_demand: Vec<SkillDemand>,
    pub city_salary_data: Vec<CitySalary>,
    pub expected_salary_range: Option<SalaryRange>,
    pub skill_based_boosts: Vec<SkillBoost>,
    pub top_companies: Vec<Company>,
    pub recommended_courses: Vec<Course>,
    pub career_path_insights: Vec<CareerPath>,
    pub emerging_trends: Vec<Trend>,
    pub next_actions: Vec<NextAction>,
    pub last_updated: Option<String>,
    pub next_update: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillDemand {
    pub skill: String,
    pub demand_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CitySalary {
    pub city: String,
    pub avg_salary: i64,
    pub salary_trend: Option<String>,
    pub demand_level: Option<String>,
    pub roles_salaries: Vec<RoleSalary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleSalary {
    pub role: String,
    pub min_salary: i64,
    pub median_salary: i64,
    pub max_salary: i64,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillBoost {
    pub skill: String,
    pub salary_increase: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub name: String,
    pub open_positions: Option<i64>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub name: String,
    pub platform: Option<String>,
    pub skills_covered: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareerPath {
    pub title: String,
    pub description: String,
    pub growth_potential: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trend {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextAction {
    pub title: String,
    pub description: String,
}

// --- Country / role comparison ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comparison {
    pub current_country: CountryInsight,
    pub target_country: CountryInsight,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryInsight {
    pub name: String,
    pub top_cities: Vec<CitySalary>,
}
