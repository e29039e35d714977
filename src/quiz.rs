use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiClient, percent_encode};
use crate::models::{Assessment, Question, QuestionResult, Recommendations, SubmitResponse};

/// Quiz sessions run against a fixed 15-minute countdown.
pub const QUIZ_TIME_LIMIT_SECS: u32 = 900;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub skills: Vec<String>,
    pub specializations: Vec<String>,
}

fn category(
    id: &str,
    name: &str,
    description: &str,
    skills: &[&str],
    specializations: &[&str],
) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        specializations: specializations.iter().map(|s| s.to_string()).collect(),
    }
}

/// The assessment catalog shipped with the client.
pub fn builtin_categories() -> Vec<Category> {
    vec![
        category(
            "technical",
            "Technical Skills",
            "Assess your programming, database, and system architecture knowledge",
            &["JavaScript", "React", "Node.js", "MongoDB", "API Design"],
            &[
                "Web Development",
                "Mobile App Development",
                "Cloud Computing",
                "Data Science",
                "Cybersecurity",
                "DevOps",
                "AI/Machine Learning",
            ],
        ),
        category(
            "behavioral",
            "Behavioral Assessment",
            "Evaluate your communication, teamwork, and leadership abilities",
            &["Communication", "Problem-solving", "Teamwork", "Leadership", "Adaptability"],
            &[
                "Team Leadership",
                "Project Management",
                "Communication",
                "Conflict Resolution",
                "Emotional Intelligence",
            ],
        ),
        category(
            "industry",
            "Industry Knowledge",
            "Test your understanding of industry trends and best practices",
            &["Market Analysis", "Competitive Intelligence", "Industry Trends", "Best Practices"],
            &["Technology", "Finance", "Healthcare", "Marketing", "Consulting"],
        ),
    ]
}

/// Catalog from `GET /quiz/available`, falling back to the built-in one.
pub fn fetch_categories(api: &ApiClient) -> Vec<Category> {
    match api.get::<Vec<Category>>("/quiz/available") {
        Ok(categories) if !categories.is_empty() => categories,
        Ok(_) => builtin_categories(),
        Err(e) => {
            debug!(error = %e, "quiz catalog unavailable, using built-in categories");
            builtin_categories()
        }
    }
}

pub fn find_category<'a>(categories: &'a [Category], wanted: &str) -> Option<&'a Category> {
    let wanted = wanted.to_lowercase();
    categories
        .iter()
        .find(|c| c.id.to_lowercase() == wanted || c.name.to_lowercase() == wanted)
}

pub fn fetch_quiz(
    api: &ApiClient,
    category_id: &str,
    specialization: &str,
) -> Result<Vec<Question>> {
    let path = format!(
        "/quiz/{}/{}",
        percent_encode(category_id),
        percent_encode(specialization)
    );
    let questions: Vec<Question> = api
        .get(&path)
        .context("Failed to load quiz. Please try again.")?;
    if questions.is_empty() {
        bail!("The server returned an empty quiz. Please try again.");
    }
    Ok(questions)
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running,
    /// The countdown just hit zero; submit now. Fires at most once.
    Expired,
}

/// One timed quiz attempt: the fetched questions, the answers so far, a
/// cursor, and the countdown. Nothing survives the session.
#[derive(Debug)]
pub struct QuizSession {
    pub category: String,
    pub specialization: String,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    time_left: u32,
    submitted: bool,
}

impl QuizSession {
    pub fn new(category: String, specialization: String, questions: Vec<Question>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            category,
            specialization,
            questions,
            answers,
            current: 0,
            time_left: QUIZ_TIME_LIMIT_SECS,
            submitted: false,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.current]
    }

    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    pub fn select_answer(&mut self, option: usize) {
        if option < self.current_question().options.len() {
            self.answers[self.current] = Some(option);
        }
    }

    pub fn next_question(&mut self) {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        }
    }

    pub fn prev_question(&mut self) {
        if self.current > 0 {
            self.current -= 1;
        }
    }

    pub fn jump_to(&mut self, index: usize) {
        if index < self.questions.len() {
            self.current = index;
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn progress_pct(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.questions.len() as f64 * 100.0
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Submitting (or abandoning) cancels the countdown.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    /// One second elapses. Hitting zero marks the session submitted and
    /// reports `Expired` exactly once; every later tick is a no-op.
    pub fn tick(&mut self) -> Tick {
        if self.submitted || self.time_left == 0 {
            return Tick::Running;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            self.submitted = true;
            Tick::Expired
        } else {
            Tick::Running
        }
    }

    /// Grade locally: unanswered questions count as incorrect.
    pub fn grade(&self) -> Graded {
        let mut correct = 0usize;
        let mut answers = Vec::with_capacity(self.questions.len());
        let mut results = Vec::with_capacity(self.questions.len());

        for (question, answer) in self.questions.iter().zip(&self.answers) {
            let user_answer = answer
                .and_then(|i| question.options.get(i))
                .cloned()
                .unwrap_or_default();
            let is_correct = !user_answer.is_empty() && user_answer == question.correct_answer;
            if is_correct {
                correct += 1;
            }

            results.push(QuestionResult {
                question: question.question.clone(),
                correct_answer: question.correct_answer.clone(),
                user_answer: if user_answer.is_empty() {
                    "Not answered".to_string()
                } else {
                    user_answer.clone()
                },
                is_correct,
                explanation: question.explanation.clone(),
            });
            answers.push(user_answer);
        }

        let score = (correct as f64 / self.questions.len().max(1) as f64 * 100.0).round() as u32;
        Graded {
            score,
            answers,
            results,
        }
    }
}

#[derive(Debug)]
pub struct Graded {
    pub score: u32,
    pub answers: Vec<String>,
    pub results: Vec<QuestionResult>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuizSubmission<'a> {
    questions: &'a [Question],
    answers: &'a [String],
    score: u32,
    category: &'a str,
    sub_industry: &'a str,
    correct_answers: Vec<&'a str>,
    questions_with_results: &'a [QuestionResult],
}

/// The graded outcome plus whatever the server added, shaped for the results
/// view.
#[derive(Debug)]
pub struct QuizResult {
    pub score: u32,
    pub category: String,
    pub specialization: String,
    pub questions: Vec<QuestionResult>,
    pub improvement_tip: String,
    pub recommendations: Recommendations,
}

pub fn submit(api: &ApiClient, session: &QuizSession) -> Result<QuizResult> {
    let graded = session.grade();
    let submission = QuizSubmission {
        questions: session.questions(),
        answers: &graded.answers,
        score: graded.score,
        category: &session.category,
        sub_industry: &session.specialization,
        correct_answers: session
            .questions()
            .iter()
            .map(|q| q.correct_answer.as_str())
            .collect(),
        questions_with_results: &graded.results,
    };

    let response: SubmitResponse = api
        .post("/quiz/submit", &submission)
        .context("Failed to submit quiz. Please try again.")?;

    Ok(QuizResult {
        score: graded.score,
        category: session.category.clone(),
        specialization: session.specialization.clone(),
        questions: graded.results,
        improvement_tip: response
            .improvement_tip
            .unwrap_or_else(|| "No specific improvement tips available".to_string()),
        recommendations: response.recommendations.unwrap_or_default(),
    })
}

pub fn fetch_assessments(api: &ApiClient) -> Result<Vec<Assessment>> {
    api.get("/quiz/assessments")
        .context("Failed to load assessment history")
}

pub fn score_label(score: u32) -> &'static str {
    if score >= 80 {
        "Excellent!"
    } else if score >= 60 {
        "Good job!"
    } else {
        "Keep practicing!"
    }
}

/// `MM:SS` for the countdown display.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

// --- Results view ---

pub fn render_result(result: &QuizResult) {
    println!(
        "Competency Test Results - {} / {}",
        result.category, result.specialization
    );
    println!("\nYour score: {}%  {}", result.score, score_label(result.score));

    println!("\nQuestion Details");
    println!("{}", "-".repeat(78));
    for (i, question) in result.questions.iter().enumerate() {
        let mark = if question.is_correct { "+" } else { "x" };
        println!("{} Q{}. {}", mark, i + 1, question.question);
        println!("    Your answer: {}", question.user_answer);
        if !question.is_correct {
            println!("    Correct answer: {}", question.correct_answer);
        }
        if let Some(explanation) = &question.explanation {
            println!("    {}", textwrap::fill(explanation, 74).replace('\n', "\n    "));
        }
    }

    println!("\nImprovement Tips");
    println!("{}", "-".repeat(78));
    println!("{}", textwrap::fill(&result.improvement_tip, 78));

    let recs = &result.recommendations;
    if !recs.career_insights.is_empty() {
        println!("\nCareer Insight: {}", textwrap::fill(&recs.career_insights, 78));
    }

    if !recs.job_recommendations.is_empty() {
        println!("\nJob Matches");
        println!("{}", "-".repeat(78));
        for job in &recs.job_recommendations {
            match job.match_percentage {
                Some(pct) => println!("{} ({pct}% match)", job.title),
                None => println!("{}", job.title),
            }
            if !job.required_skills.is_empty() {
                println!("    Required skills: {}", job.required_skills.join(", "));
            }
            if !job.missing_skills.is_empty() {
                println!("    Missing skills: {}", job.missing_skills.join(", "));
            }
            if let Some(path) = &job.potential_career_path {
                println!("    Career path: {path}");
            }
            if !job.company_types.is_empty() {
                println!("    Company types: {}", job.company_types.join(", "));
            }
            if let Some(growth) = &job.growth_potential {
                println!("    Growth potential: {growth}");
            }
        }
    }

    if !recs.skill_development_areas.is_empty() {
        println!(
            "\nSkill Development Areas: {}",
            recs.skill_development_areas.join(", ")
        );
    }

    if !recs.learning_resources.is_empty() {
        println!("\nRecommended Learning Resources");
        println!("{}", "-".repeat(78));
        for resource in &recs.learning_resources {
            println!("{}", resource.title);
            let mut tags = Vec::new();
            if let Some(t) = &resource.resource_type {
                tags.push(t.clone());
            }
            if let Some(d) = &resource.difficulty {
                tags.push(d.clone());
            }
            if let Some(p) = &resource.platform {
                tags.push(p.clone());
            }
            if !tags.is_empty() {
                println!("    {}", tags.join(" · "));
            }
            if !resource.focus_areas.is_empty() {
                println!("    Focus areas: {}", resource.focus_areas.join(", "));
            }
            if let Some(time) = &resource.estimated_completion_time {
                println!("    Estimated time: {time}");
            }
            if let Some(reason) = &resource.recommendation_reason {
                println!("    Why: {}", textwrap::fill(reason, 70).replace('\n', "\n    "));
            }
        }
    }
}
