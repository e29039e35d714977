mod api;
mod auth;
mod config;
mod insights;
mod models;
mod onboarding;
mod profile;
mod quiz;
mod resume;
mod store;
mod tui;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api::ApiClient;
use auth::NextStep;
use config::Config;
use onboarding::{INDUSTRIES, OnboardingForm, STEP_TITLES, StepOutcome};
use store::Store;

#[derive(Parser)]
#[command(name = "jobnest")]
#[command(about = "JobNest career guidance - insights, assessments, and resume tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Email address (prompted for if omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Register,

    /// Sign out and clear stored credentials
    Logout,

    /// Sign in with Google
    Google {
        /// Authorization code from the Google redirect
        #[arg(long)]
        code: Option<String>,
    },

    /// Request a password reset link
    ForgotPassword {
        /// Email address
        email: String,
    },

    /// Reset the password with a token from the reset email
    ResetPassword {
        /// Reset token
        token: String,
    },

    /// Complete your profile (industry, experience, skills, country)
    Onboarding,

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Competency assessments
    Quiz {
        #[command(subcommand)]
        command: QuizCommands,
    },

    /// Industry insights for your profile
    Insights {
        /// Regenerate insights before showing them
        #[arg(long)]
        refresh: bool,
    },

    /// Compare salaries and demand with another country
    Compare {
        /// Target country to compare against
        target_country: String,

        /// Restrict the comparison to one role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Build, save, and export your resume
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// List the JobNest tools
    Tools,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,

    /// Edit industry, experience, and skills
    Edit,
}

#[derive(Subcommand)]
enum QuizCommands {
    /// List assessment categories and specializations
    Categories,

    /// Start a timed assessment
    Start {
        /// Category (id or name, e.g. "technical")
        category: String,

        /// Specialization (prompted for if omitted)
        #[arg(short, long)]
        specialization: Option<String>,
    },

    /// Show past assessments
    History,
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// Print the rendered resume
    Show,

    /// Render the resume and save it locally
    Save,

    /// Export the resume as a PDF
    Export {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Set name and contact details
    Contact {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        #[arg(long)]
        linkedin: Option<String>,
        #[arg(long)]
        github: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },

    /// Set the professional summary
    Summary {
        text: String,
    },

    /// Manage the skills list
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },

    /// Add an experience, education, or project entry
    Add {
        /// Which list to add to
        section: Section,

        #[arg(long)]
        title: String,
        #[arg(long)]
        organization: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        /// This is a current position (renders as "Present")
        #[arg(long)]
        current: bool,
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove an entry by its number
    Remove {
        section: Section,
        index: usize,
    },
}

#[derive(Subcommand)]
enum SkillCommands {
    /// Add a skill (duplicates are ignored)
    Add { skill: String },

    /// Remove a skill (exact match)
    Remove { skill: String },

    /// List skills
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Section {
    Experience,
    Education,
    Projects,
}

fn main() -> Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = Store::open()?;
    let api = ApiClient::new(&config, store.clone())?;

    match cli.command {
        Commands::Login { email } => {
            let email = match email {
                Some(email) => email,
                None => prompt("Email")?,
            };
            let password = prompt("Password")?;
            let next = auth::login(&api, &store, &email, &password)?;
            println!("Welcome back!");
            print_next_step(next);
        }

        Commands::Register => {
            let name = prompt("Name")?;
            let email = prompt("Email")?;
            let password = prompt("Password")?;
            let confirm = prompt("Confirm password")?;
            let next = auth::register(&api, &store, &name, &email, &password, &confirm)?;
            println!("Account created.");
            print_next_step(next);
        }

        Commands::Logout => {
            auth::logout(&store)?;
            println!("Signed out.");
        }

        Commands::Google { code } => match code {
            None => {
                let url = auth::begin_google_auth(&store, &config)?;
                println!("Open this URL, authorize JobNest, and copy the code from the redirect:");
                println!("\n{url}\n");
                println!("Then finish with: jobnest google --code <code>");
            }
            Some(code) => {
                let next = auth::complete_google_auth(&api, &store, &config, &code)?;
                println!("Signed in with Google.");
                print_next_step(next);
            }
        },

        Commands::ForgotPassword { email } => {
            auth::forgot_password(&api, &email)?;
            println!(
                "If the email exists in our system, a password reset link has been sent. \
                 Please check your inbox and follow the instructions."
            );
        }

        Commands::ResetPassword { token } => {
            auth::validate_reset_token(&api, &token)?;
            println!("{}", auth::PASSWORD_RULES);
            let password = prompt("New password")?;
            let confirm = prompt("Confirm new password")?;
            auth::reset_password(&api, &store, &token, &password, &confirm)?;
            println!("Your password has been successfully reset. Run `jobnest login` to sign in.");
        }

        Commands::Onboarding => {
            auth::require_auth(&store)?;
            run_onboarding(&api, &store)?;
        }

        Commands::Profile { command } => {
            auth::require_auth(&store)?;
            match command {
                ProfileCommands::Show => {
                    let user = profile::fetch_profile(&api)?;
                    print_profile(&user);
                }
                ProfileCommands::Edit => run_profile_edit(&api, &store)?,
            }
        }

        Commands::Quiz { command } => {
            auth::require_auth(&store)?;
            match command {
                QuizCommands::Categories => {
                    for category in quiz::fetch_categories(&api) {
                        println!("{} ({})", category.name, category.id);
                        println!("  {}", category.description);
                        if !category.skills.is_empty() {
                            println!("  Skills assessed: {}", category.skills.join(", "));
                        }
                        println!("  Specializations: {}", category.specializations.join(", "));
                        println!();
                    }
                }

                QuizCommands::Start {
                    category,
                    specialization,
                } => run_quiz(&api, &category, specialization.as_deref())?,

                QuizCommands::History => {
                    let assessments = quiz::fetch_assessments(&api)?;
                    if assessments.is_empty() {
                        println!("No assessments yet. Start one with `jobnest quiz start technical`.");
                    } else {
                        println!("{:<14} {:<28} {:>7}  {}", "CATEGORY", "SPECIALIZATION", "SCORE", "TAKEN");
                        println!("{}", "-".repeat(72));
                        for a in assessments {
                            let score = a
                                .quiz_score
                                .map(|s| format!("{s:.0}%"))
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<14} {:<28} {:>7}  {}",
                                a.category,
                                a.sub_industry.unwrap_or_default(),
                                score,
                                insights::format_date(a.created_at.as_deref())
                            );
                        }
                    }
                }
            }
        }

        Commands::Insights { refresh } => {
            auth::require_auth(&store)?;
            let (user, insight) = insights::load(&api, &store, refresh)?;
            insights::render(&user, &insight);
        }

        Commands::Compare {
            target_country,
            role,
        } => {
            auth::require_auth(&store)?;
            let user = profile::fetch_profile(&api)?;
            let comparison = insights::comparison(&api, &user, &target_country, role.as_deref())?;
            let user_salary =
                insights::parse_salary(user.salary_expectation.as_deref().unwrap_or(""));
            insights::render_comparison(&comparison, user_salary);
        }

        Commands::Resume { command } => {
            auth::require_auth(&store)?;
            run_resume(&store, command)?;
        }

        Commands::Tools => {
            println!("JobNest tools:");
            println!("  insights  Personalized industry insights, salaries, and trends");
            println!("  quiz      Timed competency assessments with skill-gap analysis");
            println!("  compare   Country and role salary comparison");
            println!("  resume    Resume builder with PDF export");
            println!("\nSign in with `jobnest login` (or `jobnest google`) to get started.");
        }
    }

    Ok(())
}

fn print_next_step(next: NextStep) {
    match next {
        NextStep::Insights => println!("Run `jobnest insights` to see your industry insights."),
        NextStep::Onboarding => {
            println!("Your profile is incomplete. Run `jobnest onboarding` to finish setting up.")
        }
    }
}

fn print_profile(user: &models::User) {
    println!("{} <{}>", user.name, user.email);
    println!("Industry: {}", user.industry.as_deref().unwrap_or("-"));
    if let Some(sub) = &user.sub_industry {
        println!("Specialization: {sub}");
    }
    if let Some(years) = user.experience {
        println!("Experience: {years} years");
    }
    println!("Country: {}", user.country.as_deref().unwrap_or("-"));
    if let Some(salary) = &user.salary_expectation {
        println!(
            "Salary expectation: {}",
            insights::format_usd(insights::parse_salary(salary))
        );
    }
    if !user.skills.is_empty() {
        println!("Skills: {}", user.skills.join(", "));
    }
    if let Some(score) = user.competency_score {
        println!("Competency score: {score:.0}%");
    }
}

// --- Onboarding wizard ---

fn run_onboarding(api: &ApiClient, store: &Store) -> Result<()> {
    println!("Let's complete your profile. Enter :b at a prompt to go back a step.\n");

    let mut form = OnboardingForm::new();
    loop {
        println!(
            "Step {}/4 - {}",
            form.step() + 1,
            STEP_TITLES[form.step()]
        );

        let went_back = match form.step() {
            0 => fill_industry_step(&mut form)?,
            1 => fill_experience_step(&mut form)?,
            2 => fill_skills_step(&mut form)?,
            _ => fill_country_step(&mut form)?,
        };
        if went_back {
            form.back();
            continue;
        }

        match form.next() {
            StepOutcome::Rejected => {
                println!("{}\n", form.error().unwrap_or("Please fill in this step"));
            }
            StepOutcome::Advanced => println!(),
            StepOutcome::Complete => break,
        }
    }

    println!("Saving your profile and generating insights...");
    onboarding::complete(api, store, &form)?;
    println!("All done! Run `jobnest insights` to see your personalized insights.");
    Ok(())
}

/// Each step filler returns true when the user asked to go back.
fn fill_industry_step(form: &mut OnboardingForm) -> Result<bool> {
    for (i, industry) in INDUSTRIES.iter().enumerate() {
        println!("  {}. {}", i + 1, industry.name);
    }
    let input = prompt("Industry (number or name)")?;
    if input == ":b" {
        return Ok(true);
    }
    if input.is_empty() {
        form.industry.clear();
        return Ok(false);
    }

    let chosen = input
        .parse::<usize>()
        .ok()
        .and_then(|n| INDUSTRIES.get(n.wrapping_sub(1)))
        .or_else(|| onboarding::industry_by_name(&input));

    let Some(industry) = chosen else {
        form.industry.clear();
        return Ok(false);
    };
    form.industry = industry.name.to_string();

    for (i, sub) in industry.sub_industries.iter().enumerate() {
        println!("  {}. {}", i + 1, sub);
    }
    let input = prompt("Specialization (number or name, optional)")?;
    if input == ":b" {
        return Ok(true);
    }
    form.sub_industry = input
        .parse::<usize>()
        .ok()
        .and_then(|n| industry.sub_industries.get(n.wrapping_sub(1)))
        .map(|s| s.to_string())
        .unwrap_or(input);
    Ok(false)
}

fn fill_experience_step(form: &mut OnboardingForm) -> Result<bool> {
    let input = prompt("Years of experience")?;
    if input == ":b" {
        return Ok(true);
    }
    form.experience = input;

    let input = prompt("Salary expectation in USD (optional, e.g. 75000)")?;
    if input == ":b" {
        return Ok(true);
    }
    form.salary_expectation = input;
    Ok(false)
}

fn fill_skills_step(form: &mut OnboardingForm) -> Result<bool> {
    let input = prompt("Your skills (comma separated, e.g. Rust, SQL, Kubernetes)")?;
    if input == ":b" {
        return Ok(true);
    }
    form.skills = input;
    Ok(false)
}

fn fill_country_step(form: &mut OnboardingForm) -> Result<bool> {
    let input = prompt("Country (e.g. United States, India, Canada)")?;
    if input == ":b" {
        return Ok(true);
    }
    form.country = input;
    Ok(false)
}

// --- Profile editing ---

fn run_profile_edit(api: &ApiClient, store: &Store) -> Result<()> {
    let user = profile::fetch_profile(api)?;
    print_profile(&user);
    println!("\nLeave a field blank to keep its current value.");

    let industry_input = prompt(&format!(
        "Industry [{}]",
        user.industry.as_deref().unwrap_or("-")
    ))?;
    let industry = if industry_input.is_empty() {
        user.industry.clone().unwrap_or_default()
    } else {
        industry_input
    };
    if industry.is_empty() {
        bail!("An industry is required. Run `jobnest onboarding` if you haven't set one.");
    }

    let experience_input = prompt(&format!(
        "Years of experience [{}]",
        user.experience.unwrap_or(0)
    ))?;
    let experience = if experience_input.is_empty() {
        user.experience.unwrap_or(0)
    } else {
        experience_input
            .parse()
            .context("Experience must be a number of years")?
    };

    let mut skills = user.skills.clone();
    println!("\nSkills: {}", if skills.is_empty() { "-".to_string() } else { skills.join(", ") });
    println!("Enter +skill to add, -skill to remove, blank to finish.");
    loop {
        let input = prompt("Skill")?;
        if input.is_empty() {
            break;
        }
        if let Some(skill) = input.strip_prefix('+') {
            if !profile::add_skill(&mut skills, skill) {
                println!("  (already in the list)");
            }
        } else if let Some(skill) = input.strip_prefix('-') {
            if !profile::remove_skill(&mut skills, skill) {
                println!("  (no exact match)");
            }
        } else if !profile::add_skill(&mut skills, &input) {
            println!("  (already in the list)");
        }
        println!("  Skills: {}", skills.join(", "));
    }

    let update = profile::ProfileUpdate {
        industry,
        sub_industry: user.sub_industry.clone(),
        experience,
        skills,
        country: user.country.clone(),
        salary_expectation: user.salary_expectation.clone(),
        auth_provider: None,
    };
    profile::update_profile(api, store, &update)?;
    println!("Profile updated. Run `jobnest insights` to refresh your insights.");
    Ok(())
}

// --- Quiz ---

fn run_quiz(api: &ApiClient, category: &str, specialization: Option<&str>) -> Result<()> {
    let categories = quiz::fetch_categories(api);
    let Some(category) = quiz::find_category(&categories, category) else {
        bail!(
            "Unknown category '{category}'. Run `jobnest quiz categories` to see what's available."
        );
    };

    let specialization = match specialization {
        Some(s) => s.to_string(),
        None => {
            for (i, sub) in category.specializations.iter().enumerate() {
                println!("  {}. {}", i + 1, sub);
            }
            let input = prompt("Specialization (number or name)")?;
            input
                .parse::<usize>()
                .ok()
                .and_then(|n| category.specializations.get(n.wrapping_sub(1)))
                .cloned()
                .unwrap_or(input)
        }
    };
    if specialization.is_empty() {
        bail!("A specialization is required to start the assessment.");
    }

    println!("Loading your competency test...");
    let questions = quiz::fetch_quiz(api, &category.id, &specialization)?;
    let mut session = quiz::QuizSession::new(category.id.clone(), specialization, questions);

    match tui::run_quiz(&mut session)? {
        tui::QuizOutcome::Abandoned => {
            println!("Assessment abandoned. No results were recorded.");
        }
        tui::QuizOutcome::Submitted => {
            println!("Submitting your answers...");
            let result = quiz::submit(api, &session)?;
            quiz::render_result(&result);
        }
    }
    Ok(())
}

// --- Resume builder ---

fn run_resume(store: &Store, command: ResumeCommands) -> Result<()> {
    let mut draft = resume::ResumeDraft::load(store)?;

    match command {
        ResumeCommands::Show => {
            let markdown = draft.render_markdown();
            if markdown.is_empty() {
                println!("The resume is empty. Start with `jobnest resume contact --name ...`");
            } else {
                println!("{markdown}");
            }
        }

        ResumeCommands::Save => {
            resume::save_rendered(store, &draft)?;
            println!("Resume saved.");
        }

        ResumeCommands::Export { output } => {
            let markdown = draft.render_markdown();
            if markdown.is_empty() {
                bail!("The resume is empty; nothing to export.");
            }
            let output =
                output.unwrap_or_else(|| PathBuf::from(resume::default_export_filename(&draft.name)));
            resume::export_pdf(&markdown, &output)?;
            println!("Resume exported to {}", output.display());
        }

        ResumeCommands::Contact {
            name,
            title,
            email,
            mobile,
            linkedin,
            github,
            website,
            location,
        } => {
            if let Some(name) = name {
                draft.name = name;
            }
            let contact = &mut draft.contact;
            if let Some(title) = title {
                contact.title = title;
            }
            if let Some(email) = email {
                contact.email = email;
            }
            if let Some(mobile) = mobile {
                contact.mobile = mobile;
            }
            if let Some(linkedin) = linkedin {
                contact.linkedin = linkedin;
            }
            if let Some(github) = github {
                contact.github = github;
            }
            if let Some(website) = website {
                contact.website = website;
            }
            if let Some(location) = location {
                contact.location = location;
            }
            draft.save(store)?;
            println!("Contact details updated.");
        }

        ResumeCommands::Summary { text } => {
            draft.summary = text;
            draft.save(store)?;
            println!("Summary updated.");
        }

        ResumeCommands::Skill { command } => match command {
            SkillCommands::Add { skill } => {
                if draft.add_skill(&skill) {
                    draft.save(store)?;
                    println!("Added '{skill}'.");
                } else {
                    println!("'{skill}' is already in the list.");
                }
            }
            SkillCommands::Remove { skill } => {
                if draft.remove_skill(&skill) {
                    draft.save(store)?;
                    println!("Removed '{skill}'.");
                } else {
                    println!("'{skill}' is not in the list.");
                }
            }
            SkillCommands::List => {
                if draft.skills.is_empty() {
                    println!("No skills yet. Add one with `jobnest resume skill add <skill>`.");
                } else {
                    for skill in &draft.skills {
                        println!("{skill}");
                    }
                }
            }
        },

        ResumeCommands::Add {
            section,
            title,
            organization,
            start,
            end,
            current,
            description,
        } => {
            let entry = resume::Entry {
                title,
                organization,
                start_date: start,
                end_date: end.unwrap_or_default(),
                current,
                description: description.unwrap_or_default(),
            };
            section_entries(&mut draft, section).push(entry);
            draft.save(store)?;
            println!("Entry added.");
        }

        ResumeCommands::Remove { section, index } => {
            let entries = section_entries(&mut draft, section);
            if index == 0 || index > entries.len() {
                bail!("No entry #{index}; the section has {} entries.", entries.len());
            }
            let removed = entries.remove(index - 1);
            draft.save(store)?;
            println!("Removed '{}'.", removed.title);
        }
    }
    Ok(())
}

fn section_entries(draft: &mut resume::ResumeDraft, section: Section) -> &mut Vec<resume::Entry> {
    match section {
        Section::Experience => &mut draft.experience,
        Section::Education => &mut draft.education,
        Section::Projects => &mut draft.projects,
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
