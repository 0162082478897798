use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::PortfolioError;
use super::types::{
    BlogPost, DEFAULT_PROFICIENCY, Experience, Profile, Project, ProjectStatus, Technology,
};

/// `None` for a blank field, the trimmed text otherwise
fn optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, PortfolioError> {
    optional(value).ok_or_else(|| PortfolioError::Validation(format!("{field} is required")))
}

fn checked(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|v| !matches!(v.trim(), "" | "false" | "off" | "0"))
}

fn to_payload<T: Serialize>(payload: T) -> Result<Value, PortfolioError> {
    Ok(serde_json::to_value(payload)?)
}

fn parse_date(value: &str, field: &str) -> Result<Option<NaiveDate>, PortfolioError> {
    optional(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| PortfolioError::Validation(format!("{field} must be a date (YYYY-MM-DD)")))
        })
        .transpose()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Split a comma-separated field into trimmed, non-empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// URL slug for a blog title: lowercase ASCII letters, digits and single dashes
pub fn generate_slug(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub github_url: String,
    pub linkedin_url: String,
    pub twitter_url: String,
    pub website_url: String,
    pub avatar_url: String,
}

#[derive(Serialize)]
struct ProfilePayload<'a> {
    user_id: &'a str,
    name: &'a str,
    title: Option<&'a str>,
    bio: Option<&'a str>,
    email: Option<&'a str>,
    github_url: Option<&'a str>,
    linkedin_url: Option<&'a str>,
    twitter_url: Option<&'a str>,
    website_url: Option<&'a str>,
    avatar_url: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl ProfileForm {
    pub fn payload(&self, user_id: &str, now: DateTime<Utc>) -> Result<Value, PortfolioError> {
        to_payload(ProfilePayload {
            user_id,
            name: required(&self.name, "Name")?,
            title: optional(&self.title),
            bio: optional(&self.bio),
            email: optional(&self.email),
            github_url: optional(&self.github_url),
            linkedin_url: optional(&self.linkedin_url),
            twitter_url: optional(&self.twitter_url),
            website_url: optional(&self.website_url),
            avatar_url: optional(&self.avatar_url),
            updated_at: now,
        })
    }
}

impl From<&Profile> for ProfileForm {
    fn from(p: &Profile) -> Self {
        Self {
            name: p.name.clone(),
            title: text(&p.title),
            bio: text(&p.bio),
            email: text(&p.email),
            github_url: text(&p.github_url),
            linkedin_url: text(&p.linkedin_url),
            twitter_url: text(&p.twitter_url),
            website_url: text(&p.website_url),
            avatar_url: text(&p.avatar_url),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectForm {
    pub id: String,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub image_url: String,
    pub demo_url: String,
    pub github_url: String,
    /// Comma-separated
    pub technologies: String,
    pub featured: Option<String>,
    pub status: String,
}

#[derive(Serialize)]
struct ProjectPayload<'a> {
    user_id: &'a str,
    title: &'a str,
    description: Option<&'a str>,
    long_description: Option<&'a str>,
    image_url: Option<&'a str>,
    demo_url: Option<&'a str>,
    github_url: Option<&'a str>,
    technologies: Vec<String>,
    featured: bool,
    status: ProjectStatus,
    updated_at: DateTime<Utc>,
}

impl ProjectForm {
    pub fn record_id(&self) -> Option<&str> {
        optional(&self.id)
    }

    pub fn payload(&self, user_id: &str, now: DateTime<Utc>) -> Result<Value, PortfolioError> {
        let status = match optional(&self.status) {
            Some(s) => s.parse()?,
            None => ProjectStatus::default(),
        };
        to_payload(ProjectPayload {
            user_id,
            title: required(&self.title, "Title")?,
            description: optional(&self.description),
            long_description: optional(&self.long_description),
            image_url: optional(&self.image_url),
            demo_url: optional(&self.demo_url),
            github_url: optional(&self.github_url),
            technologies: split_list(&self.technologies),
            featured: checked(&self.featured),
            status,
            updated_at: now,
        })
    }
}

impl From<&Project> for ProjectForm {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            description: text(&p.description),
            long_description: text(&p.long_description),
            image_url: text(&p.image_url),
            demo_url: text(&p.demo_url),
            github_url: text(&p.github_url),
            technologies: p.technologies.join(", "),
            featured: p.featured.then(|| "on".to_string()),
            status: p.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlogPostForm {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: String,
    /// Comma-separated
    pub tags: String,
    pub published: Option<String>,
}

#[derive(Serialize)]
struct BlogPostPayload<'a> {
    user_id: &'a str,
    title: &'a str,
    slug: String,
    excerpt: Option<&'a str>,
    content: Option<&'a str>,
    image_url: Option<&'a str>,
    tags: Vec<String>,
    published: bool,
    updated_at: DateTime<Utc>,
}

impl BlogPostForm {
    pub fn record_id(&self) -> Option<&str> {
        optional(&self.id)
    }

    /// The slug to store: the submitted one, or one derived from the title for new posts
    pub fn effective_slug(&self) -> Result<String, PortfolioError> {
        if let Some(slug) = optional(&self.slug) {
            return Ok(slug.to_string());
        }
        if self.record_id().is_some() {
            return Err(PortfolioError::Validation("Slug is required".to_string()));
        }
        let slug = generate_slug(&self.title);
        if slug.is_empty() {
            return Err(PortfolioError::Validation(
                "Slug is required (the title has no usable characters)".to_string(),
            ));
        }
        Ok(slug)
    }

    pub fn payload(&self, user_id: &str, now: DateTime<Utc>) -> Result<Value, PortfolioError> {
        to_payload(BlogPostPayload {
            user_id,
            title: required(&self.title, "Title")?,
            slug: self.effective_slug()?,
            excerpt: optional(&self.excerpt),
            content: optional(&self.content),
            image_url: optional(&self.image_url),
            tags: split_list(&self.tags),
            published: checked(&self.published),
            updated_at: now,
        })
    }
}

impl From<&BlogPost> for BlogPostForm {
    fn from(p: &BlogPost) -> Self {
        Self {
            id: p.id.clone(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            excerpt: text(&p.excerpt),
            content: text(&p.content),
            image_url: text(&p.image_url),
            tags: p.tags.join(", "),
            published: p.published.then(|| "on".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TechnologyForm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub proficiency: String,
    pub icon_url: String,
}

#[derive(Serialize)]
struct TechnologyPayload<'a> {
    user_id: &'a str,
    name: &'a str,
    category: Option<&'a str>,
    proficiency: u8,
    icon_url: Option<&'a str>,
}

impl TechnologyForm {
    pub fn record_id(&self) -> Option<&str> {
        optional(&self.id)
    }

    pub fn proficiency(&self) -> Result<u8, PortfolioError> {
        match optional(&self.proficiency) {
            None => Ok(DEFAULT_PROFICIENCY),
            Some(v) => v
                .parse::<i64>()
                .map(|p| p.clamp(1, 5) as u8)
                .map_err(|_| PortfolioError::Validation("Proficiency must be a number".to_string())),
        }
    }

    pub fn payload(&self, user_id: &str) -> Result<Value, PortfolioError> {
        to_payload(TechnologyPayload {
            user_id,
            name: required(&self.name, "Name")?,
            category: optional(&self.category),
            proficiency: self.proficiency()?,
            icon_url: optional(&self.icon_url),
        })
    }
}

impl From<&Technology> for TechnologyForm {
    fn from(t: &Technology) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            category: text(&t.category),
            proficiency: t.level().to_string(),
            icon_url: text(&t.icon_url),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperienceForm {
    pub id: String,
    pub company: String,
    pub position: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub current: Option<String>,
    pub location: String,
}

#[derive(Serialize)]
struct ExperiencePayload<'a> {
    user_id: &'a str,
    company: &'a str,
    position: &'a str,
    description: Option<&'a str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    current: bool,
    location: Option<&'a str>,
}

impl ExperienceForm {
    pub fn record_id(&self) -> Option<&str> {
        optional(&self.id)
    }

    pub fn payload(&self, user_id: &str) -> Result<Value, PortfolioError> {
        let current = checked(&self.current);
        let end_date = if current {
            None
        } else {
            parse_date(&self.end_date, "End date")?
        };
        to_payload(ExperiencePayload {
            user_id,
            company: required(&self.company, "Company")?,
            position: required(&self.position, "Position")?,
            description: optional(&self.description),
            start_date: parse_date(&self.start_date, "Start date")?,
            end_date,
            current,
            location: optional(&self.location),
        })
    }
}

impl From<&Experience> for ExperienceForm {
    fn from(e: &Experience) -> Self {
        let date = |d: &Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        Self {
            id: e.id.clone(),
            company: e.company.clone(),
            position: e.position.clone(),
            description: text(&e.description),
            start_date: date(&e.start_date),
            end_date: date(&e.end_date),
            current: e.current.then(|| "on".to_string()),
            location: text(&e.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Rust   &  Axum -- notes "), "rust-axum-notes");
        assert_eq!(generate_slug("Café au lait"), "caf-au-lait");
        assert_eq!(generate_slug("2024: A Year"), "2024-a-year");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" Rust, ,PostgreSQL ,, HTMX "),
            vec!["Rust", "PostgreSQL", "HTMX"]
        );
        assert!(split_list("").is_empty());
        assert!(split_list(" , ,").is_empty());
    }

    #[test]
    fn test_profile_payload_blank_fields_become_null() {
        // Given a profile form with only a name
        let form = ProfileForm {
            name: "Jane".to_string(),
            bio: "   ".to_string(),
            ..Default::default()
        };

        // When building the payload
        let payload = form.payload("u1", now()).unwrap();

        // Then blank fields are null and ownership/timestamps are set
        assert_eq!(payload["name"], "Jane");
        assert_eq!(payload["bio"], Value::Null);
        assert_eq!(payload["github_url"], Value::Null);
        assert_eq!(payload["user_id"], "u1");
        assert_eq!(payload["updated_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_profile_requires_name() {
        let result = ProfileForm::default().payload("u1", now());
        assert!(matches!(result, Err(PortfolioError::Validation(_))));
    }

    #[test]
    fn test_project_payload() {
        let form = ProjectForm {
            title: "Task Tracker".to_string(),
            technologies: "Rust, HTMX,".to_string(),
            featured: Some("on".to_string()),
            status: "in-progress".to_string(),
            ..Default::default()
        };

        let payload = form.payload("u1", now()).unwrap();

        assert_eq!(payload["technologies"], json!(["Rust", "HTMX"]));
        assert_eq!(payload["featured"], true);
        assert_eq!(payload["status"], "in-progress");
        assert!(form.record_id().is_none());
    }

    #[test]
    fn test_project_rejects_unknown_status() {
        let form = ProjectForm {
            title: "x".to_string(),
            status: "abandoned".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.payload("u1", now()),
            Err(PortfolioError::Validation(_))
        ));
    }

    #[test]
    fn test_blog_slug_generated_only_for_new_posts() {
        // Given a new post with a blank slug
        let mut form = BlogPostForm {
            title: "My First Post".to_string(),
            tags: "rust, web".to_string(),
            published: Some("on".to_string()),
            ..Default::default()
        };

        // Then the slug comes from the title
        let payload = form.payload("u1", now()).unwrap();
        assert_eq!(payload["slug"], "my-first-post");
        assert_eq!(payload["tags"], json!(["rust", "web"]));
        assert_eq!(payload["published"], true);

        // When editing an existing post with a blank slug, it is rejected
        form.id = "post-1".to_string();
        assert!(matches!(
            form.payload("u1", now()),
            Err(PortfolioError::Validation(_))
        ));

        // And an explicit slug is kept as submitted
        form.slug = "custom-slug".to_string();
        assert_eq!(form.payload("u1", now()).unwrap()["slug"], "custom-slug");
    }

    #[test]
    fn test_technology_proficiency() {
        let mut form = TechnologyForm {
            name: "Rust".to_string(),
            ..Default::default()
        };
        assert_eq!(form.payload("u1").unwrap()["proficiency"], 3);

        form.proficiency = "7".to_string();
        assert_eq!(form.payload("u1").unwrap()["proficiency"], 5);

        form.proficiency = "-2".to_string();
        assert_eq!(form.payload("u1").unwrap()["proficiency"], 1);

        form.proficiency = "expert".to_string();
        assert!(form.payload("u1").is_err());
    }

    #[test]
    fn test_current_experience_has_no_end_date() {
        // Given a current position that still carries an end date in the form
        let form = ExperienceForm {
            company: "Acme".to_string(),
            position: "Lead".to_string(),
            start_date: "2021-04-01".to_string(),
            end_date: "2023-01-31".to_string(),
            current: Some("on".to_string()),
            ..Default::default()
        };

        // When building the payload
        let payload = form.payload("u1").unwrap();

        // Then the end date is dropped
        assert_eq!(payload["current"], true);
        assert_eq!(payload["end_date"], Value::Null);
        assert_eq!(payload["start_date"], "2021-04-01");
    }

    #[test]
    fn test_experience_validation() {
        let form = ExperienceForm {
            company: "Acme".to_string(),
            ..Default::default()
        };
        assert!(form.payload("u1").is_err());

        let form = ExperienceForm {
            company: "Acme".to_string(),
            position: "Dev".to_string(),
            start_date: "April 2021".to_string(),
            ..Default::default()
        };
        assert!(form.payload("u1").is_err());
    }

    #[test]
    fn test_edit_forms_are_prefilled_from_records() {
        let project = Project {
            id: "p1".to_string(),
            title: "Tracker".to_string(),
            technologies: vec!["Rust".to_string(), "HTMX".to_string()],
            featured: true,
            ..Default::default()
        };
        let form = ProjectForm::from(&project);
        assert_eq!(form.record_id(), Some("p1"));
        assert_eq!(form.technologies, "Rust, HTMX");
        assert_eq!(form.featured.as_deref(), Some("on"));
    }

    proptest! {
        #[test]
        fn prop_slug_is_url_safe(title in ".{0,64}") {
            let slug = generate_slug(&title);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }

        #[test]
        fn prop_split_list_items_are_trimmed_and_non_empty(input in "[a-z ,]{0,40}") {
            for item in split_list(&input) {
                prop_assert!(!item.is_empty());
                prop_assert_eq!(item.trim(), item.as_str());
                prop_assert!(!item.contains(','));
            }
        }
    }
}
