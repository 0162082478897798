use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::PortfolioError;
use super::{
    TABLE_BLOG_POSTS, TABLE_EXPERIENCES, TABLE_PROFILES, TABLE_PROJECTS, TABLE_TECHNOLOGIES,
};

/// Treat an explicit JSON `null` like a missing field
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Completed,
    InProgress,
    Planned,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [Self::Completed, Self::InProgress, Self::Planned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InProgress => "in-progress",
            Self::Planned => "planned",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::InProgress => "In Progress",
            Self::Planned => "Planned",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PortfolioError::Validation(format!("unknown project status: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub technologies: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub featured: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub status: ProjectStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BlogPost {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub published: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    /// Content split on blank lines, for rendering as plain paragraphs
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .as_deref()
            .unwrap_or_default()
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

pub const DEFAULT_PROFICIENCY: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Technology {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub proficiency: Option<i64>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Technology {
    /// Proficiency on the 1..=5 scale
    pub fn level(&self) -> u8 {
        self.proficiency
            .map(|p| p.clamp(1, 5) as u8)
            .unwrap_or(DEFAULT_PROFICIENCY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Experience {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_default")]
    pub current: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Experience {
    /// e.g. "Apr 2021 - Present"
    pub fn period(&self) -> String {
        let fmt = |d: &NaiveDate| d.format("%b %Y").to_string();
        let start = self.start_date.as_ref().map(fmt).unwrap_or_default();
        let end = if self.current {
            "Present".to_string()
        } else {
            self.end_date.as_ref().map(fmt).unwrap_or_default()
        };
        match (start.is_empty(), end.is_empty()) {
            (false, false) => format!("{start} - {end}"),
            (false, true) => start,
            (true, _) => end,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SiteSettings {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub single_user_mode: bool,
    #[serde(default)]
    pub primary_user_id: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
}

impl SiteSettings {
    /// The admin whose content the public site shows, when single-user mode pins one
    pub fn pinned_user(&self) -> Option<&str> {
        if self.single_user_mode {
            self.primary_user_id.as_deref()
        } else {
            None
        }
    }
}

/// The kinds of record the admin console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Profile,
    Project,
    BlogPost,
    Technology,
    Experience,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        Self::Profile,
        Self::Project,
        Self::BlogPost,
        Self::Technology,
        Self::Experience,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Profile => TABLE_PROFILES,
            Self::Project => TABLE_PROJECTS,
            Self::BlogPost => TABLE_BLOG_POSTS,
            Self::Technology => TABLE_TECHNOLOGIES,
            Self::Experience => TABLE_EXPERIENCES,
        }
    }

    /// Route segment and dashboard tab name
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Project => "projects",
            Self::BlogPost => "blog",
            Self::Technology => "technologies",
            Self::Experience => "experiences",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Project => "project",
            Self::BlogPost => "blog post",
            Self::Technology => "technology",
            Self::Experience => "experience",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecordKind {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| PortfolioError::UnknownKind(s.to_string()))
    }
}
