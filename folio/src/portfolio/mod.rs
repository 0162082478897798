//! Portfolio records as stored in the hosted tables, and the admin forms that produce them

mod errors;
mod forms;
mod types;

pub use errors::PortfolioError;
pub use forms::{
    BlogPostForm, ExperienceForm, ProfileForm, ProjectForm, TechnologyForm, generate_slug,
    split_list,
};
pub use types::{
    BlogPost, Experience, Profile, Project, ProjectStatus, RecordKind, SiteSettings, Technology,
};

pub const TABLE_PROFILES: &str = "profiles";
pub const TABLE_PROJECTS: &str = "projects";
pub const TABLE_BLOG_POSTS: &str = "blog_posts";
pub const TABLE_TECHNOLOGIES: &str = "technologies";
pub const TABLE_EXPERIENCES: &str = "experiences";
pub const TABLE_SITE_SETTINGS: &str = "site_settings";

/// Tables holding per-admin content (everything the sample data seeds, except settings)
pub const CONTENT_TABLES: [&str; 5] = [
    TABLE_PROFILES,
    TABLE_PROJECTS,
    TABLE_BLOG_POSTS,
    TABLE_TECHNOLOGIES,
    TABLE_EXPERIENCES,
];

pub const ALL_TABLES: [&str; 6] = [
    TABLE_PROFILES,
    TABLE_PROJECTS,
    TABLE_BLOG_POSTS,
    TABLE_TECHNOLOGIES,
    TABLE_EXPERIENCES,
    TABLE_SITE_SETTINGS,
];
