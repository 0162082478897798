//! Template-friendly versions of the portfolio records

use folio::{
    BlogPost, Experience, Profile, Project, Technology, TechnologyGroup, format_date,
};

const PROFICIENCY_DOTS: u8 = 5;

#[derive(Debug, Clone)]
pub(crate) struct LinkView {
    pub(crate) label: &'static str,
    pub(crate) url: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ProfileView {
    pub(crate) name: String,
    pub(crate) title: String,
    pub(crate) bio: String,
    pub(crate) email: String,
    pub(crate) avatar_url: String,
    pub(crate) links: Vec<LinkView>,
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        let links = [
            ("GitHub", &profile.github_url),
            ("LinkedIn", &profile.linkedin_url),
            ("Twitter", &profile.twitter_url),
            ("Website", &profile.website_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            url.as_ref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| LinkView {
                    label,
                    url: u.clone(),
                })
        })
        .collect();

        Self {
            name: profile.name.clone(),
            title: text(&profile.title),
            bio: text(&profile.bio),
            email: text(&profile.email),
            avatar_url: text(&profile.avatar_url),
            links,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProjectView {
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) image_url: String,
    pub(crate) demo_url: String,
    pub(crate) github_url: String,
    pub(crate) technologies: Vec<String>,
    pub(crate) featured: bool,
    pub(crate) status: &'static str,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: text(&project.description),
            image_url: text(&project.image_url),
            demo_url: text(&project.demo_url),
            github_url: text(&project.github_url),
            technologies: project.technologies.clone(),
            featured: project.featured,
            status: project.status.label(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TechnologyView {
    pub(crate) name: String,
    /// CSS class per proficiency dot, "on" or "off"
    pub(crate) dots: Vec<&'static str>,
}

impl From<&Technology> for TechnologyView {
    fn from(tech: &Technology) -> Self {
        let level = tech.level();
        Self {
            name: tech.name.clone(),
            dots: (1..=PROFICIENCY_DOTS)
                .map(|i| if i <= level { "on" } else { "off" })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TechnologyGroupView {
    pub(crate) category: String,
    pub(crate) technologies: Vec<TechnologyView>,
}

impl From<&TechnologyGroup> for TechnologyGroupView {
    fn from(group: &TechnologyGroup) -> Self {
        Self {
            category: group.category.clone(),
            technologies: group.technologies.iter().map(TechnologyView::from).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ExperienceView {
    pub(crate) position: String,
    pub(crate) company: String,
    pub(crate) location: String,
    pub(crate) period: String,
    pub(crate) description: String,
    pub(crate) current: bool,
}

impl From<&Experience> for ExperienceView {
    fn from(exp: &Experience) -> Self {
        Self {
            position: exp.position.clone(),
            company: exp.company.clone(),
            location: text(&exp.location),
            period: exp.period(),
            description: text(&exp.description),
            current: exp.current,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PostView {
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) excerpt: String,
    pub(crate) image_url: String,
    pub(crate) date: String,
    pub(crate) tags: Vec<String>,
    pub(crate) paragraphs: Vec<String>,
}

impl From<&BlogPost> for PostView {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: text(&post.excerpt),
            image_url: text(&post.image_url),
            date: post.created_at.as_ref().map(format_date).unwrap_or_default(),
            tags: post.tags.clone(),
            paragraphs: post.paragraphs().into_iter().map(str::to_string).collect(),
        }
    }
}

pub(crate) fn views<'a, T: 'a, V: From<&'a T>>(records: &'a [T]) -> Vec<V> {
    records.iter().map(V::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_dots_follow_level() {
        let tech = Technology {
            name: "Rust".to_string(),
            proficiency: Some(4),
            ..Default::default()
        };

        let view = TechnologyView::from(&tech);

        assert_eq!(view.dots, vec!["on", "on", "on", "on", "off"]);
    }

    #[test]
    fn test_profile_links_skip_blank_urls() {
        let profile = Profile {
            name: "Jane".to_string(),
            github_url: Some("https://github.com/jane".to_string()),
            linkedin_url: Some("  ".to_string()),
            ..Default::default()
        };

        let view = ProfileView::from(&profile);

        assert_eq!(view.links.len(), 1);
        assert_eq!(view.links[0].label, "GitHub");
        assert_eq!(view.title, "");
    }
}
