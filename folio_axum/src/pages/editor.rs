//! Field lists for the admin console's record forms
//!
//! Every form is rendered by one template from a list of [`FieldView`]s, so
//! a form that failed to save can be shown again with what was typed.

use folio::{
    BlogPostForm, ExperienceForm, ProfileForm, ProjectForm, ProjectStatus, RecordKind,
    TechnologyForm,
};

use crate::config::admin_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Input {
    Text,
    Email,
    Url,
    Date,
    Number,
    TextArea,
    Checkbox,
    Select,
}

impl Input {
    /// Widget name the template switches on; doubles as the `<input type>`
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Url => "url",
            Self::Date => "date",
            Self::Number => "number",
            Self::TextArea => "textarea",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OptionView {
    pub(crate) value: &'static str,
    pub(crate) label: &'static str,
    pub(crate) selected: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldView {
    pub(crate) name: &'static str,
    pub(crate) label: &'static str,
    pub(crate) input: Input,
    pub(crate) value: String,
    pub(crate) required: bool,
    pub(crate) options: Vec<OptionView>,
}

impl FieldView {
    fn new(name: &'static str, label: &'static str, input: Input, value: &str) -> Self {
        Self {
            name,
            label,
            input,
            value: value.to_string(),
            required: false,
            options: Vec::new(),
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn checkbox(name: &'static str, label: &'static str, checked: &Option<String>) -> Self {
        let value = if checked.is_some() { "on" } else { "" };
        Self::new(name, label, Input::Checkbox, value)
    }

    pub(crate) fn is_checked(&self) -> bool {
        !self.value.is_empty()
    }
}

/// A record form ready to render
#[derive(Debug, Clone)]
pub(crate) struct FormView {
    pub(crate) heading: String,
    pub(crate) action: String,
    pub(crate) id: String,
    pub(crate) fields: Vec<FieldView>,
}

pub(crate) trait EditorForm {
    const KIND: RecordKind;

    /// Id of the record being edited; empty for a new one
    fn id(&self) -> &str;

    fn fields(&self) -> Vec<FieldView>;

    fn view(&self) -> FormView {
        let verb = if self.id().is_empty() { "Add" } else { "Edit" };
        FormView {
            heading: format!("{} {}", verb, title_case(Self::KIND.label())),
            action: admin_url(&format!("/{}", Self::KIND.slug())),
            id: self.id().to_string(),
            fields: self.fields(),
        }
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl EditorForm for ProfileForm {
    const KIND: RecordKind = RecordKind::Profile;

    fn id(&self) -> &str {
        ""
    }

    fn view(&self) -> FormView {
        FormView {
            heading: "Edit Profile".to_string(),
            action: admin_url("/profile"),
            id: String::new(),
            fields: self.fields(),
        }
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("name", "Name", Input::Text, &self.name).required(),
            FieldView::new("title", "Title", Input::Text, &self.title),
            FieldView::new("bio", "Bio", Input::TextArea, &self.bio),
            FieldView::new("email", "Email", Input::Email, &self.email),
            FieldView::new("github_url", "GitHub URL", Input::Url, &self.github_url),
            FieldView::new("linkedin_url", "LinkedIn URL", Input::Url, &self.linkedin_url),
            FieldView::new("twitter_url", "Twitter URL", Input::Url, &self.twitter_url),
            FieldView::new("website_url", "Website URL", Input::Url, &self.website_url),
            FieldView::new("avatar_url", "Avatar URL", Input::Url, &self.avatar_url),
        ]
    }
}

impl EditorForm for ProjectForm {
    const KIND: RecordKind = RecordKind::Project;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<FieldView> {
        let mut status = FieldView::new("status", "Status", Input::Select, &self.status);
        let current = self.status.parse::<ProjectStatus>().unwrap_or_default();
        status.options = ProjectStatus::ALL
            .iter()
            .map(|s| OptionView {
                value: s.as_str(),
                label: s.label(),
                selected: *s == current,
            })
            .collect();

        vec![
            FieldView::new("title", "Title", Input::Text, &self.title).required(),
            FieldView::new("description", "Description", Input::TextArea, &self.description),
            FieldView::new(
                "long_description",
                "Long Description",
                Input::TextArea,
                &self.long_description,
            ),
            FieldView::new("image_url", "Image URL", Input::Url, &self.image_url),
            FieldView::new("demo_url", "Demo URL", Input::Url, &self.demo_url),
            FieldView::new("github_url", "GitHub URL", Input::Url, &self.github_url),
            FieldView::new(
                "technologies",
                "Technologies (comma-separated)",
                Input::Text,
                &self.technologies,
            ),
            status,
            FieldView::checkbox("featured", "Featured project", &self.featured),
        ]
    }
}

impl EditorForm for BlogPostForm {
    const KIND: RecordKind = RecordKind::BlogPost;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("title", "Title", Input::Text, &self.title).required(),
            FieldView::new(
                "slug",
                "Slug (generated from the title when empty)",
                Input::Text,
                &self.slug,
            ),
            FieldView::new("excerpt", "Excerpt", Input::TextArea, &self.excerpt),
            FieldView::new("content", "Content", Input::TextArea, &self.content),
            FieldView::new("image_url", "Image URL", Input::Url, &self.image_url),
            FieldView::new("tags", "Tags (comma-separated)", Input::Text, &self.tags),
            FieldView::checkbox("published", "Published", &self.published),
        ]
    }
}

impl EditorForm for TechnologyForm {
    const KIND: RecordKind = RecordKind::Technology;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("name", "Name", Input::Text, &self.name).required(),
            FieldView::new("category", "Category", Input::Text, &self.category),
            FieldView::new("proficiency", "Proficiency (1-5)", Input::Number, &self.proficiency),
            FieldView::new("icon_url", "Icon URL", Input::Url, &self.icon_url),
        ]
    }
}

impl EditorForm for ExperienceForm {
    const KIND: RecordKind = RecordKind::Experience;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView::new("company", "Company", Input::Text, &self.company).required(),
            FieldView::new("position", "Position", Input::Text, &self.position).required(),
            FieldView::new("location", "Location", Input::Text, &self.location),
            FieldView::new("start_date", "Start Date", Input::Date, &self.start_date),
            FieldView::new("end_date", "End Date", Input::Date, &self.end_date),
            FieldView::checkbox("current", "I currently work here", &self.current),
            FieldView::new("description", "Description", Input::TextArea, &self.description),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_edit_headings() {
        let new = ProjectForm::default().view();
        let edit = ProjectForm {
            id: "p1".to_string(),
            ..Default::default()
        }
        .view();

        assert_eq!(new.heading, "Add Project");
        assert_eq!(edit.heading, "Edit Project");
        assert_eq!(edit.id, "p1");
        assert!(new.action.ends_with("/projects"));
    }

    #[test]
    fn test_blog_form_posts_to_blog_route() {
        let view = BlogPostForm::default().view();

        assert_eq!(view.heading, "Add Blog Post");
        assert!(view.action.ends_with("/blog"));
    }

    #[test]
    fn test_status_select_marks_current_value() {
        let form = ProjectForm {
            status: "in-progress".to_string(),
            ..Default::default()
        };

        let fields = form.fields();
        let status = fields.iter().find(|f| f.name == "status").unwrap();

        let selected: Vec<&str> = status
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect();
        assert_eq!(selected, vec!["in-progress"]);
    }

    #[test]
    fn test_checkbox_state() {
        let form = ExperienceForm {
            current: Some("on".to_string()),
            ..Default::default()
        };

        let fields = form.fields();
        let current = fields.iter().find(|f| f.name == "current").unwrap();

        assert!(current.is_checked());
        assert_eq!(current.input.as_str(), "checkbox");
    }
}
