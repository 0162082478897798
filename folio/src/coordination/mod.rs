//! Flows that combine the backend, sessions and portfolio records

mod admin;
mod bootstrap;
mod errors;
mod fetch;
mod public;
mod registration;
mod sample;

pub use admin::{
    Dashboard, delete_record, load_dashboard, save_blog_post, save_experience, save_profile,
    save_project, save_technology,
};
pub use bootstrap::{BootstrapOutcome, on_signed_in};
pub use errors::{CoordinationError, REGISTRATION_CLOSED_MESSAGE};
pub use public::{
    HomePage, TechnologyGroup, find_blog_post, group_by_category, home_page, list_blog_posts,
    list_projects, site_settings,
};
pub use registration::{
    CONFIRMATION_NOTICE, RegistrationCheck, RegistrationSource, SignUpOutcome, SignedIn,
    count_admins, registration_status, sign_in, sign_out, sign_up,
};
pub use sample::has_sample_data;
