//! folio - core of a single-admin portfolio site
//!
//! This crate talks to the hosted backend (auth, tables, server-side
//! functions), keeps server-side sessions, and implements the registration
//! gate, profile bootstrap and admin/public data flows on top of them.

mod backend;
mod config;
mod coordination;
mod portfolio;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use backend::{
    AuthSession, Backend, BackendError, BackendOp, BackendUser, Filter, InMemoryBackend, Order,
    Query, SignUpResponse, backend, set_backend,
};

pub use config::{FOLIO_ADMIN_PREFIX, FOLIO_DISPLAY_TIMEZONE, FOLIO_SITE_NAME};

pub use coordination::{
    BootstrapOutcome, CONFIRMATION_NOTICE, CoordinationError, Dashboard, HomePage,
    REGISTRATION_CLOSED_MESSAGE, RegistrationCheck, RegistrationSource, SignUpOutcome, SignedIn,
    TechnologyGroup, count_admins, delete_record, find_blog_post, group_by_category,
    has_sample_data, home_page, list_blog_posts, list_projects, load_dashboard, on_signed_in,
    registration_status, save_blog_post, save_experience, save_profile, save_project,
    save_technology, sign_in, sign_out, sign_up, site_settings,
};

pub use portfolio::{
    BlogPost, BlogPostForm, Experience, ExperienceForm, PortfolioError, Profile, ProfileForm,
    Project, ProjectForm, ProjectStatus, RecordKind, SiteSettings, Technology, TechnologyForm,
    generate_slug, split_list,
};

pub use session::{
    SESSION_COOKIE_NAME, SessionError, SessionUser, create_session, get_user_from_session,
    prepare_logout_response,
};

pub use storage::StorageError;

pub use utils::{UtilError, format_date, gen_random_string};

/// Initialize the backend client and the session store
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    storage::init().await?;
    backend::init().await?;
    Ok(())
}
