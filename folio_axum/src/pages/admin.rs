use askama::Template;
use axum::{
    extract::{Form, Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, headers};
use serde::Deserialize;

use folio::{
    BlogPostForm, CONFIRMATION_NOTICE, CoordinationError, Dashboard, ExperienceForm,
    FOLIO_SITE_NAME, ProfileForm, ProjectForm, RecordKind, SessionUser, SignUpOutcome,
    TechnologyForm, backend, count_admins, delete_record, has_sample_data, load_dashboard,
    registration_status, save_blog_post, save_experience, save_profile, save_project,
    save_technology, sign_in, sign_out, sign_up,
};

use super::editor::{EditorForm, FormView};
use super::render;
use super::views::ProfileView;
use crate::IntoResponseError;
use crate::config::{admin_url, dashboard_url};
use crate::error::status_of;
use crate::session::{AuthUser, CsrfField, CsrfForm};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AdminQuery {
    /// Dashboard tab, a record kind slug
    tab: Option<String>,
    /// "new" opens an empty form (or the profile form)
    form: Option<String>,
    /// Id of the record to edit
    edit: Option<String>,
    notice: Option<String>,
    /// "signup" selects the sign-up tab of the login page
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Credentials {
    email: String,
    password: String,
}

pub(super) async fn index(
    user: Option<AuthUser>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, (StatusCode, String)> {
    match user {
        Some(user) => {
            let kind = query
                .tab
                .as_deref()
                .and_then(|t| t.parse::<RecordKind>().ok())
                .unwrap_or(RecordKind::Profile);
            let editor = match (query.form.as_deref(), query.edit) {
                (_, Some(id)) => Editor::Edit(id),
                (Some(_), None) => Editor::New,
                (None, None) => Editor::Closed,
            };
            let html = dashboard(&user, kind, editor, None, query.notice).await?;
            Ok(html.into_response())
        }
        None => {
            let page = LoginPage {
                signup_mode: query.mode.as_deref() == Some("signup"),
                ..Default::default()
            };
            Ok(login_page(page).await?.into_response())
        }
    }
}

// Login page

#[derive(Template)]
#[template(path = "admin_login.j2", escape = "html")]
struct LoginTemplate {
    site_name: String,
    admin_url: String,
    signin_action: String,
    signup_action: String,
    signup_mode: bool,
    registration_allowed: bool,
    description: &'static str,
    admin_count_text: String,
    sample_present: bool,
    email: String,
    error: String,
    notice: String,
}

#[derive(Debug, Default)]
struct LoginPage {
    signup_mode: bool,
    email: String,
    error: String,
    notice: String,
}

fn admin_count_text(count: u64) -> String {
    match count {
        0 => String::new(),
        1 => "This portfolio is in single-user mode. 1 admin user registered.".to_string(),
        n => format!("This portfolio is in single-user mode. {n} admin users registered."),
    }
}

async fn login_page(page: LoginPage) -> Result<Html<String>, (StatusCode, String)> {
    let backend = backend();
    let status = registration_status(backend.as_ref()).await;
    let count = count_admins(backend.as_ref()).await;
    let sample_present = has_sample_data(backend.as_ref()).await;

    render(&LoginTemplate {
        site_name: FOLIO_SITE_NAME.to_string(),
        admin_url: admin_url("/"),
        signin_action: admin_url("/signin"),
        signup_action: admin_url("/signup"),
        signup_mode: page.signup_mode,
        registration_allowed: status.allowed,
        description: if count == 0 {
            "Create your admin account to get started"
        } else {
            "Sign in to manage your portfolio content"
        },
        admin_count_text: admin_count_text(count),
        sample_present,
        email: page.email,
        error: page.error,
        notice: page.notice,
    })
}

async fn login_error(
    signup_mode: bool,
    email: String,
    error: CoordinationError,
) -> Result<Response, (StatusCode, String)> {
    let status = status_of(&error);
    let html = login_page(LoginPage {
        signup_mode,
        email,
        error: error.to_string(),
        notice: String::new(),
    })
    .await?;
    Ok((status, html).into_response())
}

pub(super) async fn signin(
    Form(form): Form<Credentials>,
) -> Result<Response, (StatusCode, String)> {
    match sign_in(backend().as_ref(), &form.email, &form.password).await {
        Ok(signed_in) => Ok((signed_in.headers, Redirect::to(&admin_url("/"))).into_response()),
        Err(e) => login_error(false, form.email, e).await,
    }
}

pub(super) async fn signup(
    Form(form): Form<Credentials>,
) -> Result<Response, (StatusCode, String)> {
    let backend = backend();
    // Decided again here; the form may have been rendered before someone else signed up
    let status = registration_status(backend.as_ref()).await;

    match sign_up(backend.as_ref(), &status, &form.email, &form.password).await {
        Ok(SignUpOutcome::SignedIn(signed_in)) => {
            Ok((signed_in.headers, Redirect::to(&admin_url("/"))).into_response())
        }
        Ok(SignUpOutcome::ConfirmationRequired) => Ok(login_page(LoginPage {
            email: form.email,
            notice: CONFIRMATION_NOTICE.to_string(),
            ..Default::default()
        })
        .await?
        .into_response()),
        Err(e) => login_error(true, form.email, e).await,
    }
}

pub(super) async fn signout(
    user: AuthUser,
    TypedHeader(cookies): TypedHeader<headers::Cookie>,
    Form(form): Form<CsrfField>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let headers = sign_out(backend().as_ref(), cookies)
        .await
        .into_response_error()?;
    tracing::info!("User {} signed out", user.id);
    Ok((headers, Redirect::to(&admin_url("/"))).into_response())
}

// Dashboard

pub(super) enum Editor {
    Closed,
    New,
    Edit(String),
    /// A submitted form that failed to save, shown again as typed
    Resubmit(FormView),
}

#[derive(Debug)]
struct TabView {
    label: &'static str,
    url: String,
    active: bool,
}

/// One record in a dashboard list
#[derive(Debug, Default)]
struct RowView {
    title: String,
    subtitle: String,
    detail: String,
    badges: Vec<String>,
    edit_url: String,
    delete_action: String,
}

#[derive(Template)]
#[template(path = "admin_dashboard.j2", escape = "html")]
struct DashboardTemplate {
    site_name: String,
    admin_url: String,
    signout_action: String,
    csrf_token: String,
    user_email: String,
    tabs: Vec<TabView>,
    heading: &'static str,
    is_profile: bool,
    profile: Option<ProfileView>,
    open_form_url: String,
    open_form_label: String,
    rows: Vec<RowView>,
    form: Option<FormView>,
    cancel_url: String,
    alert: String,
    notice: String,
}

fn tab_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Profile => "Profile",
        RecordKind::Project => "Projects",
        RecordKind::BlogPost => "Blog",
        RecordKind::Technology => "Technologies",
        RecordKind::Experience => "Experience",
    }
}

fn heading(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::BlogPost => "Blog Posts",
        other => tab_label(other),
    }
}

fn open_form_label(kind: RecordKind, has_profile: bool) -> &'static str {
    match kind {
        RecordKind::Profile if has_profile => "Edit Profile",
        RecordKind::Profile => "Create Profile",
        RecordKind::Project => "Add Project",
        RecordKind::BlogPost => "Add Post",
        RecordKind::Technology => "Add Technology",
        RecordKind::Experience => "Add Experience",
    }
}

fn edit_url(kind: RecordKind, id: &str) -> String {
    format!(
        "{}&edit={}",
        dashboard_url(kind.slug(), None),
        urlencoding::encode(id)
    )
}

fn delete_action(kind: RecordKind, id: &str) -> String {
    admin_url(&format!("/{}/{}/delete", kind.slug(), urlencoding::encode(id)))
}

fn row(kind: RecordKind, id: &str) -> RowView {
    RowView {
        edit_url: edit_url(kind, id),
        delete_action: delete_action(kind, id),
        ..Default::default()
    }
}

fn rows(kind: RecordKind, data: &Dashboard) -> Vec<RowView> {
    match kind {
        RecordKind::Profile => Vec::new(),
        RecordKind::Project => data
            .projects
            .iter()
            .map(|p| {
                let mut badges = p.technologies.clone();
                if p.featured {
                    badges.push("Featured".to_string());
                }
                badges.push(p.status.label().to_string());
                RowView {
                    title: p.title.clone(),
                    subtitle: p.description.clone().unwrap_or_default(),
                    badges,
                    ..row(kind, &p.id)
                }
            })
            .collect(),
        RecordKind::BlogPost => data
            .blog_posts
            .iter()
            .map(|post| {
                let state = if post.published { "Published" } else { "Draft" };
                RowView {
                    title: post.title.clone(),
                    subtitle: post.excerpt.clone().unwrap_or_default(),
                    badges: std::iter::once(state.to_string())
                        .chain(post.tags.iter().cloned())
                        .collect(),
                    ..row(kind, &post.id)
                }
            })
            .collect(),
        RecordKind::Technology => data
            .technologies
            .iter()
            .map(|tech| RowView {
                title: tech.name.clone(),
                subtitle: tech.category.clone().unwrap_or_default(),
                detail: format!("Proficiency: {}/5", tech.level()),
                ..row(kind, &tech.id)
            })
            .collect(),
        RecordKind::Experience => data
            .experiences
            .iter()
            .map(|exp| {
                let subtitle = match exp.location.as_deref().filter(|l| !l.is_empty()) {
                    Some(location) => format!("{}, {}", exp.company, location),
                    None => exp.company.clone(),
                };
                RowView {
                    title: exp.position.clone(),
                    subtitle,
                    detail: exp.period(),
                    badges: vec![if exp.current { "Current" } else { "Past" }.to_string()],
                    ..row(kind, &exp.id)
                }
            })
            .collect(),
    }
}

fn record_form<R, F>(
    records: &[R],
    editor: &Editor,
    id_of: impl Fn(&R) -> &str,
) -> Option<FormView>
where
    F: EditorForm + Default + for<'a> From<&'a R>,
{
    match editor {
        Editor::New => Some(F::default().view()),
        Editor::Edit(id) => {
            let found = records.iter().find(|r| id_of(r) == id.as_str());
            if found.is_none() {
                tracing::debug!("No record {} to edit", id);
            }
            found.map(|r| F::from(r).view())
        }
        Editor::Closed | Editor::Resubmit(_) => None,
    }
}

fn open_editor(kind: RecordKind, data: &Dashboard, editor: Editor) -> Option<FormView> {
    let editor = match editor {
        Editor::Closed => return None,
        Editor::Resubmit(view) => return Some(view),
        requested => requested,
    };
    match kind {
        RecordKind::Profile => Some(
            data.profile
                .as_ref()
                .map(ProfileForm::from)
                .unwrap_or_default()
                .view(),
        ),
        RecordKind::Project => {
            record_form::<_, ProjectForm>(&data.projects, &editor, |p| p.id.as_str())
        }
        RecordKind::BlogPost => {
            record_form::<_, BlogPostForm>(&data.blog_posts, &editor, |p| p.id.as_str())
        }
        RecordKind::Technology => {
            record_form::<_, TechnologyForm>(&data.technologies, &editor, |t| t.id.as_str())
        }
        RecordKind::Experience => {
            record_form::<_, ExperienceForm>(&data.experiences, &editor, |e| e.id.as_str())
        }
    }
}

pub(super) async fn dashboard(
    user: &AuthUser,
    kind: RecordKind,
    editor: Editor,
    alert: Option<String>,
    notice: Option<String>,
) -> Result<Html<String>, (StatusCode, String)> {
    let data = load_dashboard(backend().as_ref(), &SessionUser::from(user)).await;

    let tabs = RecordKind::ALL
        .iter()
        .map(|k| TabView {
            label: tab_label(*k),
            url: dashboard_url(k.slug(), None),
            active: *k == kind,
        })
        .collect();

    render(&DashboardTemplate {
        site_name: FOLIO_SITE_NAME.to_string(),
        admin_url: admin_url("/"),
        signout_action: admin_url("/signout"),
        csrf_token: user.csrf_token.clone(),
        user_email: user.email.clone(),
        tabs,
        heading: heading(kind),
        is_profile: kind == RecordKind::Profile,
        profile: data.profile.as_ref().map(ProfileView::from),
        open_form_url: format!("{}&form=new", dashboard_url(kind.slug(), None)),
        open_form_label: open_form_label(kind, data.profile.is_some()).to_string(),
        rows: rows(kind, &data),
        form: open_editor(kind, &data, editor),
        cancel_url: dashboard_url(kind.slug(), None),
        alert: alert.unwrap_or_default(),
        notice: notice.unwrap_or_default(),
    })
}

// Record handlers

async fn finish_save<R, F: EditorForm>(
    user: &AuthUser,
    form: &F,
    result: Result<R, CoordinationError>,
) -> Result<Response, (StatusCode, String)> {
    match result {
        Ok(_) => {
            let notice = format!("Saved {}", F::KIND.label());
            Ok(Redirect::to(&dashboard_url(F::KIND.slug(), Some(&notice))).into_response())
        }
        Err(e) => {
            let status = status_of(&e);
            let html = dashboard(
                user,
                F::KIND,
                Editor::Resubmit(form.view()),
                Some(e.to_string()),
                None,
            )
            .await?;
            Ok((status, html).into_response())
        }
    }
}

pub(super) async fn post_profile(
    user: AuthUser,
    Form(form): Form<CsrfForm<ProfileForm>>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let result = save_profile(backend().as_ref(), &SessionUser::from(&user), &form.fields).await;
    finish_save(&user, &form.fields, result).await
}

pub(super) async fn post_project(
    user: AuthUser,
    Form(form): Form<CsrfForm<ProjectForm>>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let result = save_project(backend().as_ref(), &SessionUser::from(&user), &form.fields).await;
    finish_save(&user, &form.fields, result).await
}

pub(super) async fn post_blog_post(
    user: AuthUser,
    Form(form): Form<CsrfForm<BlogPostForm>>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let result =
        save_blog_post(backend().as_ref(), &SessionUser::from(&user), &form.fields).await;
    finish_save(&user, &form.fields, result).await
}

pub(super) async fn post_technology(
    user: AuthUser,
    Form(form): Form<CsrfForm<TechnologyForm>>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let result =
        save_technology(backend().as_ref(), &SessionUser::from(&user), &form.fields).await;
    finish_save(&user, &form.fields, result).await
}

pub(super) async fn post_experience(
    user: AuthUser,
    Form(form): Form<CsrfForm<ExperienceForm>>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let result =
        save_experience(backend().as_ref(), &SessionUser::from(&user), &form.fields).await;
    finish_save(&user, &form.fields, result).await
}

pub(super) async fn post_delete(
    user: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    Form(form): Form<CsrfField>,
) -> Result<Response, (StatusCode, String)> {
    user.verify_form_csrf(&form.csrf_token)?;
    let kind = match kind.parse::<RecordKind>() {
        Ok(RecordKind::Profile) => {
            // The profile is what keeps registration closed
            return Err((
                StatusCode::BAD_REQUEST,
                "The profile cannot be deleted".to_string(),
            ));
        }
        Ok(kind) => kind,
        Err(_) => return Err((StatusCode::NOT_FOUND, format!("Unknown record kind: {kind}"))),
    };

    match delete_record(backend().as_ref(), &SessionUser::from(&user), kind, &id).await {
        Ok(()) => {
            let notice = format!("Deleted {}", kind.label());
            Ok(Redirect::to(&dashboard_url(kind.slug(), Some(&notice))).into_response())
        }
        Err(e) => {
            let status = status_of(&e);
            let html = dashboard(&user, kind, Editor::Closed, Some(e.to_string()), None).await?;
            Ok((status, html).into_response())
        }
    }
}
