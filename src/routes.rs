use axum::{
    Router,
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use tracing::info;

use crate::{
    AppState, csrf,
    error::{AppError, AppResult},
    forms::{AddForm, EditForm, FieldErrors},
    store::assign_rankings,
    templates,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/edit", get(edit_form).post(edit_submit))
        .route("/delete", get(delete))
        .route("/add", get(add_form).post(add_submit))
        .route("/select", get(select))
        .route("/find", get(find))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    id: i32,
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    title: String,
    #[serde(default)]
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    id: i64,
}

pub async fn home(State(state): State<AppState>) -> AppResult<Html<String>> {
    let mut movies = state.store.list_by_rating().await?;
    // Display only; these models are dropped after rendering.
    assign_rankings(&mut movies);
    Ok(Html(templates::index_page(&movies)))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let movie = state.store.get(q.id).await?.ok_or(AppError::NotFound)?;
    let rating = movie.rating.map(|r| r.to_string()).unwrap_or_default();
    let review = movie.review.clone().unwrap_or_default();

    let (jar, token) = csrf::issue(jar);
    let body = templates::edit_page(&movie, &rating, &review, &FieldErrors::default(), &token);
    Ok((jar, Html(body)))
}

pub async fn edit_submit(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
    jar: SignedCookieJar,
    Form(form): Form<EditForm>,
) -> AppResult<Response> {
    match with_csrf(&jar, &form.csrf_token, form.validate()) {
        Ok(valid) => {
            state
                .store
                .update_review(q.id, valid.rating, valid.review)
                .await?
                .ok_or(AppError::NotFound)?;
            info!(id = q.id, "movie rating updated");
            Ok((csrf::consume(jar), Redirect::to("/")).into_response())
        },
        Err(errors) => {
            let movie = state.store.get(q.id).await?.ok_or(AppError::NotFound)?;
            let (jar, token) = csrf::issue(jar);
            let body = templates::edit_page(&movie, &form.rating, &form.review, &errors, &token);
            Ok((jar, Html(body)).into_response())
        },
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
) -> AppResult<Redirect> {
    if !state.store.delete(q.id).await? {
        return Err(AppError::NotFound);
    }
    info!(id = q.id, "movie deleted");
    Ok(Redirect::to("/"))
}

pub async fn add_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, token) = csrf::issue(jar);
    (jar, Html(templates::add_page("", &FieldErrors::default(), &token)))
}

pub async fn add_submit(jar: SignedCookieJar, Form(form): Form<AddForm>) -> Response {
    match with_csrf(&jar, &form.csrf_token, form.validate()) {
        Ok(valid) => {
            let url = templates::select_url(&valid.title, 1);
            (csrf::consume(jar), Redirect::to(&url)).into_response()
        },
        Err(errors) => {
            let (jar, token) = csrf::issue(jar);
            (jar, Html(templates::add_page(&form.title, &errors, &token))).into_response()
        },
    }
}

pub async fn select(
    State(state): State<AppState>,
    Query(q): Query<SelectQuery>,
) -> AppResult<Html<String>> {
    let page = q.page.unwrap_or(1).max(1);
    let results = state.tmdb.search_movie(&q.title, page).await?;
    Ok(Html(templates::select_page(&q.title, &results)))
}

pub async fn find(
    State(state): State<AppState>,
    Query(q): Query<FindQuery>,
) -> AppResult<Redirect> {
    let details = state.tmdb.movie_details(q.id).await?;
    let new = details.into_new_movie(&state.config.tmdb_image_base_url)?;
    let movie = state.store.insert(new).await?;
    info!(id = movie.id, tmdb_id = q.id, title = %movie.title, "movie added");
    Ok(Redirect::to(&format!("/edit?id={}", movie.id)))
}

/// Folds a failed CSRF check into the form's field errors.
fn with_csrf<T>(
    jar: &SignedCookieJar,
    token: &str,
    validated: Result<T, FieldErrors>,
) -> Result<T, FieldErrors> {
    if csrf::verify(jar, token) {
        return validated;
    }
    let mut errors = validated.err().unwrap_or_default();
    errors.insert(csrf::FIELD, csrf::INVALID);
    Err(errors)
}
