use maud::{DOCTYPE, Markup, html};

use crate::{
    csrf,
    entities::movie,
    forms::FieldErrors,
    tmdb::{SearchPage, SearchResult},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON_CLASS: &str =
    "w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

pub fn index_page(movies: &[movie::Model]) -> String {
    page(
        "My Top Movies",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-12" {
                    div class="flex items-start justify-between gap-6" {
                        div {
                            h1 class="text-3xl font-bold text-gray-900" { "My Top Movies" }
                            p class="mt-2 text-gray-600" { "These are my all-time favourite movies." }
                        }
                        a class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" href="/add" { "Add Movie" }
                    }

                    @if movies.is_empty() {
                        div class="mt-10 bg-white shadow rounded-lg p-8" {
                            p class="text-gray-600" { "No movies yet. Add one to start your list." }
                        }
                    } @else {
                        div class="mt-10 space-y-4" {
                            @for m in movies {
                                (movie_card(m))
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn edit_page(
    movie: &movie::Model,
    rating: &str,
    review: &str,
    errors: &FieldErrors,
    csrf_token: &str,
) -> String {
    page(
        "Edit Movie",
        narrow(html! {
            h1 class="text-3xl font-bold text-gray-900" { (movie.title) }
            p class="mt-2 text-gray-600" { "Edit Movie Rating" }

            form class="mt-8 space-y-6" method="post" action=(format!("/edit?id={}", movie.id)) {
                (csrf_field(csrf_token, errors))
                (text_field("rating", "Rating Out of 10 e.g. 7.5", rating, errors))
                (text_field("review", "Review", review, errors))
                button class=(BUTTON_CLASS) type="submit" { "Submit" }
            }
        }),
    )
}

pub fn add_page(title: &str, errors: &FieldErrors, csrf_token: &str) -> String {
    page(
        "Add Movie",
        narrow(html! {
            h1 class="text-3xl font-bold text-gray-900" { "Add a Movie" }

            form class="mt-8 space-y-6" method="post" action="/add" {
                (csrf_field(csrf_token, errors))
                (text_field("title", "Movie Title", title, errors))
                button class=(BUTTON_CLASS) type="submit" { "Add Movie" }
            }
        }),
    )
}

pub fn select_page(title: &str, results: &SearchPage) -> String {
    let current = results.page;

    page(
        "Select Movie",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-2xl mx-auto px-6 py-12" {
                    div class="flex items-start justify-between gap-6" {
                        div {
                            h1 class="text-3xl font-bold text-gray-900" { "Select Movie" }
                            p class="mt-2 text-gray-600" {
                                (results.total_results) " results for “" (title) "”"
                            }
                        }
                        a class="text-sm text-blue-600 hover:text-blue-800" href="/add" { "New search" }
                    }

                    @if results.results.is_empty() {
                        div class="mt-10 bg-white shadow rounded-lg p-8" {
                            p class="text-gray-600" { "No matching movies found." }
                        }
                    } @else {
                        ul class="mt-10 divide-y divide-gray-200 bg-white shadow rounded-lg" {
                            @for result in &results.results {
                                (search_result(result))
                            }
                        }
                    }

                    @if results.total_pages > 1 {
                        nav class="mt-6 flex items-center justify-between text-sm" {
                            @if current > 1 {
                                a class="text-blue-600 hover:text-blue-800" href=(select_url(title, current - 1)) { "← Previous" }
                            } @else {
                                span {}
                            }
                            span class="text-gray-500" { "Page " (current) " of " (results.total_pages) }
                            @if current < results.total_pages {
                                a class="text-blue-600 hover:text-blue-800" href=(select_url(title, current + 1)) { "Next →" }
                            } @else {
                                span {}
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn not_found_page() -> String {
    message_page("Not Found", "That movie is not on the list.")
}

pub fn error_page(message: String) -> String {
    message_page("Error", &message)
}

pub fn select_url(title: &str, page: u32) -> String {
    format!("/select?page={page}&title={}", urlencoding::encode(title))
}

fn message_page(heading: &str, message: &str) -> String {
    page(
        heading,
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { (heading) }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn narrow(inner: Markup) -> Markup {
    html! {
        div class="min-h-screen bg-gray-50" {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" { (inner) }
            }
        }
    }
}

fn csrf_field(token: &str, errors: &FieldErrors) -> Markup {
    html! {
        input type="hidden" name=(csrf::FIELD) value=(token);
        @if let Some(message) = errors.get(csrf::FIELD) {
            p class="text-sm text-red-600" { (message) }
        }
    }
}

fn text_field(name: &str, label: &str, value: &str, errors: &FieldErrors) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            input class=(INPUT_CLASS) name=(name) id=(name) value=(value) required;
            @if let Some(message) = errors.get(name) {
                p class="mt-2 text-sm text-red-600" { (message) }
            }
        }
    }
}

fn movie_card(m: &movie::Model) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex gap-6" {
            @if m.img_url.is_empty() {
                div class="h-48 w-32 flex-none rounded bg-gray-200" {}
            } @else {
                img class="h-48 w-32 flex-none rounded object-cover" src=(m.img_url) alt=(m.title);
            }
            div class="flex-1" {
                div class="flex items-start justify-between gap-4" {
                    h2 class="text-xl font-semibold text-gray-900" {
                        @if let Some(ranking) = m.ranking {
                            span class="mr-2 text-gray-400" { (ranking) "." }
                        }
                        (m.title)
                        span class="ml-2 font-normal text-gray-500" { "(" (m.year) ")" }
                    }
                    @if let Some(rating) = m.rating {
                        span class="text-lg font-semibold text-amber-500" { (format!("{rating:.1}")) }
                    }
                }
                @if let Some(review) = &m.review {
                    p class="mt-2 italic text-gray-700" { "“" (review) "”" }
                }
                p class="mt-3 text-sm text-gray-600" { (m.description) }
                div class="mt-4 flex gap-4 text-sm" {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("/edit?id={}", m.id)) { "Update" }
                    a class="text-red-600 hover:text-red-800" href=(format!("/delete?id={}", m.id)) { "Delete" }
                }
            }
        }
    }
}

fn search_result(result: &SearchResult) -> Markup {
    html! {
        li class="p-4" {
            a class="text-blue-600 hover:text-blue-800" href=(format!("/find?id={}", result.id)) {
                (result.title)
                @if let Some(year) = result.year() {
                    span class="ml-2 text-gray-500" { "- " (year) }
                }
            }
            @if let Some(overview) = result.overview.as_deref().filter(|o| !o.is_empty()) {
                p class="mt-1 text-sm text-gray-600 line-clamp-2" { (overview) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_url_encodes_title() {
        assert_eq!(select_url("Dune: Part Two", 1), "/select?page=1&title=Dune%3A%20Part%20Two");
    }

    #[test]
    fn markup_escapes_user_text() {
        let html = add_page("<script>", &FieldErrors::default(), "tok");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("value=\"<script>\""));
    }

    #[test]
    fn field_errors_render_next_to_fields() {
        let mut errors = FieldErrors::default();
        errors.insert("title", "This field is required.");
        let html = add_page("", &errors, "tok");
        assert!(html.contains("This field is required."));
        assert!(html.contains(r#"name="csrf_token" value="tok""#));
    }
}
