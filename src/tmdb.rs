use std::{num::NonZeroU32, sync::Arc};

use anyhow::Context;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::header::{ACCEPT, HeaderValue};
use serde::Deserialize;

use crate::{error::AppResult, store::NewMovie};

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("Using mock TMDB data - no TMDB_ACCESS_TOKEN provided");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, access_token, base_url, limiter }
    }

    fn is_mock(&self) -> bool {
        self.access_token.trim().is_empty()
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        self.client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    pub async fn search_movie(&self, title: &str, page: u32) -> AppResult<SearchPage> {
        if self.is_mock() {
            return Ok(mock::search(title, page));
        }

        self.limiter.until_ready().await;
        tracing::debug!(title, page, "searching TMDB");

        let page = page.to_string();
        let resp: SearchPage = self
            .get("/search/movie")
            .query(&[
                ("query", title),
                ("include_adult", "false"),
                ("language", "en-US"),
                ("page", page.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }

    pub async fn movie_details(&self, tmdb_id: i64) -> AppResult<MovieDetails> {
        if self.is_mock() {
            return mock::details(tmdb_id)
                .ok_or_else(|| anyhow::anyhow!("TMDB movie {tmdb_id} not found").into());
        }

        self.limiter.until_ready().await;
        tracing::debug!(tmdb_id, "fetching TMDB movie details");

        let resp: MovieDetails = self
            .get(&format!("/movie/{tmdb_id}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<SearchResult>,
    pub total_results: u32,
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

impl SearchResult {
    pub fn year(&self) -> Option<i32> {
        self.release_date.as_deref().and_then(release_year)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

impl MovieDetails {
    pub fn into_new_movie(self, image_base_url: &str) -> anyhow::Result<NewMovie> {
        let year = self
            .release_date
            .as_deref()
            .and_then(release_year)
            .with_context(|| format!("TMDB has no usable release date for {:?}", self.title))?;

        let img_url = self
            .poster_path
            .map(|path| format!("{}{}", image_base_url.trim_end_matches('/'), path))
            .unwrap_or_default();

        Ok(NewMovie {
            title: self.title,
            year,
            description: self.overview.unwrap_or_default(),
            img_url,
        })
    }
}

/// `"2021-09-15"` -> `2021`.
fn release_year(date: &str) -> Option<i32> {
    date.split('-').next()?.trim().parse().ok()
}

mod mock {
    use super::{MovieDetails, SearchPage, SearchResult};

    const PAGE_SIZE: usize = 2;

    struct Entry {
        id: i64,
        title: &'static str,
        release_date: &'static str,
        overview: &'static str,
        poster_path: &'static str,
    }

    const CATALOG: &[Entry] = &[
        Entry {
            id: 438631,
            title: "Dune",
            release_date: "2021-09-15",
            overview: "Paul Atreides, a brilliant and gifted young man born into a great destiny beyond his understanding, must travel to the most dangerous planet in the universe to ensure the future of his family and his people.",
            poster_path: "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
        },
        Entry {
            id: 841,
            title: "Dune (1984)",
            release_date: "1984-12-14",
            overview: "In the year 10,191, the most precious substance in the universe is the spice Melange.",
            poster_path: "/a3nDwAnKAl0jsSmsGaZ0mAlPnn3.jpg",
        },
        Entry {
            id: 693134,
            title: "Dune: Part Two",
            release_date: "2024-02-27",
            overview: "Follow the mythic journey of Paul Atreides as he unites with Chani and the Fremen while on a path of revenge against the conspirators who destroyed his family.",
            poster_path: "/1pdfLvkbY9ohJlCjQH2CZjjYVvJ.jpg",
        },
        Entry {
            id: 1817,
            title: "Phone Booth",
            release_date: "2002-11-14",
            overview: "Publicist Stuart Shepard finds himself trapped in a phone booth, pinned down by an extortionist's sniper rifle.",
            poster_path: "/tjrX2oWRCM3Tvarz38zlZM7Uc10.jpg",
        },
    ];

    pub(super) fn search(title: &str, page: u32) -> SearchPage {
        let needle = title.trim().to_lowercase();
        let hits: Vec<&Entry> =
            CATALOG.iter().filter(|e| e.title.to_lowercase().contains(&needle)).collect();

        let total_pages = hits.len().div_ceil(PAGE_SIZE);
        let page = page.max(1);
        let results = hits
            .iter()
            .skip((page as usize - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .map(|e| SearchResult {
                id: e.id,
                title: e.title.to_string(),
                release_date: Some(e.release_date.to_string()),
                overview: Some(e.overview.to_string()),
            })
            .collect();

        SearchPage {
            page,
            results,
            total_results: hits.len() as u32,
            total_pages: total_pages as u32,
        }
    }

    pub(super) fn details(id: i64) -> Option<MovieDetails> {
        CATALOG.iter().find(|e| e.id == id).map(|e| MovieDetails {
            title: e.title.to_string(),
            poster_path: Some(e.poster_path.to_string()),
            release_date: Some(e.release_date.to_string()),
            overview: Some(e.overview.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::json;

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

    async fn fake_tmdb(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();

        let app = Router::new()
            .route(
                "/search/movie",
                get(
                    |State((seen, status)): State<(Seen, StatusCode)>,
                     headers: HeaderMap,
                     Query(q): Query<Vec<(String, String)>>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let query =
                            q.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
                        seen.lock().unwrap().push((query, auth));
                        (
                            status,
                            Json(json!({
                                "page": 2,
                                "results": [{
                                    "id": 438631,
                                    "title": "Dune",
                                    "release_date": "2021-09-15",
                                    "overview": "Spice.",
                                    "poster_path": "/dune.jpg"
                                }],
                                "total_results": 21,
                                "total_pages": 2
                            })),
                        )
                    },
                ),
            )
            .route(
                "/movie/{id}",
                get(
                    |State((_, status)): State<(Seen, StatusCode)>, Path(id): Path<i64>| async move {
                        (
                            status,
                            Json(json!({
                                "id": id,
                                "title": "Dune",
                                "poster_path": "/dune.jpg",
                                "release_date": "2021-09-15",
                                "overview": "Spice."
                            })),
                        )
                    },
                ),
            )
            .with_state((seen.clone(), status));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        (format!("http://{addr}"), seen)
    }

    fn client(base_url: String, token: &str) -> TmdbClient {
        TmdbClient::new(reqwest::Client::new(), token.to_string(), base_url, 50)
    }

    #[tokio::test]
    async fn search_sends_filters_and_bearer_token() {
        let (base, seen) = fake_tmdb(StatusCode::OK).await;
        let tmdb = client(base, "secret-token");

        let page = tmdb.search_movie("Dune", 2).await.unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.total_results, 21);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.results[0].id, 438631);
        assert_eq!(page.results[0].year(), Some(2021));

        let seen = seen.lock().unwrap();
        let (query, auth) = &seen[0];
        assert_eq!(query, "query=Dune&include_adult=false&language=en-US&page=2");
        assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _) = fake_tmdb(StatusCode::UNAUTHORIZED).await;
        let tmdb = client(base, "bad-token");

        assert!(tmdb.search_movie("Dune", 1).await.is_err());
        assert!(tmdb.movie_details(438631).await.is_err());
    }

    #[tokio::test]
    async fn details_map_onto_a_new_movie() {
        let (base, _) = fake_tmdb(StatusCode::OK).await;
        let tmdb = client(base, "secret-token");

        let new = tmdb
            .movie_details(438631)
            .await
            .unwrap()
            .into_new_movie("https://image.tmdb.org/t/p/w500/")
            .unwrap();

        assert_eq!(
            new,
            NewMovie {
                title: "Dune".to_string(),
                year: 2021,
                description: "Spice.".to_string(),
                img_url: "https://image.tmdb.org/t/p/w500/dune.jpg".to_string(),
            }
        );
    }

    #[test]
    fn missing_release_date_cannot_become_a_movie() {
        let details = MovieDetails {
            title: "Untitled".to_string(),
            poster_path: None,
            release_date: Some(String::new()),
            overview: None,
        };
        assert!(details.into_new_movie("https://img").is_err());
    }

    #[test]
    fn missing_poster_leaves_img_url_empty() {
        let details = MovieDetails {
            title: "Untitled".to_string(),
            poster_path: None,
            release_date: Some("1999-03-31".to_string()),
            overview: None,
        };
        let new = details.into_new_movie("https://img").unwrap();
        assert_eq!(new.year, 1999);
        assert_eq!(new.img_url, "");
        assert_eq!(new.description, "");
    }

    #[tokio::test]
    async fn mock_mode_pages_through_catalog() {
        let tmdb = client("http://unused.invalid".to_string(), "");

        let first = tmdb.search_movie("dune", 1).await.unwrap();
        assert_eq!(first.total_results, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.results.len(), 2);

        let second = tmdb.search_movie("dune", 2).await.unwrap();
        assert_eq!(second.results.len(), 1);

        let details = tmdb.movie_details(second.results[0].id).await.unwrap();
        assert_eq!(details.title, second.results[0].title);
        assert!(tmdb.movie_details(-1).await.is_err());
    }
}
