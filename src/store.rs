use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

use crate::{entities::movie, error::AppResult};

/// Fields for a movie that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub description: String,
    pub img_url: String,
}

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_by_rating(&self) -> AppResult<Vec<movie::Model>> {
        let movies =
            movie::Entity::find().order_by_asc(movie::Column::Rating).all(&self.db).await?;
        Ok(movies)
    }

    pub async fn get(&self, id: i32) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn insert(&self, new: NewMovie) -> AppResult<movie::Model> {
        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(new.title),
            year: Set(new.year),
            description: Set(new.description),
            rating: Set(None),
            ranking: Set(None),
            review: Set(None),
            img_url: Set(new.img_url),
        };
        let saved = model.insert(&self.db).await?;
        tracing::debug!(id = saved.id, title = %saved.title, "movie inserted");
        Ok(saved)
    }

    /// Overwrites rating and review. `None` when no movie has this id.
    pub async fn update_review(
        &self,
        id: i32,
        rating: f64,
        review: String,
    ) -> AppResult<Option<movie::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        model.rating = Set(Some(rating));
        model.review = Set(Some(review));
        let updated = model.update(&self.db).await?;
        tracing::debug!(id, rating, "movie review updated");
        Ok(Some(updated))
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

/// Annotates movies, already in ascending rating order, with their display ranking.
/// The first (lowest rated) gets `len`, the last gets 1.
pub fn assign_rankings(movies: &mut [movie::Model]) {
    let total = movies.len();
    for (index, movie) in movies.iter_mut().enumerate() {
        movie.ranking = Some((total - index) as i32);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn memory_store() -> MovieStore {
        let db = crate::db::connect_and_migrate("sqlite::memory:").await.unwrap();
        MovieStore::new(db)
    }

    pub(crate) fn new_movie(title: &str) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            year: 2002,
            description: format!("{title} description"),
            img_url: format!("https://image.tmdb.org/t/p/w500/{title}.jpg"),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_leaves_review_unset() {
        let store = memory_store().await;
        let movie = store.insert(new_movie("Phone Booth")).await.unwrap();

        assert!(movie.id > 0);
        assert_eq!(movie.title, "Phone Booth");
        assert_eq!(movie.rating, None);
        assert_eq!(movie.review, None);
        assert_eq!(movie.ranking, None);
        assert_eq!(store.get(movie.id).await.unwrap(), Some(movie));
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected_and_store_unchanged() {
        let store = memory_store().await;
        store.insert(new_movie("Phone Booth")).await.unwrap();

        let mut dup = new_movie("Phone Booth");
        dup.year = 1999;
        assert!(store.insert(dup).await.is_err());

        let all = store.list_by_rating().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].year, 2002);
    }

    #[tokio::test]
    async fn update_review_touches_only_rating_and_review() {
        let store = memory_store().await;
        let before = store.insert(new_movie("Avatar")).await.unwrap();

        let after =
            store.update_review(before.id, 8.1, "Great".to_string()).await.unwrap().unwrap();

        assert_eq!(after.rating, Some(8.1));
        assert_eq!(after.review.as_deref(), Some("Great"));
        assert_eq!(
            movie::Model { rating: None, review: None, ..after.clone() },
            before
        );
        assert_eq!(store.get(before.id).await.unwrap(), Some(after));
    }

    #[tokio::test]
    async fn update_review_of_missing_id_is_none() {
        let store = memory_store().await;
        assert_eq!(store.update_review(42, 5.0, "x".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let store = memory_store().await;
        let keep = store.insert(new_movie("Keep")).await.unwrap();
        let gone = store.insert(new_movie("Gone")).await.unwrap();

        assert!(store.delete(gone.id).await.unwrap());
        assert!(!store.delete(gone.id).await.unwrap());

        assert_eq!(store.list_by_rating().await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn list_orders_by_rating_with_unrated_first() {
        let store = memory_store().await;
        for (title, rating) in [("B", Some(9.0)), ("A", Some(6.5)), ("C", None)] {
            let m = store.insert(new_movie(title)).await.unwrap();
            if let Some(r) = rating {
                store.update_review(m.id, r, "ok".to_string()).await.unwrap();
            }
        }

        let titles: Vec<_> =
            store.list_by_rating().await.unwrap().into_iter().map(|m| m.title).collect();
        assert_eq!(titles, ["C", "A", "B"]);
    }

    #[test]
    fn rankings_count_down_from_len() {
        let base = movie::Model {
            id: 0,
            title: String::new(),
            year: 2000,
            description: String::new(),
            rating: None,
            ranking: None,
            review: None,
            img_url: String::new(),
        };
        let mut movies: Vec<_> =
            (1..=4).map(|id| movie::Model { id, ..base.clone() }).collect();

        assign_rankings(&mut movies);

        let rankings: Vec<_> = movies.iter().map(|m| m.ranking).collect();
        assert_eq!(rankings, [Some(4), Some(3), Some(2), Some(1)]);

        assign_rankings(&mut []);
    }
}
