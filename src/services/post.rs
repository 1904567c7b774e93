use crate::{
    error::{AppError, AppResult},
    models::{like, post, saved_post, user, Like, Post, PostModel, SavedPost, User},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Statement,
};
use std::collections::HashMap;

/// A post together with its resolved owner and `liked_by` set.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostModel,
    pub username: String,
    pub liked_by: Vec<i32>,
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a post referencing an already-stored image.
    pub async fn create_post(
        &self,
        user_id: i32,
        title: &str,
        image_url: &str,
    ) -> AppResult<PostDetail> {
        let owner = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Unknown user".to_string()))?;

        let now = chrono::Utc::now().naive_utc();
        let new_post = post::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            title: ActiveValue::Set(title.to_string()),
            image_url: ActiveValue::Set(image_url.to_string()),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };

        let post = new_post.insert(&self.db).await?;
        Ok(PostDetail {
            post,
            username: owner.username,
            liked_by: vec![],
        })
    }

    /// All posts, newest first, with owner usernames and like sets resolved.
    pub async fn list_posts(&self) -> AppResult<Vec<PostDetail>> {
        let posts = Post::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await?;

        if posts.is_empty() {
            return Ok(vec![]);
        }

        let user_ids: Vec<i32> = posts.iter().map(|p| p.user_id).collect();
        let usernames: HashMap<i32, String> = User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
        let mut likes_by_post: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in Like::find()
            .filter(like::Column::PostId.is_in(post_ids))
            .all(&self.db)
            .await?
        {
            likes_by_post.entry(row.post_id).or_default().push(row.user_id);
        }

        Ok(posts
            .into_iter()
            .map(|p| {
                let username = usernames.get(&p.user_id).cloned().unwrap_or_default();
                let liked_by = likes_by_post.remove(&p.id).unwrap_or_default();
                PostDetail {
                    post: p,
                    username,
                    liked_by,
                }
            })
            .collect())
    }

    /// Toggle `user_id`'s membership in a post's like set. Each row is its
    /// own atomic insert/delete, so concurrent toggles by different users
    /// cannot overwrite each other.
    pub async fn toggle_like(&self, user_id: i32, post_id: i32) -> AppResult<PostDetail> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let existing = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            Like::delete_many()
                .filter(like::Column::UserId.eq(user_id))
                .filter(like::Column::PostId.eq(post_id))
                .exec(&self.db)
                .await?;
        } else {
            self.db
                .execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "INSERT INTO likes (user_id, post_id, created_at)
                     VALUES ($1, $2, NOW())
                     ON CONFLICT (user_id, post_id) DO NOTHING",
                    vec![user_id.into(), post_id.into()],
                ))
                .await?;
        }

        let liked_by: Vec<i32> = Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|l| l.user_id)
            .collect();

        let username = User::find_by_id(post.user_id)
            .one(&self.db)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        Ok(PostDetail {
            post,
            username,
            liked_by,
        })
    }

    /// Toggle a post in the user's saved set. Returns the user's saved post
    /// ids after the toggle.
    pub async fn toggle_save(&self, user_id: i32, post_id: i32) -> AppResult<Vec<i32>> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let existing = SavedPost::find()
            .filter(saved_post::Column::UserId.eq(user_id))
            .filter(saved_post::Column::PostId.eq(post_id))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            SavedPost::delete_many()
                .filter(saved_post::Column::UserId.eq(user_id))
                .filter(saved_post::Column::PostId.eq(post_id))
                .exec(&self.db)
                .await?;
        } else {
            self.db
                .execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "INSERT INTO saved_posts (user_id, post_id, created_at)
                     VALUES ($1, $2, NOW())
                     ON CONFLICT (user_id, post_id) DO NOTHING",
                    vec![user_id.into(), post_id.into()],
                ))
                .await?;
        }

        let saved: Vec<i32> = SavedPost::find()
            .filter(saved_post::Column::UserId.eq(user_id))
            .order_by_desc(saved_post::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| s.post_id)
            .collect();

        Ok(saved)
    }
}
