//! Types related to posts.

use std::convert::TryInto;

use chrono::offset::Utc;
use chrono::DateTime;

use diesel::{insert_into, prelude::*, update};

use serde::Serialize;

use crate::models::{Database, PostId, TopicId, UserId};
use crate::schema::post;
use crate::{Error, Result};

/// A user-made post.
#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Post {
    /// The ID of the post.
    pub id: PostId,
    /// The topic that this post belongs to.
    pub topic_id: TopicId,
    /// The contents of the post.
    pub message: String,
    /// The user that made the post.
    pub created_by: UserId,
    /// When the post was created. Immutable.
    pub created_at: DateTime<Utc>,
    /// When the post was last edited, if ever.
    pub updated_at: Option<DateTime<Utc>>,
    /// The user that last edited the post, if any.
    pub updated_by: Option<UserId>,
}

/// A new post to be inserted in the store. See `Post` for descriptions of
/// the fields.
#[derive(Debug, Insertable)]
#[diesel(table_name = post)]
pub struct NewPost<'a> {
    pub message: &'a str,
    pub topic: TopicId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a post.
fn conv_post_error(
    post_id: PostId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::PostNotFound { post_id },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get a post.
    pub fn post(&self, post_id: PostId) -> Result<Post> {
        use crate::schema::post::columns::id;
        use crate::schema::post::dsl::post;

        post.filter(id.eq(post_id))
            .limit(1)
            .first(&mut self.pool.get()?)
            .map_err(conv_post_error(post_id))
    }

    /// Insert a new post.
    pub fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        use crate::schema::post::dsl::post;

        Ok(insert_into(post)
            .values(&new_post)
            .get_result(&mut self.pool.get()?)?)
    }

    /// Get all of the posts in a topic, in creation order.
    pub fn posts_in_topic(&self, topic_id: TopicId) -> Result<Vec<Post>> {
        use crate::schema::post::columns::{id, topic};
        use crate::schema::post::dsl::post;

        Ok(post
            .filter(topic.eq(topic_id))
            .order(id.asc())
            .load(&mut self.pool.get()?)?)
    }

    /// Get the number of posts in a topic.
    pub fn topic_post_count(&self, topic_id: TopicId) -> Result<u32> {
        use crate::schema::post::columns::topic;
        use crate::schema::post::dsl::post;

        let count: i64 = post
            .filter(topic.eq(topic_id))
            .count()
            .first(&mut self.pool.get()?)?;

        Ok(count.try_into().expect("couldn't convert i64 to u32"))
    }

    /// Rewrite a post's message, stamping when and by whom it was edited.
    pub fn update_post(
        &self,
        post_id: PostId,
        new_message: &str,
        editor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Post> {
        use crate::schema::post::columns::{
            id, message, updated_at, updated_by,
        };
        use crate::schema::post::dsl::post;

        update(post.filter(id.eq(post_id)))
            .set((
                message.eq(new_message),
                updated_at.eq(Some(at)),
                updated_by.eq(Some(editor)),
            ))
            .get_result(&mut self.pool.get()?)
            .map_err(conv_post_error(post_id))
    }

    /// Get the number of posts in the store.
    pub fn num_posts(&self) -> Result<i64> {
        use crate::schema::post::dsl::post;

        Ok(post.count().first(&mut self.pool.get()?)?)
    }
}
