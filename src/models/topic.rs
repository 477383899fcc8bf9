//! Types related to topics.

use chrono::offset::Utc;
use chrono::DateTime;

use diesel::sql_types::{Integer, Text, Timestamptz};
use diesel::{insert_into, prelude::*, sql_query};

use serde::Serialize;

use crate::models::{BoardId, Database, NewPost, TopicId, UserId};
use crate::schema::topic;
use crate::{Error, Result};

/// A series of posts about a specific subject.
#[derive(Debug, Clone, Queryable, QueryableByName, Serialize)]
#[diesel(table_name = topic)]
pub struct Topic {
    /// The ID of the topic.
    pub id: TopicId,
    /// The board that this topic was started on.
    #[diesel(column_name = board)]
    pub board_id: BoardId,
    /// The subject of the topic.
    pub subject: String,
    /// The user that started the topic.
    pub starter: UserId,
    /// When a post was last added to the topic.
    ///
    /// Monotonically non-decreasing; never earlier than the `created_at` of
    /// the most recently added post in the topic.
    pub last_updated: DateTime<Utc>,
    /// How many times the topic has been viewed.
    pub views: i32,
}

/// A topic annotated with its derived reply count, as shown in board
/// listings.
///
/// The reply count is the number of posts in the topic minus one; the first
/// post is the topic's opening message, not a reply. It is computed on read
/// rather than stored, so it can never drift from the true post count.
#[derive(Debug, Clone, QueryableByName, Serialize)]
pub struct TopicSummary {
    #[diesel(embed)]
    pub topic: Topic,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub replies: i64,
}

/// A new topic to be inserted in the store. See `Topic` for descriptions of
/// the fields.
#[derive(Debug, Insertable)]
#[diesel(table_name = topic)]
pub struct NewTopic<'a> {
    pub subject: &'a str,
    pub board: BoardId,
    pub starter: UserId,
    pub last_updated: DateTime<Utc>,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a topic.
fn conv_topic_error(
    topic_id: TopicId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::TopicNotFound { topic_id },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get a topic.
    pub fn topic(&self, topic_id: TopicId) -> Result<Topic> {
        use crate::schema::topic::columns::id;
        use crate::schema::topic::dsl::topic;

        topic
            .filter(id.eq(topic_id))
            .limit(1)
            .first(&mut self.pool.get()?)
            .map_err(conv_topic_error(topic_id))
    }

    /// Create a topic together with its opening post.
    ///
    /// The two inserts run in a single transaction; if the opening post
    /// can't be written the topic row is rolled back with it, so a topic
    /// without an opening post never becomes visible.
    pub fn create_topic(
        &self,
        new_topic: NewTopic,
        opening_message: &str,
    ) -> Result<Topic> {
        use crate::schema::post::dsl::post;
        use crate::schema::topic::dsl::topic;

        let mut conn = self.pool.get()?;

        conn.transaction::<Topic, Error, _>(|conn| {
            let created: Topic = insert_into(topic)
                .values(&new_topic)
                .get_result(conn)?;

            insert_into(post)
                .values(&NewPost {
                    message: opening_message,
                    topic: created.id,
                    created_by: created.starter,
                    created_at: created.last_updated,
                })
                .execute(conn)?;

            Ok(created)
        })
    }

    /// All topics of a board annotated with their reply counts, ordered by
    /// `last_updated` descending.
    ///
    /// Ties are broken by topic ID, newest first, so that pagination over
    /// the listing is deterministic.
    pub fn topic_summaries(
        &self,
        board_id: BoardId,
    ) -> Result<Vec<TopicSummary>> {
        let query = "SELECT T.id, T.board, T.subject, T.starter, \
                            T.last_updated, T.views, \
                            (SELECT COUNT(*) FROM post P \
                              WHERE P.topic = T.id) - 1 AS replies \
                       FROM topic T \
                      WHERE T.board = $1 \
                   ORDER BY T.last_updated DESC, T.id DESC";

        Ok(sql_query(query)
            .bind::<Integer, _>(board_id)
            .load(&mut self.pool.get()?)?)
    }

    /// Advance a topic's `last_updated` timestamp to `at`.
    ///
    /// The update is a single atomic statement scoped to the topic row, and
    /// it never moves the timestamp backwards, so concurrent replies can
    /// apply their touches in either order without losing the later one.
    pub fn touch_topic(
        &self,
        topic_id: TopicId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let query = "UPDATE topic \
                        SET last_updated = GREATEST(last_updated, $2) \
                      WHERE id = $1";

        let touched = sql_query(query)
            .bind::<Integer, _>(topic_id)
            .bind::<Timestamptz, _>(at)
            .execute(&mut self.pool.get()?)?;

        if touched == 0 {
            return Err(Error::TopicNotFound { topic_id });
        }

        Ok(())
    }

    /// Count a view of a topic, at most once per viewer token.
    ///
    /// Returns whether the view was counted.
    pub fn record_view(
        &self,
        topic_id: TopicId,
        viewer: &str,
    ) -> Result<bool> {
        use crate::schema::topic::columns::{id, views};
        use diesel::update;

        let mut conn = self.pool.get()?;

        conn.transaction::<bool, Error, _>(|conn| {
            let query = "INSERT INTO topic_view (topic, viewer) \
                         VALUES ($1, $2) \
                         ON CONFLICT DO NOTHING";

            let inserted = sql_query(query)
                .bind::<Integer, _>(topic_id)
                .bind::<Text, _>(viewer)
                .execute(conn)?;

            if inserted == 0 {
                return Ok(false);
            }

            update(crate::schema::topic::dsl::topic.filter(id.eq(topic_id)))
                .set(views.eq(views + 1))
                .execute(conn)
                .map_err(conv_topic_error(topic_id))?;

            Ok(true)
        })
    }

    /// Get the number of topics in the store.
    pub fn num_topics(&self) -> Result<i64> {
        use crate::schema::topic::dsl::topic;

        Ok(topic.count().first(&mut self.pool.get()?)?)
    }
}
