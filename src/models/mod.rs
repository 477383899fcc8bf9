//! Models and types related to the entity store.

use std::fmt::Debug;

use chrono::offset::Utc;
use chrono::DateTime;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::{Error, Result};

pub mod board;
pub mod memory;
pub mod post;
pub mod topic;

pub use board::*;
pub use memory::MemoryStore;
pub use post::*;
pub use topic::*;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// A board ID.
pub type BoardId = i32;
/// A topic ID.
pub type TopicId = i32;
/// A post ID.
pub type PostId = i32;
/// A user-identity reference. User records themselves are owned by the
/// external identity provider; the store only keeps these references.
pub type UserId = i32;

/// The entity store contract consumed by the lifecycle operations.
///
/// Implementations must make `create_topic` all-or-nothing (a topic without
/// its opening post must never become visible) and `touch_topic` an atomic
/// per-topic read-modify-write, so that concurrent replies to the same topic
/// never lose a sibling's `last_updated` advance.
pub trait Store: Send + Sync {
    /// Get all boards.
    fn all_boards(&self) -> Result<Vec<Board>>;

    /// Get a board.
    fn board(&self, board_id: BoardId) -> Result<Board>;

    /// Insert a new board.
    fn insert_board(&self, new_board: NewBoard) -> Result<Board>;

    /// Get a topic.
    fn topic(&self, topic_id: TopicId) -> Result<Topic>;

    /// Create a topic together with its opening post, atomically.
    ///
    /// The opening post carries the topic's starter and creation timestamp.
    fn create_topic(
        &self,
        new_topic: NewTopic,
        opening_message: &str,
    ) -> Result<Topic>;

    /// All topics of a board annotated with their reply counts, ordered by
    /// `last_updated` descending (ties broken by ID, newest first).
    fn topic_summaries(&self, board_id: BoardId) -> Result<Vec<TopicSummary>>;

    /// Advance a topic's `last_updated` timestamp to `at`, atomically and
    /// never backwards.
    fn touch_topic(&self, topic_id: TopicId, at: DateTime<Utc>) -> Result<()>;

    /// Count a view of a topic, at most once per viewer token.
    ///
    /// Returns whether the view was counted.
    fn record_view(&self, topic_id: TopicId, viewer: &str) -> Result<bool>;

    /// Get a post.
    fn post(&self, post_id: PostId) -> Result<Post>;

    /// Insert a new post.
    fn insert_post(&self, new_post: NewPost) -> Result<Post>;

    /// Get all of the posts in a topic, in creation order.
    fn posts_in_topic(&self, topic_id: TopicId) -> Result<Vec<Post>>;

    /// Get the number of posts in a topic.
    fn topic_post_count(&self, topic_id: TopicId) -> Result<u32>;

    /// Rewrite a post's message, stamping when and by whom it was edited.
    fn update_post(
        &self,
        post_id: PostId,
        message: &str,
        editor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Post>;
}

/// A connection to the PostgreSQL store. Used for creating and retrieving
/// data.
pub struct Database {
    pub(crate) pool: Pool<ConnectionManager<PgConnection>>,
}

impl Debug for Database {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self.pool.state();

        write!(
            fmt,
            "<#Database connections={} idle_connections={}>",
            state.connections, state.idle_connections,
        )?;

        Ok(())
    }
}

impl Database {
    /// Open a connection to the database and run any pending migrations.
    pub fn open<S>(url: S) -> Result<Database>
    where
        S: AsRef<str>,
    {
        let pool =
            Pool::new(ConnectionManager::<PgConnection>::new(url.as_ref()))?;

        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS).map_err(|err| {
            Error::MigrationError {
                message: err.to_string(),
            }
        })?;

        Ok(Database { pool })
    }
}

impl Store for Database {
    fn all_boards(&self) -> Result<Vec<Board>> {
        Database::all_boards(self)
    }

    fn board(&self, board_id: BoardId) -> Result<Board> {
        Database::board(self, board_id)
    }

    fn insert_board(&self, new_board: NewBoard) -> Result<Board> {
        Database::insert_board(self, new_board)
    }

    fn topic(&self, topic_id: TopicId) -> Result<Topic> {
        Database::topic(self, topic_id)
    }

    fn create_topic(
        &self,
        new_topic: NewTopic,
        opening_message: &str,
    ) -> Result<Topic> {
        Database::create_topic(self, new_topic, opening_message)
    }

    fn topic_summaries(&self, board_id: BoardId) -> Result<Vec<TopicSummary>> {
        Database::topic_summaries(self, board_id)
    }

    fn touch_topic(&self, topic_id: TopicId, at: DateTime<Utc>) -> Result<()> {
        Database::touch_topic(self, topic_id, at)
    }

    fn record_view(&self, topic_id: TopicId, viewer: &str) -> Result<bool> {
        Database::record_view(self, topic_id, viewer)
    }

    fn post(&self, post_id: PostId) -> Result<Post> {
        Database::post(self, post_id)
    }

    fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        Database::insert_post(self, new_post)
    }

    fn posts_in_topic(&self, topic_id: TopicId) -> Result<Vec<Post>> {
        Database::posts_in_topic(self, topic_id)
    }

    fn topic_post_count(&self, topic_id: TopicId) -> Result<u32> {
        Database::topic_post_count(self, topic_id)
    }

    fn update_post(
        &self,
        post_id: PostId,
        message: &str,
        editor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Post> {
        Database::update_post(self, post_id, message, editor, at)
    }
}
