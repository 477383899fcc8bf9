//! A non-durable entity store.
//!
//! `MemoryStore` keeps everything behind a single mutex, which makes every
//! store operation trivially atomic. It backs the test suite and the
//! benchmarks; anything that holds only ephemeral data can use it too.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::offset::Utc;
use chrono::DateTime;

use crate::models::{
    Board, BoardId, NewBoard, NewPost, NewTopic, Post, PostId, Store, Topic,
    TopicId, TopicSummary, UserId,
};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    boards: Vec<Board>,
    topics: Vec<Topic>,
    posts: Vec<Post>,
    counted_views: HashSet<(TopicId, String)>,
}

/// An in-memory entity store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> MutexGuard<Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

fn next_id<T>(items: &[T]) -> i32 {
    items.len() as i32 + 1
}

impl Store for MemoryStore {
    fn all_boards(&self) -> Result<Vec<Board>> {
        Ok(self.lock().boards.clone())
    }

    fn board(&self, board_id: BoardId) -> Result<Board> {
        self.lock()
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
            .ok_or(Error::BoardNotFound { board_id })
    }

    fn insert_board(&self, new_board: NewBoard) -> Result<Board> {
        let mut inner = self.lock();

        let board = Board {
            id: next_id(&inner.boards),
            name: new_board.name.to_string(),
            description: new_board.description.to_string(),
        };

        inner.boards.push(board.clone());

        Ok(board)
    }

    fn topic(&self, topic_id: TopicId) -> Result<Topic> {
        self.lock()
            .topics
            .iter()
            .find(|t| t.id == topic_id)
            .cloned()
            .ok_or(Error::TopicNotFound { topic_id })
    }

    fn create_topic(
        &self,
        new_topic: NewTopic,
        opening_message: &str,
    ) -> Result<Topic> {
        let mut inner = self.lock();

        // Both rows are created under the same lock, so the topic and its
        // opening post become visible together or not at all.
        let topic = Topic {
            id: next_id(&inner.topics),
            board_id: new_topic.board,
            subject: new_topic.subject.to_string(),
            starter: new_topic.starter,
            last_updated: new_topic.last_updated,
            views: 0,
        };

        let opening = Post {
            id: next_id(&inner.posts),
            topic_id: topic.id,
            message: opening_message.to_string(),
            created_by: new_topic.starter,
            created_at: new_topic.last_updated,
            updated_at: None,
            updated_by: None,
        };

        inner.topics.push(topic.clone());
        inner.posts.push(opening);

        Ok(topic)
    }

    fn topic_summaries(&self, board_id: BoardId) -> Result<Vec<TopicSummary>> {
        let inner = self.lock();

        let mut summaries: Vec<TopicSummary> = inner
            .topics
            .iter()
            .filter(|t| t.board_id == board_id)
            .map(|t| TopicSummary {
                topic: t.clone(),
                replies: inner
                    .posts
                    .iter()
                    .filter(|p| p.topic_id == t.id)
                    .count() as i64
                    - 1,
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.topic
                .last_updated
                .cmp(&a.topic.last_updated)
                .then(b.topic.id.cmp(&a.topic.id))
        });

        Ok(summaries)
    }

    fn touch_topic(&self, topic_id: TopicId, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.lock();

        let topic = inner
            .topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or(Error::TopicNotFound { topic_id })?;

        topic.last_updated = topic.last_updated.max(at);

        Ok(())
    }

    fn record_view(&self, topic_id: TopicId, viewer: &str) -> Result<bool> {
        let mut inner = self.lock();

        if !inner.topics.iter().any(|t| t.id == topic_id) {
            return Err(Error::TopicNotFound { topic_id });
        }

        if !inner.counted_views.insert((topic_id, viewer.to_string())) {
            return Ok(false);
        }

        let topic = inner
            .topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or(Error::TopicNotFound { topic_id })?;
        topic.views += 1;

        Ok(true)
    }

    fn post(&self, post_id: PostId) -> Result<Post> {
        self.lock()
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(Error::PostNotFound { post_id })
    }

    fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        let mut inner = self.lock();

        if !inner.topics.iter().any(|t| t.id == new_post.topic) {
            return Err(Error::TopicNotFound {
                topic_id: new_post.topic,
            });
        }

        let post = Post {
            id: next_id(&inner.posts),
            topic_id: new_post.topic,
            message: new_post.message.to_string(),
            created_by: new_post.created_by,
            created_at: new_post.created_at,
            updated_at: None,
            updated_by: None,
        };

        inner.posts.push(post.clone());

        Ok(post)
    }

    fn posts_in_topic(&self, topic_id: TopicId) -> Result<Vec<Post>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .filter(|p| p.topic_id == topic_id)
            .cloned()
            .collect())
    }

    fn topic_post_count(&self, topic_id: TopicId) -> Result<u32> {
        Ok(self
            .lock()
            .posts
            .iter()
            .filter(|p| p.topic_id == topic_id)
            .count() as u32)
    }

    fn update_post(
        &self,
        post_id: PostId,
        message: &str,
        editor: UserId,
        at: DateTime<Utc>,
    ) -> Result<Post> {
        let mut inner = self.lock();

        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or(Error::PostNotFound { post_id })?;

        post.message = message.to_string();
        post.updated_at = Some(at);
        post.updated_by = Some(editor);

        Ok(post.clone())
    }
}
