//! Types related to boards.

use diesel::{insert_into, prelude::*};

use serde::Serialize;

use crate::models::{BoardId, Database};
use crate::schema::board;
use crate::{Error, Result};

/// A collection of discussion topics about a similar subject.
///
/// Boards are immutable once created; there is no update path.
#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Board {
    /// The ID of the board.
    pub id: BoardId,
    /// The name of the board.
    pub name: String,
    /// The description of the board.
    pub description: String,
}

/// A new board to be inserted in the store.
#[derive(Debug, Insertable)]
#[diesel(table_name = board)]
pub struct NewBoard<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Convenience function to convert from diesel's error type into our error
/// type, when we're querying for a board.
fn conv_board_error(
    board_id: BoardId,
) -> impl FnOnce(diesel::result::Error) -> Error {
    move |e: diesel::result::Error| match e {
        diesel::result::Error::NotFound => Error::BoardNotFound { board_id },
        _ => Error::from(e),
    }
}

impl Database {
    /// Get all boards.
    pub fn all_boards(&self) -> Result<Vec<Board>> {
        use crate::schema::board::columns::id;
        use crate::schema::board::dsl::board;

        Ok(board.order(id.asc()).load(&mut self.pool.get()?)?)
    }

    /// Get a board.
    pub fn board(&self, board_id: BoardId) -> Result<Board> {
        use crate::schema::board::columns::id;
        use crate::schema::board::dsl::board;

        board
            .filter(id.eq(board_id))
            .limit(1)
            .first(&mut self.pool.get()?)
            .map_err(conv_board_error(board_id))
    }

    /// Insert a new board.
    pub fn insert_board(&self, new_board: NewBoard) -> Result<Board> {
        use crate::schema::board::dsl::board;

        Ok(insert_into(board)
            .values(&new_board)
            .get_result(&mut self.pool.get()?)?)
    }
}
