//! Queries for users, teams, diamonds, save states, history, unlocks and
//! diamond codes. Story-tree CRUD lives in `content`.
//!
//! Each query exists as a free function over `&Connection` so the game core
//! can compose several of them inside one transaction; the `Database`
//! methods wrap the common single-statement cases.

use crate::Database;
use crate::models::{DiamondCodeRow, SaveStateRow, TeamRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        display_name: &str,
        diamonds: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            insert_user(conn, username, email, password_hash, display_name, diamonds)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    pub fn record_login_failure(
        &self,
        user_id: i64,
        attempts: i64,
        locked_until: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET failed_login_attempts = ?1, locked_until = ?2 WHERE id = ?3",
                rusqlite::params![attempts, locked_until, user_id],
            )?;
            Ok(())
        })
    }

    pub fn record_login_success(&self, user_id: i64, last_login: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users
                 SET failed_login_attempts = 0, locked_until = NULL, last_login = ?1
                 WHERE id = ?2",
                rusqlite::params![last_login, user_id],
            )?;
            Ok(())
        })
    }

    pub fn get_team(&self, team_id: i64) -> Result<Option<TeamRow>> {
        self.with_conn(|conn| query_team(conn, team_id))
    }

    // -- Progress --

    pub fn reset_progress(&self, user_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM save_states WHERE user_id = ?1", [user_id])?;
            tx.execute("DELETE FROM choice_history WHERE user_id = ?1", [user_id])?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_legend_history(
        &self,
        user_id: i64,
        story_id: i64,
    ) -> Result<Vec<(i64, String, String)>> {
        self.with_conn(|conn| query_legend_history(conn, user_id, story_id))
    }

    // -- Diamond codes --

    pub fn create_diamond_code(&self, code: &str, value: i64, remaining: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO diamond_codes (code, value, remaining) VALUES (?1, ?2, ?3)",
                rusqlite::params![code, value, remaining],
            )?;
            Ok(())
        })
    }

    /// Redeem a code: decrements `remaining` and credits the user in one
    /// transaction. Returns the credited value, or None when the code is
    /// unknown or used up.
    pub fn redeem_diamond_code(&self, user_id: i64, code: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row = query_diamond_code(&tx, code)?;
            let Some(row) = row else {
                return Ok(None);
            };

            let taken = tx.execute(
                "UPDATE diamond_codes SET remaining = remaining - 1
                 WHERE code = ?1 AND remaining > 0",
                [code],
            )?;
            if taken == 0 {
                return Ok(None);
            }

            credit_diamonds(&tx, user_id, row.value)?;
            tx.commit()?;
            Ok(Some(row.value))
        })
    }
}

// -- Users --

pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    display_name: &str,
    diamonds: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, display_name, diamonds)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![username, email, password_hash, display_name, diamonds],
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_user(conn: &Connection, column: &str, key: &dyn rusqlite::ToSql) -> Result<Option<UserRow>> {
    // `column` is always a literal from this module, never user input.
    let sql = format!(
        "SELECT id, username, email, password_hash, display_name, avatar_url, theme,
                diamonds, is_active, is_admin, failed_login_attempts, locked_until,
                team_id, created_at, last_login
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row(rusqlite::params![key], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            display_name: row.get(4)?,
            avatar_url: row.get(5)?,
            theme: row.get(6)?,
            diamonds: row.get(7)?,
            is_active: row.get(8)?,
            is_admin: row.get(9)?,
            failed_login_attempts: row.get(10)?,
            locked_until: row.get(11)?,
            team_id: row.get(12)?,
            created_at: row.get(13)?,
            last_login: row.get(14)?,
        })
    })
    .optional()
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<UserRow>> {
    query_user(conn, "id", &user_id)
}

pub fn update_profile(
    conn: &Connection,
    user_id: i64,
    display_name: Option<&str>,
    theme: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users
         SET display_name = COALESCE(?1, display_name),
             theme        = COALESCE(?2, theme),
             avatar_url   = COALESCE(?3, avatar_url)
         WHERE id = ?4",
        rusqlite::params![display_name, theme, avatar_url, user_id],
    )?;
    Ok(changed > 0)
}

pub fn credit_diamonds(conn: &Connection, user_id: i64, amount: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET diamonds = diamonds + ?1 WHERE id = ?2",
        rusqlite::params![amount, user_id],
    )?;
    Ok(())
}

/// Conditional debit: refuses rather than driving the balance negative.
/// Returns false when the balance is short.
pub fn debit_diamonds(conn: &Connection, user_id: i64, amount: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET diamonds = diamonds - ?1 WHERE id = ?2 AND diamonds >= ?1",
        rusqlite::params![amount, user_id],
    )?;
    Ok(changed > 0)
}

// -- Teams --

pub fn query_team(conn: &Connection, team_id: i64) -> Result<Option<TeamRow>> {
    conn.query_row(
        "SELECT id, name, leader_id FROM teams WHERE id = ?1",
        [team_id],
        |row| {
            Ok(TeamRow {
                id: row.get(0)?,
                name: row.get(1)?,
                leader_id: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Whether the user leads the team they belong to.
pub fn is_team_leader(conn: &Connection, user: &UserRow) -> Result<bool> {
    let Some(team_id) = user.team_id else {
        return Ok(false);
    };
    Ok(query_team(conn, team_id)?
        .and_then(|t| t.leader_id)
        .is_some_and(|leader| leader == user.id))
}

pub fn insert_team(conn: &Connection, name: &str, leader_id: Option<i64>) -> Result<i64> {
    conn.execute(
        "INSERT INTO teams (name, leader_id) VALUES (?1, ?2)",
        rusqlite::params![name, leader_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_user_team(conn: &Connection, user_id: i64, team_id: Option<i64>) -> Result<()> {
    conn.execute(
        "UPDATE users SET team_id = ?1 WHERE id = ?2",
        rusqlite::params![team_id, user_id],
    )?;
    Ok(())
}

// -- Save states --

fn save_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SaveStateRow> {
    Ok(SaveStateRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        story_id: row.get(2)?,
        chapter_id: row.get(3)?,
        scene_id: row.get(4)?,
        teasing_level: row.get(5)?,
        friendship_level: row.get(6)?,
        passion_level: row.get(7)?,
    })
}

pub fn query_save(conn: &Connection, user_id: i64, story_id: i64) -> Result<Option<SaveStateRow>> {
    conn.query_row(
        "SELECT id, user_id, story_id, chapter_id, scene_id,
                teasing_level, friendship_level, passion_level
         FROM save_states WHERE user_id = ?1 AND story_id = ?2",
        [user_id, story_id],
        save_from_row,
    )
    .optional()
}

/// Fetch the user's save for a story, creating one seeded at the story's
/// first chapter and scene when absent. Returns None when the story has no
/// playable content yet.
pub fn get_or_create_save(
    conn: &Connection,
    user_id: i64,
    story_id: i64,
) -> Result<Option<SaveStateRow>> {
    if let Some(save) = query_save(conn, user_id, story_id)? {
        return Ok(Some(save));
    }

    let Some(chapter) = crate::content::first_chapter(conn, story_id)? else {
        return Ok(None);
    };
    let Some(scene) = crate::content::first_scene(conn, chapter.id)? else {
        return Ok(None);
    };

    conn.execute(
        "INSERT INTO save_states (user_id, story_id, chapter_id, scene_id)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user_id, story_id, chapter.id, scene.id],
    )?;
    query_save(conn, user_id, story_id)
}

pub fn advance_save_pointer(
    conn: &Connection,
    save_id: i64,
    chapter_id: i64,
    scene_id: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE save_states
         SET chapter_id = ?1, scene_id = ?2, updated_at = datetime('now')
         WHERE id = ?3",
        rusqlite::params![chapter_id, scene_id, save_id],
    )?;
    Ok(())
}

/// Pointer advance plus stat accumulation, as one statement.
pub fn apply_choice_effects(
    conn: &Connection,
    save_id: i64,
    chapter_id: i64,
    scene_id: i64,
    teasing: i64,
    friendship: i64,
    passion: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE save_states
         SET chapter_id = ?1,
             scene_id = ?2,
             teasing_level = teasing_level + ?3,
             friendship_level = friendship_level + ?4,
             passion_level = passion_level + ?5,
             updated_at = datetime('now')
         WHERE id = ?6",
        rusqlite::params![chapter_id, scene_id, teasing, friendship, passion, save_id],
    )?;
    Ok(())
}

// -- Choice history --

pub fn append_history(conn: &Connection, user_id: i64, story_id: i64, choice_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO choice_history (user_id, story_id, choice_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![user_id, story_id, choice_id],
    )?;
    Ok(())
}

pub fn query_legend_history(
    conn: &Connection,
    user_id: i64,
    story_id: i64,
) -> Result<Vec<(i64, String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT h.choice_id, c.choice_text, h.created_at
         FROM choice_history h
         JOIN choices c ON c.id = h.choice_id
         WHERE h.user_id = ?1 AND h.story_id = ?2 AND c.is_legend = 1
         ORDER BY h.id",
    )?;
    let rows = stmt
        .query_map([user_id, story_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn history_count(conn: &Connection, user_id: i64, story_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM choice_history WHERE user_id = ?1 AND story_id = ?2",
        [user_id, story_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// -- Story unlocks --

pub fn has_unlock(conn: &Connection, user_id: i64, story_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM story_unlocks WHERE user_id = ?1 AND story_id = ?2",
        [user_id, story_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn insert_unlock(conn: &Connection, user_id: i64, story_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO story_unlocks (user_id, story_id) VALUES (?1, ?2)",
        [user_id, story_id],
    )?;
    Ok(())
}

// -- Diamond codes --

pub fn query_diamond_code(conn: &Connection, code: &str) -> Result<Option<DiamondCodeRow>> {
    conn.query_row(
        "SELECT code, value, remaining FROM diamond_codes WHERE code = ?1",
        [code],
        |row| {
            Ok(DiamondCodeRow {
                code: row.get(0)?,
                value: row.get(1)?,
                remaining: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
