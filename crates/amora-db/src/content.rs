//! Story-tree CRUD: stories, chapters, scenes and choices, plus the
//! traversal helpers the game core builds on.

use crate::Database;
use crate::models::{ChapterRow, ChoiceRow, SceneRow, StoryRow};
use crate::queries::OptionalExt;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    pub fn get_story(&self, story_id: i64) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| query_story(conn, story_id))
    }

    pub fn get_story_by_key(&self, story_key: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| query_story_by_key(conn, story_key))
    }

    pub fn list_stories(&self, published_only: bool) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| query_stories(conn, published_only))
    }

    pub fn get_chapter(&self, chapter_id: i64) -> Result<Option<ChapterRow>> {
        self.with_conn(|conn| query_chapter(conn, chapter_id))
    }

    pub fn chapters_by_story(&self, story_id: i64) -> Result<Vec<ChapterRow>> {
        self.with_conn(|conn| query_chapters_by_story(conn, story_id))
    }

    pub fn get_scene(&self, scene_id: i64) -> Result<Option<SceneRow>> {
        self.with_conn(|conn| query_scene(conn, scene_id))
    }

    pub fn scenes_by_chapter(&self, chapter_id: i64) -> Result<Vec<SceneRow>> {
        self.with_conn(|conn| query_scenes_by_chapter(conn, chapter_id))
    }

    pub fn get_choice(&self, choice_id: i64) -> Result<Option<ChoiceRow>> {
        self.with_conn(|conn| query_choice(conn, choice_id))
    }

    pub fn choices_by_scene(&self, scene_id: i64) -> Result<Vec<ChoiceRow>> {
        self.with_conn(|conn| query_choices_by_scene(conn, scene_id))
    }
}

// -- Stories --

fn story_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        story_key: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cover_image: row.get(4)?,
        background_image: row.get(5)?,
        premium: row.get(6)?,
        diamonds_cost: row.get(7)?,
        chapters_count: row.get(8)?,
        scenes_count: row.get(9)?,
        is_published: row.get(10)?,
    })
}

const STORY_COLUMNS: &str = "id, story_key, title, description, cover_image, background_image,
     premium, diamonds_cost, chapters_count, scenes_count, is_published";

pub fn query_story(conn: &Connection, story_id: i64) -> Result<Option<StoryRow>> {
    conn.query_row(
        &format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"),
        [story_id],
        story_from_row,
    )
    .optional()
}

pub fn query_story_by_key(conn: &Connection, story_key: &str) -> Result<Option<StoryRow>> {
    conn.query_row(
        &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_key = ?1"),
        [story_key],
        story_from_row,
    )
    .optional()
}

pub fn query_stories(conn: &Connection, published_only: bool) -> Result<Vec<StoryRow>> {
    let sql = if published_only {
        format!("SELECT {STORY_COLUMNS} FROM stories WHERE is_published = 1 ORDER BY created_at DESC")
    } else {
        format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC")
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], story_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub fn insert_story(
    conn: &Connection,
    story_key: &str,
    title: &str,
    description: Option<&str>,
    cover_image: Option<&str>,
    background_image: Option<&str>,
    premium: bool,
    diamonds_cost: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO stories
         (story_key, title, description, cover_image, background_image, premium, diamonds_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            story_key,
            title,
            description,
            cover_image,
            background_image,
            premium,
            diamonds_cost
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[allow(clippy::too_many_arguments)]
pub fn update_story(
    conn: &Connection,
    story_id: i64,
    title: Option<&str>,
    description: Option<&str>,
    cover_image: Option<&str>,
    background_image: Option<&str>,
    premium: Option<bool>,
    diamonds_cost: Option<i64>,
    is_published: Option<bool>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE stories
         SET title            = COALESCE(?1, title),
             description      = COALESCE(?2, description),
             cover_image      = COALESCE(?3, cover_image),
             background_image = COALESCE(?4, background_image),
             premium          = COALESCE(?5, premium),
             diamonds_cost    = COALESCE(?6, diamonds_cost),
             is_published     = COALESCE(?7, is_published),
             updated_at       = datetime('now')
         WHERE id = ?8",
        rusqlite::params![
            title,
            description,
            cover_image,
            background_image,
            premium,
            diamonds_cost,
            is_published,
            story_id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_story(conn: &Connection, story_id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM stories WHERE id = ?1", [story_id])? > 0)
}

/// Recompute the denormalized chapter/scene counters after structural edits.
pub fn refresh_story_counts(conn: &Connection, story_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE stories
         SET chapters_count = (SELECT COUNT(*) FROM chapters WHERE story_id = ?1),
             scenes_count = (
                 SELECT COUNT(*) FROM scenes
                 WHERE chapter_id IN (SELECT id FROM chapters WHERE story_id = ?1)
             ),
             updated_at = datetime('now')
         WHERE id = ?1",
        [story_id],
    )?;
    Ok(())
}

// -- Chapters --

fn chapter_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChapterRow> {
    Ok(ChapterRow {
        id: row.get(0)?,
        story_id: row.get(1)?,
        chapter_number: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        background_image: row.get(5)?,
    })
}

const CHAPTER_COLUMNS: &str = "id, story_id, chapter_number, title, description, background_image";

pub fn query_chapter(conn: &Connection, chapter_id: i64) -> Result<Option<ChapterRow>> {
    conn.query_row(
        &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1"),
        [chapter_id],
        chapter_from_row,
    )
    .optional()
}

pub fn query_chapters_by_story(conn: &Connection, story_id: i64) -> Result<Vec<ChapterRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE story_id = ?1 ORDER BY chapter_number"
    ))?;
    let rows = stmt
        .query_map([story_id], chapter_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn first_chapter(conn: &Connection, story_id: i64) -> Result<Option<ChapterRow>> {
    conn.query_row(
        &format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters
             WHERE story_id = ?1 ORDER BY chapter_number LIMIT 1"
        ),
        [story_id],
        chapter_from_row,
    )
    .optional()
}

pub fn insert_chapter(
    conn: &Connection,
    story_id: i64,
    chapter_number: i64,
    title: Option<&str>,
    description: Option<&str>,
    background_image: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO chapters (story_id, chapter_number, title, description, background_image)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![story_id, chapter_number, title, description, background_image],
    )?;
    let id = conn.last_insert_rowid();
    refresh_story_counts(conn, story_id)?;
    Ok(id)
}

pub fn update_chapter(
    conn: &Connection,
    chapter_id: i64,
    title: Option<&str>,
    description: Option<&str>,
    background_image: Option<&str>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE chapters
         SET title            = COALESCE(?1, title),
             description      = COALESCE(?2, description),
             background_image = COALESCE(?3, background_image)
         WHERE id = ?4",
        rusqlite::params![title, description, background_image, chapter_id],
    )?;
    Ok(changed > 0)
}

pub fn delete_chapter(conn: &Connection, chapter_id: i64) -> Result<bool> {
    let Some(chapter) = query_chapter(conn, chapter_id)? else {
        return Ok(false);
    };
    conn.execute("DELETE FROM chapters WHERE id = ?1", [chapter_id])?;
    refresh_story_counts(conn, chapter.story_id)?;
    Ok(true)
}

// -- Scenes --

fn scene_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SceneRow> {
    Ok(SceneRow {
        id: row.get(0)?,
        chapter_id: row.get(1)?,
        scene_number: row.get(2)?,
        scene_type: row.get(3)?,
        character_name: row.get(4)?,
        character_image: row.get(5)?,
        dialogue_text: row.get(6)?,
        background_image: row.get(7)?,
        music_track: row.get(8)?,
        position_x: row.get(9)?,
        position_y: row.get(10)?,
        scale: row.get(11)?,
    })
}

const SCENE_COLUMNS: &str = "id, chapter_id, scene_number, scene_type, character_name,
     character_image, dialogue_text, background_image, music_track,
     position_x, position_y, scale";

pub fn query_scene(conn: &Connection, scene_id: i64) -> Result<Option<SceneRow>> {
    conn.query_row(
        &format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = ?1"),
        [scene_id],
        scene_from_row,
    )
    .optional()
}

pub fn query_scenes_by_chapter(conn: &Connection, chapter_id: i64) -> Result<Vec<SceneRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCENE_COLUMNS} FROM scenes WHERE chapter_id = ?1 ORDER BY scene_number"
    ))?;
    let rows = stmt
        .query_map([chapter_id], scene_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn first_scene(conn: &Connection, chapter_id: i64) -> Result<Option<SceneRow>> {
    conn.query_row(
        &format!(
            "SELECT {SCENE_COLUMNS} FROM scenes
             WHERE chapter_id = ?1 ORDER BY scene_number LIMIT 1"
        ),
        [chapter_id],
        scene_from_row,
    )
    .optional()
}

/// The next scene after `scene_number` within a chapter, in scene order.
pub fn next_scene_in_chapter(
    conn: &Connection,
    chapter_id: i64,
    scene_number: i64,
) -> Result<Option<SceneRow>> {
    conn.query_row(
        &format!(
            "SELECT {SCENE_COLUMNS} FROM scenes
             WHERE chapter_id = ?1 AND scene_number > ?2
             ORDER BY scene_number LIMIT 1"
        ),
        [chapter_id, scene_number],
        scene_from_row,
    )
    .optional()
}

#[allow(clippy::too_many_arguments)]
pub fn insert_scene(
    conn: &Connection,
    chapter_id: i64,
    scene_number: i64,
    scene_type: &str,
    character_name: &str,
    dialogue_text: &str,
    character_image: Option<&str>,
    background_image: Option<&str>,
    music_track: Option<&str>,
    position_x: i64,
    position_y: i64,
    scale: f64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO scenes
         (chapter_id, scene_number, scene_type, character_name, dialogue_text,
          character_image, background_image, music_track, position_x, position_y, scale)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            chapter_id,
            scene_number,
            scene_type,
            character_name,
            dialogue_text,
            character_image,
            background_image,
            music_track,
            position_x,
            position_y,
            scale
        ],
    )?;
    let id = conn.last_insert_rowid();
    if let Some(chapter) = query_chapter(conn, chapter_id)? {
        refresh_story_counts(conn, chapter.story_id)?;
    }
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub fn update_scene(
    conn: &Connection,
    scene_id: i64,
    scene_type: Option<&str>,
    character_name: Option<&str>,
    dialogue_text: Option<&str>,
    character_image: Option<&str>,
    background_image: Option<&str>,
    music_track: Option<&str>,
    position_x: Option<i64>,
    position_y: Option<i64>,
    scale: Option<f64>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE scenes
         SET scene_type       = COALESCE(?1, scene_type),
             character_name   = COALESCE(?2, character_name),
             dialogue_text    = COALESCE(?3, dialogue_text),
             character_image  = COALESCE(?4, character_image),
             background_image = COALESCE(?5, background_image),
             music_track      = COALESCE(?6, music_track),
             position_x       = COALESCE(?7, position_x),
             position_y       = COALESCE(?8, position_y),
             scale            = COALESCE(?9, scale)
         WHERE id = ?10",
        rusqlite::params![
            scene_type,
            character_name,
            dialogue_text,
            character_image,
            background_image,
            music_track,
            position_x,
            position_y,
            scale,
            scene_id
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_scene(conn: &Connection, scene_id: i64) -> Result<bool> {
    let story_id = story_of_scene(conn, scene_id)?;
    let changed = conn.execute("DELETE FROM scenes WHERE id = ?1", [scene_id])?;
    if let Some(story_id) = story_id {
        refresh_story_counts(conn, story_id)?;
    }
    Ok(changed > 0)
}

// -- Choices --

fn choice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChoiceRow> {
    Ok(ChoiceRow {
        id: row.get(0)?,
        scene_id: row.get(1)?,
        choice_number: row.get(2)?,
        choice_text: row.get(3)?,
        next_scene_id: row.get(4)?,
        next_chapter_id: row.get(5)?,
        premium: row.get(6)?,
        diamonds_cost: row.get(7)?,
        teasing_change: row.get(8)?,
        friendship_change: row.get(9)?,
        passion_change: row.get(10)?,
        required_teasing_level: row.get(11)?,
        required_friendship_level: row.get(12)?,
        required_passion_level: row.get(13)?,
        only_leader: row.get(14)?,
        is_locked: row.get(15)?,
        unlocked_for_teams: row.get(16)?,
        is_legend: row.get(17)?,
    })
}

const CHOICE_COLUMNS: &str = "id, scene_id, choice_number, choice_text, next_scene_id,
     next_chapter_id, premium, diamonds_cost, teasing_change, friendship_change,
     passion_change, required_teasing_level, required_friendship_level,
     required_passion_level, only_leader, is_locked, unlocked_for_teams, is_legend";

pub fn query_choice(conn: &Connection, choice_id: i64) -> Result<Option<ChoiceRow>> {
    conn.query_row(
        &format!("SELECT {CHOICE_COLUMNS} FROM choices WHERE id = ?1"),
        [choice_id],
        choice_from_row,
    )
    .optional()
}

pub fn query_choices_by_scene(conn: &Connection, scene_id: i64) -> Result<Vec<ChoiceRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHOICE_COLUMNS} FROM choices WHERE scene_id = ?1 ORDER BY choice_number"
    ))?;
    let rows = stmt
        .query_map([scene_id], choice_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Exact, case-sensitive match on choice text — free-text "input" scenes
/// resolve the player's answer through this.
pub fn find_choice_by_text(
    conn: &Connection,
    scene_id: i64,
    text: &str,
) -> Result<Option<ChoiceRow>> {
    conn.query_row(
        &format!("SELECT {CHOICE_COLUMNS} FROM choices WHERE scene_id = ?1 AND choice_text = ?2"),
        rusqlite::params![scene_id, text],
        choice_from_row,
    )
    .optional()
}

pub fn insert_choice(conn: &Connection, choice: &NewChoice<'_>) -> Result<i64> {
    conn.execute(
        "INSERT INTO choices
         (scene_id, choice_number, choice_text, next_scene_id, next_chapter_id,
          premium, diamonds_cost, teasing_change, friendship_change, passion_change,
          required_teasing_level, required_friendship_level, required_passion_level,
          only_leader, is_locked, unlocked_for_teams, is_legend)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        rusqlite::params![
            choice.scene_id,
            choice.choice_number,
            choice.choice_text,
            choice.next_scene_id,
            choice.next_chapter_id,
            choice.premium,
            choice.diamonds_cost,
            choice.teasing_change,
            choice.friendship_change,
            choice.passion_change,
            choice.required_teasing_level,
            choice.required_friendship_level,
            choice.required_passion_level,
            choice.only_leader,
            choice.is_locked,
            choice.unlocked_for_teams,
            choice.is_legend
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert payload for a choice; keeps `insert_choice` callable without a
/// seventeen-argument signature.
#[derive(Debug, Default)]
pub struct NewChoice<'a> {
    pub scene_id: i64,
    pub choice_number: i64,
    pub choice_text: &'a str,
    pub next_scene_id: Option<i64>,
    pub next_chapter_id: Option<i64>,
    pub premium: bool,
    pub diamonds_cost: i64,
    pub teasing_change: i64,
    pub friendship_change: i64,
    pub passion_change: i64,
    pub required_teasing_level: Option<i64>,
    pub required_friendship_level: Option<i64>,
    pub required_passion_level: Option<i64>,
    pub only_leader: bool,
    pub is_locked: bool,
    pub unlocked_for_teams: Option<&'a str>,
    pub is_legend: bool,
}

pub fn update_choice(conn: &Connection, choice_id: i64, patch: &ChoicePatch<'_>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE choices
         SET choice_text               = COALESCE(?1, choice_text),
             next_scene_id             = ?2,
             next_chapter_id           = ?3,
             premium                   = COALESCE(?4, premium),
             diamonds_cost             = COALESCE(?5, diamonds_cost),
             teasing_change            = COALESCE(?6, teasing_change),
             friendship_change         = COALESCE(?7, friendship_change),
             passion_change            = COALESCE(?8, passion_change),
             required_teasing_level    = COALESCE(?9, required_teasing_level),
             required_friendship_level = COALESCE(?10, required_friendship_level),
             required_passion_level    = COALESCE(?11, required_passion_level),
             only_leader               = COALESCE(?12, only_leader),
             is_locked                 = COALESCE(?13, is_locked),
             unlocked_for_teams        = COALESCE(?14, unlocked_for_teams),
             is_legend                 = COALESCE(?15, is_legend)
         WHERE id = ?16",
        rusqlite::params![
            patch.choice_text,
            patch.next_scene_id,
            patch.next_chapter_id,
            patch.premium,
            patch.diamonds_cost,
            patch.teasing_change,
            patch.friendship_change,
            patch.passion_change,
            patch.required_teasing_level,
            patch.required_friendship_level,
            patch.required_passion_level,
            patch.only_leader,
            patch.is_locked,
            patch.unlocked_for_teams,
            patch.is_legend,
            choice_id
        ],
    )?;
    Ok(changed > 0)
}

/// Update payload for a choice. Destination columns are written as given
/// (they move as a validated pair, not field by field); everything else
/// falls back to the stored value when None.
#[derive(Debug, Default)]
pub struct ChoicePatch<'a> {
    pub choice_text: Option<&'a str>,
    pub next_scene_id: Option<i64>,
    pub next_chapter_id: Option<i64>,
    pub premium: Option<bool>,
    pub diamonds_cost: Option<i64>,
    pub teasing_change: Option<i64>,
    pub friendship_change: Option<i64>,
    pub passion_change: Option<i64>,
    pub required_teasing_level: Option<i64>,
    pub required_friendship_level: Option<i64>,
    pub required_passion_level: Option<i64>,
    pub only_leader: Option<bool>,
    pub is_locked: Option<bool>,
    pub unlocked_for_teams: Option<&'a str>,
    pub is_legend: Option<bool>,
}

pub fn delete_choice(conn: &Connection, choice_id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM choices WHERE id = ?1", [choice_id])? > 0)
}

// -- Tree walks --

/// Story a scene belongs to, via its chapter.
pub fn story_of_scene(conn: &Connection, scene_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT c.story_id FROM scenes s JOIN chapters c ON c.id = s.chapter_id WHERE s.id = ?1",
        [scene_id],
        |row| row.get(0),
    )
    .optional()
}

pub fn story_of_chapter(conn: &Connection, chapter_id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT story_id FROM chapters WHERE id = ?1",
        [chapter_id],
        |row| row.get(0),
    )
    .optional()
}
