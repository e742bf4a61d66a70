use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE teams (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                leader_id   INTEGER
            );

            CREATE TABLE users (
                id                      INTEGER PRIMARY KEY,
                username                TEXT NOT NULL UNIQUE,
                email                   TEXT NOT NULL UNIQUE,
                password_hash           TEXT NOT NULL,
                display_name            TEXT NOT NULL,
                avatar_url              TEXT,
                theme                   TEXT NOT NULL DEFAULT 'orange',
                diamonds                INTEGER NOT NULL DEFAULT 0 CHECK (diamonds >= 0),
                is_active               INTEGER NOT NULL DEFAULT 1,
                is_admin                INTEGER NOT NULL DEFAULT 0,
                failed_login_attempts   INTEGER NOT NULL DEFAULT 0,
                locked_until            TEXT,
                team_id                 INTEGER REFERENCES teams(id),
                created_at              TEXT NOT NULL DEFAULT (datetime('now')),
                last_login              TEXT
            );

            CREATE TABLE stories (
                id                  INTEGER PRIMARY KEY,
                story_key           TEXT NOT NULL UNIQUE,
                title               TEXT NOT NULL,
                description         TEXT,
                cover_image         TEXT,
                background_image    TEXT,
                premium             INTEGER NOT NULL DEFAULT 0,
                diamonds_cost       INTEGER NOT NULL DEFAULT 0,
                chapters_count      INTEGER NOT NULL DEFAULT 0,
                scenes_count        INTEGER NOT NULL DEFAULT 0,
                is_published        INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE chapters (
                id                  INTEGER PRIMARY KEY,
                story_id            INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
                chapter_number      INTEGER NOT NULL,
                title               TEXT,
                description         TEXT,
                background_image    TEXT,
                UNIQUE(story_id, chapter_number)
            );

            CREATE TABLE scenes (
                id                  INTEGER PRIMARY KEY,
                chapter_id          INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
                scene_number        INTEGER NOT NULL,
                scene_type          TEXT NOT NULL DEFAULT 'normal',
                character_name      TEXT NOT NULL,
                character_image     TEXT,
                dialogue_text       TEXT NOT NULL,
                background_image    TEXT,
                music_track         TEXT,
                position_x          INTEGER NOT NULL DEFAULT 0,
                position_y          INTEGER NOT NULL DEFAULT 0,
                scale               REAL NOT NULL DEFAULT 1.0,
                UNIQUE(chapter_id, scene_number)
            );

            CREATE TABLE choices (
                id                          INTEGER PRIMARY KEY,
                scene_id                    INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
                choice_number               INTEGER NOT NULL,
                choice_text                 TEXT NOT NULL,
                next_scene_id               INTEGER,
                next_chapter_id             INTEGER,
                premium                     INTEGER NOT NULL DEFAULT 0,
                diamonds_cost               INTEGER NOT NULL DEFAULT 0,
                teasing_change              INTEGER NOT NULL DEFAULT 0,
                friendship_change           INTEGER NOT NULL DEFAULT 0,
                passion_change              INTEGER NOT NULL DEFAULT 0,
                required_teasing_level      INTEGER,
                required_friendship_level   INTEGER,
                required_passion_level      INTEGER,
                only_leader                 INTEGER NOT NULL DEFAULT 0,
                is_locked                   INTEGER NOT NULL DEFAULT 0,
                unlocked_for_teams          TEXT,
                is_legend                   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_choices_scene ON choices(scene_id, choice_number);

            CREATE TABLE save_states (
                id                  INTEGER PRIMARY KEY,
                user_id             INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                story_id            INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
                chapter_id          INTEGER NOT NULL,
                scene_id            INTEGER NOT NULL,
                teasing_level       INTEGER NOT NULL DEFAULT 0,
                friendship_level    INTEGER NOT NULL DEFAULT 0,
                passion_level       INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at          TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, story_id)
            );

            CREATE TABLE choice_history (
                id          INTEGER PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                story_id    INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
                choice_id   INTEGER NOT NULL REFERENCES choices(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_history_user_story ON choice_history(user_id, story_id);

            CREATE TABLE story_unlocks (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                story_id    INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, story_id)
            );

            CREATE TABLE diamond_codes (
                code        TEXT PRIMARY KEY,
                value       INTEGER NOT NULL,
                remaining   INTEGER NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
