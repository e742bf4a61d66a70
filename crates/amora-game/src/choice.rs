//! Choice application: the one write path of the game. Debit, pointer
//! advance, stat accumulation and history append commit as a single
//! transaction or not at all.

use amora_db::content;
use amora_db::models::ChoiceRow;
use amora_db::queries;
use amora_db::Database;
use amora_types::models::Destination;
use rusqlite::Connection;
use tracing::debug;

use crate::availability;
use crate::error::GameError;

pub const REASON_WRONG_ANSWER: &str = "wrong answer";

/// Result of committing (or refusing) a choice. On refusal the scene and
/// chapter ids are -1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub success: bool,
    pub message: String,
    pub scene_id: i64,
    pub chapter_id: i64,
}

impl ChoiceOutcome {
    pub fn advanced(scene_id: i64, chapter_id: i64) -> Self {
        Self {
            success: true,
            message: String::new(),
            scene_id,
            chapter_id,
        }
    }

    pub fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            scene_id: -1,
            chapter_id: -1,
        }
    }
}

/// Commit an enumerated choice for the user.
pub fn apply(
    db: &Database,
    user_id: i64,
    story_id: i64,
    choice_id: i64,
) -> Result<ChoiceOutcome, GameError> {
    db.with_conn_mut(|conn| Ok(apply_tx(conn, user_id, story_id, choice_id)))?
}

/// Resolve a free-text answer on the current scene, then commit the matching
/// choice. The match is exact and case-sensitive.
pub fn apply_input(
    db: &Database,
    user_id: i64,
    story_id: i64,
    text: &str,
) -> Result<ChoiceOutcome, GameError> {
    db.with_conn_mut(|conn| Ok(input_tx(conn, user_id, story_id, text)))?
}

fn apply_tx(
    conn: &mut Connection,
    user_id: i64,
    story_id: i64,
    choice_id: i64,
) -> Result<ChoiceOutcome, GameError> {
    let tx = conn.transaction()?;

    let choice = content::query_choice(&tx, choice_id)?.ok_or(GameError::NotFound("choice"))?;
    if content::story_of_scene(&tx, choice.scene_id)? != Some(story_id) {
        return Err(GameError::NotFound("choice"));
    }

    let outcome = commit_effects(&tx, user_id, story_id, &choice)?;
    if outcome.success {
        tx.commit()?;
    }
    Ok(outcome)
}

fn input_tx(
    conn: &mut Connection,
    user_id: i64,
    story_id: i64,
    text: &str,
) -> Result<ChoiceOutcome, GameError> {
    let tx = conn.transaction()?;

    let save = queries::get_or_create_save(&tx, user_id, story_id)?
        .ok_or(GameError::NotFound("scene"))?;
    let scene = content::query_scene(&tx, save.scene_id)?.ok_or(GameError::NotFound("scene"))?;

    let Some(choice) = content::find_choice_by_text(&tx, scene.id, text)? else {
        return Ok(ChoiceOutcome::refused(REASON_WRONG_ANSWER));
    };

    let outcome = commit_effects(&tx, user_id, story_id, &choice)?;
    if outcome.success {
        tx.commit()?;
    }
    Ok(outcome)
}

/// Availability re-check plus the full effect sequence. The caller owns the
/// transaction; a refused outcome must not be committed.
fn commit_effects(
    conn: &Connection,
    user_id: i64,
    story_id: i64,
    choice: &ChoiceRow,
) -> Result<ChoiceOutcome, GameError> {
    // Never trust a stale client-side availability check.
    let gate = availability::check(conn, user_id, choice.id)?;
    if !gate.available {
        return Ok(ChoiceOutcome::refused(gate.reason));
    }

    if choice.premium && choice.diamonds_cost > 0 {
        // The balance was checked a moment ago, but the debit stays
        // conditional: the balance must never go negative.
        if !queries::debit_diamonds(conn, user_id, choice.diamonds_cost)? {
            return Ok(ChoiceOutcome::refused(availability::REASON_DIAMONDS));
        }
    }

    let save = queries::query_save(conn, user_id, story_id)?
        .ok_or(GameError::NotFound("save state"))?;

    let (scene_id, chapter_id) = match choice.destination().map_err(anyhow::Error::from)? {
        Destination::Scene(id) => {
            let scene = content::query_scene(conn, id)?.ok_or(GameError::NotFound("next scene"))?;
            (scene.id, scene.chapter_id)
        }
        Destination::ChapterStart(id) => {
            let chapter =
                content::query_chapter(conn, id)?.ok_or(GameError::NotFound("next chapter"))?;
            let scene =
                content::first_scene(conn, chapter.id)?.ok_or(GameError::NotFound("next scene"))?;
            (scene.id, chapter.id)
        }
    };

    queries::apply_choice_effects(
        conn,
        save.id,
        chapter_id,
        scene_id,
        choice.teasing_change,
        choice.friendship_change,
        choice.passion_change,
    )?;
    queries::append_history(conn, user_id, story_id, choice.id)?;

    debug!(
        user_id,
        choice_id = choice.id,
        scene_id,
        chapter_id,
        "choice committed"
    );
    Ok(ChoiceOutcome::advanced(scene_id, chapter_id))
}
