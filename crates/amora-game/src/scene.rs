//! Read-side scene projection and linear advancement.

use amora_db::Database;
use amora_db::content;
use amora_db::queries;
use amora_types::api::{ChoiceView, Position, SceneView};
use amora_types::models::SceneKind;
use rusqlite::Connection;

use crate::availability;
use crate::choice::ChoiceOutcome;
use crate::error::GameError;

pub const REASON_END_OF_CONTENT: &str = "End of content";

/// Project the scene the user's save currently points at, with the `{name}`
/// placeholder substituted and every choice annotated with its availability.
/// The presentation layer never re-derives gating.
pub fn current(db: &Database, user_id: i64, story_id: i64) -> Result<SceneView, GameError> {
    db.with_conn_mut(|conn| Ok(project(conn, user_id, story_id)))?
}

/// Same as [`current`], usable inside a caller-owned transaction.
pub fn project(conn: &Connection, user_id: i64, story_id: i64) -> Result<SceneView, GameError> {
    let user = queries::get_user(conn, user_id)?.ok_or(GameError::NotFound("user"))?;
    let save = queries::get_or_create_save(conn, user_id, story_id)?
        .ok_or(GameError::NotFound("scene"))?;
    let scene = content::query_scene(conn, save.scene_id)?.ok_or(GameError::NotFound("scene"))?;

    let kind: SceneKind = scene.scene_type.parse().unwrap_or(SceneKind::Normal);

    // Input scenes take free text; their answer choices stay hidden.
    let choices = if kind == SceneKind::Input {
        Vec::new()
    } else {
        let is_leader = queries::is_team_leader(conn, &user)?;
        content::query_choices_by_scene(conn, scene.id)?
            .into_iter()
            .map(|c| {
                let gate = availability::evaluate(&user, is_leader, &save, &c);
                ChoiceView {
                    id: c.id,
                    choice_number: c.choice_number,
                    text: c.choice_text,
                    premium: c.premium,
                    diamonds_cost: c.diamonds_cost,
                    is_available: gate.available,
                }
            })
            .collect()
    };

    Ok(SceneView {
        scene_id: scene.id,
        chapter_id: scene.chapter_id,
        scene_type: scene.scene_type,
        character_name: substitute(&scene.character_name, &user.display_name),
        character_image: scene.character_image,
        background: scene.background_image.unwrap_or_default(),
        music: scene.music_track,
        dialogue: substitute(&scene.dialogue_text, &user.display_name),
        position: Position {
            x: scene.position_x,
            y: scene.position_y,
        },
        scale: scene.scale,
        choices,
        current_user_diamonds: user.diamonds,
    })
}

/// Linear continuation for scenes without choices: move the save pointer to
/// the next scene of the current chapter, or refuse at the chapter's end.
pub fn advance_linear(db: &Database, user_id: i64, story_id: i64) -> Result<ChoiceOutcome, GameError> {
    db.with_conn_mut(|conn| Ok(advance_tx(conn, user_id, story_id)))?
}

fn advance_tx(
    conn: &mut Connection,
    user_id: i64,
    story_id: i64,
) -> Result<ChoiceOutcome, GameError> {
    let tx = conn.transaction()?;

    let save = queries::get_or_create_save(&tx, user_id, story_id)?
        .ok_or(GameError::NotFound("scene"))?;
    let current = content::query_scene(&tx, save.scene_id)?.ok_or(GameError::NotFound("scene"))?;

    let Some(next) = content::next_scene_in_chapter(&tx, save.chapter_id, current.scene_number)?
    else {
        return Ok(ChoiceOutcome::refused(REASON_END_OF_CONTENT));
    };

    queries::advance_save_pointer(&tx, save.id, next.chapter_id, next.id)?;
    tx.commit()?;

    Ok(ChoiceOutcome::advanced(next.id, next.chapter_id))
}

fn substitute(text: &str, display_name: &str) -> String {
    text.replace("{name}", display_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_projection_substitutes_player_name() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);
        let user = fixtures::seed_user(&db, "ann", 0);

        let view = current(&db, user, world.story).unwrap();

        assert_eq!(view.scene_id, world.scene1);
        assert_eq!(view.dialogue, "Hello, ann!");
        assert_eq!(view.character_name, "Mira");
    }

    #[test]
    fn test_projection_annotates_availability() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);
        let user = fixtures::seed_user(&db, "ann", 0);

        let view = current(&db, user, world.story).unwrap();

        let by_id = |id: i64| view.choices.iter().find(|c| c.id == id).unwrap();
        assert!(by_id(world.free_choice).is_available);
        assert!(!by_id(world.premium_choice).is_available);
        assert!(!by_id(world.leader_choice).is_available);
        assert!(!by_id(world.locked_choice).is_available);
    }

    #[test]
    fn test_input_scene_hides_answer_choices() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);
        let user = fixtures::seed_user(&db, "ann", 0);

        db.with_conn_mut(|conn| {
            let save = queries::get_or_create_save(conn, user, world.story)?.unwrap();
            queries::advance_save_pointer(conn, save.id, world.chapter1, world.input_scene)
        })
        .unwrap();

        let view = current(&db, user, world.story).unwrap();
        assert_eq!(view.scene_type, "input");
        assert!(view.choices.is_empty());
    }

    #[test]
    fn test_advance_walks_scene_order_until_chapter_ends() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);
        let user = fixtures::seed_user(&db, "ann", 0);

        let first = advance_linear(&db, user, world.story).unwrap();
        assert_eq!(first, ChoiceOutcome::advanced(world.scene2, world.chapter1));

        let second = advance_linear(&db, user, world.story).unwrap();
        assert_eq!(
            second,
            ChoiceOutcome::advanced(world.input_scene, world.chapter1)
        );

        let done = advance_linear(&db, user, world.story).unwrap();
        assert_eq!(done, ChoiceOutcome::refused(REASON_END_OF_CONTENT));
    }
}
