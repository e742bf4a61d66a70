//! Content authoring: validated choice writes and whole-story
//! export/import.
//!
//! Referential integrity across the story tree is enforced here, at
//! authoring time, so play-time code can trust that a choice never leads
//! out of its own story.

use std::collections::HashMap;

use amora_db::Database;
use amora_db::content::{self, ChoicePatch, NewChoice};
use amora_db::models::ChoiceRow;
use amora_types::api::{
    ChapterExport, ChoiceExport, CreateChoiceRequest, DestinationExport, SceneExport, StoryExport,
    UpdateChoiceRequest,
};
use amora_types::models::Destination;
use rusqlite::Connection;
use tracing::info;

use crate::error::GameError;

/// Reject a destination that is absent, double, missing from the database,
/// or rooted in a different story than the choice's own scene.
fn validate_destination(
    conn: &Connection,
    scene_id: i64,
    next_scene_id: Option<i64>,
    next_chapter_id: Option<i64>,
) -> Result<(), GameError> {
    let destination = Destination::from_columns(next_scene_id, next_chapter_id)
        .map_err(|e| GameError::Invalid(e.to_string()))?;

    let home_story =
        content::story_of_scene(conn, scene_id)?.ok_or(GameError::NotFound("scene"))?;

    let target_story = match destination {
        Destination::Scene(id) => content::story_of_scene(conn, id)?
            .ok_or_else(|| GameError::Invalid("destination scene does not exist".to_string()))?,
        Destination::ChapterStart(id) => content::story_of_chapter(conn, id)?
            .ok_or_else(|| GameError::Invalid("destination chapter does not exist".to_string()))?,
    };

    if target_story != home_story {
        return Err(GameError::Invalid(
            "destination belongs to a different story".to_string(),
        ));
    }

    Ok(())
}

pub fn create_choice(db: &Database, req: &CreateChoiceRequest) -> Result<ChoiceRow, GameError> {
    db.with_conn_mut(|conn| Ok(create_choice_tx(conn, req)))?
}

fn create_choice_tx(
    conn: &mut Connection,
    req: &CreateChoiceRequest,
) -> Result<ChoiceRow, GameError> {
    let tx = conn.transaction()?;

    validate_destination(&tx, req.scene_id, req.next_scene_id, req.next_chapter_id)?;

    let id = content::insert_choice(
        &tx,
        &NewChoice {
            scene_id: req.scene_id,
            choice_number: req.choice_number,
            choice_text: &req.choice_text,
            next_scene_id: req.next_scene_id,
            next_chapter_id: req.next_chapter_id,
            premium: req.premium,
            diamonds_cost: req.diamonds_cost,
            teasing_change: req.teasing_change,
            friendship_change: req.friendship_change,
            passion_change: req.passion_change,
            required_teasing_level: req.required_teasing_level,
            required_friendship_level: req.required_friendship_level,
            required_passion_level: req.required_passion_level,
            only_leader: req.only_leader,
            is_locked: req.is_locked,
            unlocked_for_teams: req.unlocked_for_teams.as_deref(),
            is_legend: req.is_legend,
        },
    )?;

    let row = content::query_choice(&tx, id)?.ok_or(GameError::NotFound("choice"))?;
    tx.commit()?;
    Ok(row)
}

pub fn update_choice(
    db: &Database,
    choice_id: i64,
    req: &UpdateChoiceRequest,
) -> Result<ChoiceRow, GameError> {
    db.with_conn_mut(|conn| Ok(update_choice_tx(conn, choice_id, req)))?
}

fn update_choice_tx(
    conn: &mut Connection,
    choice_id: i64,
    req: &UpdateChoiceRequest,
) -> Result<ChoiceRow, GameError> {
    let tx = conn.transaction()?;

    let existing = content::query_choice(&tx, choice_id)?.ok_or(GameError::NotFound("choice"))?;

    // The destination moves as a pair: touching either field replaces both,
    // leaving neither untouched keeps the stored pair.
    let (next_scene_id, next_chapter_id) =
        if req.next_scene_id.is_some() || req.next_chapter_id.is_some() {
            (req.next_scene_id, req.next_chapter_id)
        } else {
            (existing.next_scene_id, existing.next_chapter_id)
        };

    validate_destination(&tx, existing.scene_id, next_scene_id, next_chapter_id)?;

    content::update_choice(
        &tx,
        choice_id,
        &ChoicePatch {
            choice_text: req.choice_text.as_deref(),
            next_scene_id,
            next_chapter_id,
            premium: req.premium,
            diamonds_cost: req.diamonds_cost,
            teasing_change: req.teasing_change,
            friendship_change: req.friendship_change,
            passion_change: req.passion_change,
            required_teasing_level: req.required_teasing_level,
            required_friendship_level: req.required_friendship_level,
            required_passion_level: req.required_passion_level,
            only_leader: req.only_leader,
            is_locked: req.is_locked,
            unlocked_for_teams: req.unlocked_for_teams.as_deref(),
            is_legend: req.is_legend,
        },
    )?;

    let row = content::query_choice(&tx, choice_id)?.ok_or(GameError::NotFound("choice"))?;
    tx.commit()?;
    Ok(row)
}

/// Serialize a story tree into a portable document with number-addressed
/// destinations.
pub fn export_story(db: &Database, story_id: i64) -> Result<StoryExport, GameError> {
    db.with_conn(|conn| Ok(export_conn(conn, story_id)))?
}

fn export_conn(conn: &Connection, story_id: i64) -> Result<StoryExport, GameError> {
    let story = content::query_story(conn, story_id)?.ok_or(GameError::NotFound("story"))?;
    let chapters = content::query_chapters_by_story(conn, story_id)?;

    // id -> number maps for destination rewriting
    let chapter_numbers: HashMap<i64, i64> =
        chapters.iter().map(|c| (c.id, c.chapter_number)).collect();
    let mut scene_numbers: HashMap<i64, (i64, i64)> = HashMap::new();
    let mut tree = Vec::with_capacity(chapters.len());

    for chapter in &chapters {
        let scenes = content::query_scenes_by_chapter(conn, chapter.id)?;
        for scene in &scenes {
            scene_numbers.insert(scene.id, (chapter.chapter_number, scene.scene_number));
        }
        tree.push((chapter.clone(), scenes));
    }

    let mut exported_chapters = Vec::with_capacity(tree.len());
    for (chapter, scenes) in tree {
        let mut exported_scenes = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let choices = content::query_choices_by_scene(conn, scene.id)?;
            let exported_choices = choices
                .into_iter()
                .map(|choice| export_choice(choice, &chapter_numbers, &scene_numbers))
                .collect::<Result<Vec<_>, _>>()?;

            exported_scenes.push(SceneExport {
                scene_number: scene.scene_number,
                scene_type: scene.scene_type,
                character_name: scene.character_name,
                character_image: scene.character_image,
                dialogue_text: scene.dialogue_text,
                background_image: scene.background_image,
                music_track: scene.music_track,
                position_x: scene.position_x,
                position_y: scene.position_y,
                scale: scene.scale,
                choices: exported_choices,
            });
        }

        exported_chapters.push(ChapterExport {
            chapter_number: chapter.chapter_number,
            title: chapter.title,
            description: chapter.description,
            background_image: chapter.background_image,
            scenes: exported_scenes,
        });
    }

    Ok(StoryExport {
        story_key: story.story_key,
        title: story.title,
        description: story.description,
        cover_image: story.cover_image,
        background_image: story.background_image,
        premium: story.premium,
        diamonds_cost: story.diamonds_cost,
        chapters: exported_chapters,
    })
}

fn export_choice(
    choice: ChoiceRow,
    chapter_numbers: &HashMap<i64, i64>,
    scene_numbers: &HashMap<i64, (i64, i64)>,
) -> Result<ChoiceExport, GameError> {
    let destination = match choice.destination().map_err(|e| GameError::Invalid(e.to_string()))? {
        Destination::Scene(id) => {
            let (chapter_number, scene_number) = scene_numbers.get(&id).copied().ok_or_else(|| {
                GameError::Invalid("choice destination points outside this story".to_string())
            })?;
            DestinationExport::Scene {
                chapter_number,
                scene_number,
            }
        }
        Destination::ChapterStart(id) => {
            let chapter_number = chapter_numbers.get(&id).copied().ok_or_else(|| {
                GameError::Invalid("choice destination points outside this story".to_string())
            })?;
            DestinationExport::ChapterStart { chapter_number }
        }
    };

    Ok(ChoiceExport {
        choice_number: choice.choice_number,
        choice_text: choice.choice_text,
        destination,
        premium: choice.premium,
        diamonds_cost: choice.diamonds_cost,
        teasing_change: choice.teasing_change,
        friendship_change: choice.friendship_change,
        passion_change: choice.passion_change,
        required_teasing_level: choice.required_teasing_level,
        required_friendship_level: choice.required_friendship_level,
        required_passion_level: choice.required_passion_level,
        only_leader: choice.only_leader,
        is_locked: choice.is_locked,
        unlocked_for_teams: choice.unlocked_for_teams,
        is_legend: choice.is_legend,
    })
}

/// Rebuild a story from an exported document. Chapters and scenes land
/// first, then choices, so number-addressed destinations resolve against
/// the fresh row ids. Everything commits as one unit.
pub fn import_story(db: &Database, doc: &StoryExport) -> Result<i64, GameError> {
    db.with_conn_mut(|conn| Ok(import_tx(conn, doc)))?
}

fn import_tx(conn: &mut Connection, doc: &StoryExport) -> Result<i64, GameError> {
    let tx = conn.transaction()?;

    if content::query_story_by_key(&tx, &doc.story_key)?.is_some() {
        return Err(GameError::Invalid(format!(
            "story key already exists: {}",
            doc.story_key
        )));
    }

    let story_id = content::insert_story(
        &tx,
        &doc.story_key,
        &doc.title,
        doc.description.as_deref(),
        doc.cover_image.as_deref(),
        doc.background_image.as_deref(),
        doc.premium,
        doc.diamonds_cost,
    )?;

    let mut chapter_ids: HashMap<i64, i64> = HashMap::new();
    let mut scene_ids: HashMap<(i64, i64), i64> = HashMap::new();

    for chapter in &doc.chapters {
        let chapter_id = content::insert_chapter(
            &tx,
            story_id,
            chapter.chapter_number,
            chapter.title.as_deref(),
            chapter.description.as_deref(),
            chapter.background_image.as_deref(),
        )?;
        chapter_ids.insert(chapter.chapter_number, chapter_id);

        for scene in &chapter.scenes {
            let scene_id = content::insert_scene(
                &tx,
                chapter_id,
                scene.scene_number,
                &scene.scene_type,
                &scene.character_name,
                &scene.dialogue_text,
                scene.character_image.as_deref(),
                scene.background_image.as_deref(),
                scene.music_track.as_deref(),
                scene.position_x,
                scene.position_y,
                scene.scale,
            )?;
            scene_ids.insert((chapter.chapter_number, scene.scene_number), scene_id);
        }
    }

    for chapter in &doc.chapters {
        for scene in &chapter.scenes {
            let home = scene_ids[&(chapter.chapter_number, scene.scene_number)];
            for choice in &scene.choices {
                let (next_scene_id, next_chapter_id) = match &choice.destination {
                    DestinationExport::Scene {
                        chapter_number,
                        scene_number,
                    } => {
                        let id = scene_ids
                            .get(&(*chapter_number, *scene_number))
                            .copied()
                            .ok_or_else(|| {
                                GameError::Invalid(format!(
                                    "choice destination references missing scene {chapter_number}/{scene_number}"
                                ))
                            })?;
                        (Some(id), None)
                    }
                    DestinationExport::ChapterStart { chapter_number } => {
                        let id = chapter_ids.get(chapter_number).copied().ok_or_else(|| {
                            GameError::Invalid(format!(
                                "choice destination references missing chapter {chapter_number}"
                            ))
                        })?;
                        (None, Some(id))
                    }
                };

                content::insert_choice(
                    &tx,
                    &NewChoice {
                        scene_id: home,
                        choice_number: choice.choice_number,
                        choice_text: &choice.choice_text,
                        next_scene_id,
                        next_chapter_id,
                        premium: choice.premium,
                        diamonds_cost: choice.diamonds_cost,
                        teasing_change: choice.teasing_change,
                        friendship_change: choice.friendship_change,
                        passion_change: choice.passion_change,
                        required_teasing_level: choice.required_teasing_level,
                        required_friendship_level: choice.required_friendship_level,
                        required_passion_level: choice.required_passion_level,
                        only_leader: choice.only_leader,
                        is_locked: choice.is_locked,
                        unlocked_for_teams: choice.unlocked_for_teams.as_deref(),
                        is_legend: choice.is_legend,
                    },
                )?;
            }
        }
    }

    tx.commit()?;
    info!(story_id, story_key = %doc.story_key, "story imported");
    Ok(story_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn base_request(scene_id: i64, next_scene_id: Option<i64>) -> CreateChoiceRequest {
        CreateChoiceRequest {
            scene_id,
            choice_number: 9,
            choice_text: "New line".to_string(),
            next_scene_id,
            next_chapter_id: None,
            premium: false,
            diamonds_cost: 0,
            teasing_change: 0,
            friendship_change: 0,
            passion_change: 0,
            required_teasing_level: None,
            required_friendship_level: None,
            required_passion_level: None,
            only_leader: false,
            is_locked: false,
            unlocked_for_teams: None,
            is_legend: false,
        }
    }

    #[test]
    fn test_create_choice_rejects_missing_destination() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);

        let err = create_choice(&db, &base_request(world.scene1, None)).unwrap_err();
        assert!(matches!(err, GameError::Invalid(_)));
    }

    #[test]
    fn test_create_choice_rejects_cross_story_destination() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);

        // A second story with its own scene.
        let foreign_scene = db
            .with_conn_mut(|conn| {
                let story = content::insert_story(
                    conn, "other", "Other", None, None, None, false, 0,
                )?;
                let chapter = content::insert_chapter(conn, story, 1, None, None, None)?;
                content::insert_scene(
                    conn, chapter, 1, "normal", "Nia", "elsewhere", None, None, None, 0, 0, 1.0,
                )
            })
            .unwrap();

        let err =
            create_choice(&db, &base_request(world.scene1, Some(foreign_scene))).unwrap_err();
        assert!(matches!(err, GameError::Invalid(_)));

        let ok = create_choice(&db, &base_request(world.scene1, Some(world.scene2)));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_update_choice_keeps_destination_when_untouched() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);

        let patched = update_choice(
            &db,
            world.free_choice,
            &UpdateChoiceRequest {
                choice_text: Some("Smile wider".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(patched.choice_text, "Smile wider");
        assert_eq!(patched.next_scene_id, Some(world.scene2));
    }

    #[test]
    fn test_export_import_round_trip_preserves_gating_fields() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);

        let mut doc = export_story(&db, world.story).unwrap();
        assert_eq!(doc.chapters.len(), 2);

        doc.story_key = "first_date_copy".to_string();
        let copy_id = import_story(&db, &doc).unwrap();
        let round_trip = export_story(&db, copy_id).unwrap();

        assert_eq!(round_trip.chapters.len(), doc.chapters.len());
        let scene1_choices = &round_trip.chapters[0].scenes[0].choices;
        assert_eq!(scene1_choices.len(), 6);

        let locked = scene1_choices
            .iter()
            .find(|c| c.choice_text == "Use the secret entrance")
            .unwrap();
        assert!(locked.is_locked);
        assert_eq!(locked.unlocked_for_teams.as_deref(), Some("3;7"));

        let gated = scene1_choices
            .iter()
            .find(|c| c.choice_text == "Tease her")
            .unwrap();
        assert_eq!(gated.required_friendship_level, Some(2));
        assert_eq!(gated.teasing_change, 5);
    }

    #[test]
    fn test_import_rejects_duplicate_story_key() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);

        let doc = export_story(&db, world.story).unwrap();
        let err = import_story(&db, &doc).unwrap_err();
        assert!(matches!(err, GameError::Invalid(_)));
    }
}
