//! Shared test fixtures: an in-memory database seeded with a small story
//! tree exercising every gating flavor.

use amora_db::Database;
use amora_db::content::{self, NewChoice};
use amora_db::queries;

pub struct World {
    pub story: i64,
    pub chapter1: i64,
    pub chapter2: i64,
    pub scene1: i64,
    pub scene2: i64,
    pub input_scene: i64,
    pub chapter2_scene: i64,
    pub free_choice: i64,
    pub premium_choice: i64,
    pub gated_choice: i64,
    pub leader_choice: i64,
    pub locked_choice: i64,
    pub dead_locked_choice: i64,
    pub chapter_jump_choice: i64,
    pub input_answer_choice: i64,
}

pub fn db() -> Database {
    Database::open_in_memory().expect("in-memory db")
}

pub fn seed_user(db: &Database, name: &str, diamonds: i64) -> i64 {
    db.create_user(
        name,
        &format!("{name}@example.com"),
        "$argon2id$test$hash",
        name,
        diamonds,
    )
    .expect("seed user")
}

/// Create a team led by `leader`; `members` join without the leader role.
pub fn seed_team(db: &Database, name: &str, leader: i64, members: &[i64]) -> i64 {
    db.with_conn_mut(|conn| {
        let team = queries::insert_team(conn, name, Some(leader))?;
        queries::set_user_team(conn, leader, Some(team))?;
        for member in members {
            queries::set_user_team(conn, *member, Some(team))?;
        }
        Ok(team)
    })
    .expect("seed team")
}

/// Two chapters; chapter 1 holds a normal scene packed with gated choices, a
/// plain follow-up scene and a free-text scene; chapter 2 opens on a single
/// scene. All choices on scene 1 lead to scene 2.
pub fn seed_world(db: &Database) -> World {
    db.with_conn_mut(|conn| {
        let story = content::insert_story(
            conn,
            "first_date",
            "First Date",
            Some("a test story"),
            None,
            None,
            false,
            0,
        )?;
        content::update_story(conn, story, None, None, None, None, None, None, Some(true))?;

        let chapter1 = content::insert_chapter(conn, story, 1, Some("Meeting"), None, None)?;
        let chapter2 = content::insert_chapter(conn, story, 2, Some("Evening"), None, None)?;

        let scene1 = content::insert_scene(
            conn, chapter1, 1, "normal", "Mira", "Hello, {name}!", None, None, None, 0, 0, 1.0,
        )?;
        let scene2 = content::insert_scene(
            conn, chapter1, 2, "normal", "Mira", "And then?", None, None, None, 0, 0, 1.0,
        )?;
        let input_scene = content::insert_scene(
            conn,
            chapter1,
            3,
            "input",
            "Mira",
            "What was my cat called?",
            None,
            None,
            None,
            0,
            0,
            1.0,
        )?;
        let chapter2_scene = content::insert_scene(
            conn, chapter2, 1, "normal", "Mira", "A new evening.", None, None, None, 0, 0, 1.0,
        )?;

        let free_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 1,
                choice_text: "Smile back",
                next_scene_id: Some(scene2),
                teasing_change: 1,
                friendship_change: 2,
                passion_change: 3,
                ..Default::default()
            },
        )?;
        let premium_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 2,
                choice_text: "Bring roses",
                next_scene_id: Some(scene2),
                premium: true,
                diamonds_cost: 10,
                ..Default::default()
            },
        )?;
        let gated_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 3,
                choice_text: "Tease her",
                next_scene_id: Some(scene2),
                teasing_change: 5,
                friendship_change: 5,
                passion_change: 5,
                required_teasing_level: Some(1),
                required_friendship_level: Some(2),
                required_passion_level: Some(1),
                ..Default::default()
            },
        )?;
        let leader_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 4,
                choice_text: "Speak for the team",
                next_scene_id: Some(scene2),
                only_leader: true,
                ..Default::default()
            },
        )?;
        let locked_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 5,
                choice_text: "Use the secret entrance",
                next_scene_id: Some(scene2),
                is_locked: true,
                unlocked_for_teams: Some("3;7"),
                ..Default::default()
            },
        )?;
        let dead_locked_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene1,
                choice_number: 6,
                choice_text: "Open the sealed door",
                next_scene_id: Some(scene2),
                is_locked: true,
                ..Default::default()
            },
        )?;
        let chapter_jump_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: scene2,
                choice_number: 1,
                choice_text: "Call it a night",
                next_chapter_id: Some(chapter2),
                is_legend: true,
                ..Default::default()
            },
        )?;
        let input_answer_choice = content::insert_choice(
            conn,
            &NewChoice {
                scene_id: input_scene,
                choice_number: 1,
                choice_text: "Biscuit",
                next_chapter_id: Some(chapter2),
                friendship_change: 1,
                ..Default::default()
            },
        )?;

        Ok(World {
            story,
            chapter1,
            chapter2,
            scene1,
            scene2,
            input_scene,
            chapter2_scene,
            free_choice,
            premium_choice,
            gated_choice,
            leader_choice,
            locked_choice,
            dead_locked_choice,
            chapter_jump_choice,
            input_answer_choice,
        })
    })
    .expect("seed world")
}
