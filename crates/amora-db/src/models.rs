//! Database row types — these map directly to SQLite rows.
//! Distinct from the amora-types API models to keep the DB layer independent.

use amora_types::models::{Destination, InvalidDestination};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub theme: String,
    pub diamonds: i64,
    pub is_active: bool,
    pub is_admin: bool,
    pub failed_login_attempts: i64,
    pub locked_until: Option<String>,
    pub team_id: Option<i64>,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub leader_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct StoryRow {
    pub id: i64,
    pub story_key: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub background_image: Option<String>,
    pub premium: bool,
    pub diamonds_cost: i64,
    pub chapters_count: i64,
    pub scenes_count: i64,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct ChapterRow {
    pub id: i64,
    pub story_id: i64,
    pub chapter_number: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SceneRow {
    pub id: i64,
    pub chapter_id: i64,
    pub scene_number: i64,
    pub scene_type: String,
    pub character_name: String,
    pub character_image: Option<String>,
    pub dialogue_text: String,
    pub background_image: Option<String>,
    pub music_track: Option<String>,
    pub position_x: i64,
    pub position_y: i64,
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct ChoiceRow {
    pub id: i64,
    pub scene_id: i64,
    pub choice_number: i64,
    pub choice_text: String,
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
    pub unlocked_for_teams: Option<String>,
    pub is_legend: bool,
}

impl ChoiceRow {
    pub fn destination(&self) -> Result<Destination, InvalidDestination> {
        Destination::from_columns(self.next_scene_id, self.next_chapter_id)
    }

    /// Team ids allowed through the lock, parsed from the `;`-delimited
    /// allowlist. An absent or empty list means nobody passes while locked.
    pub fn unlocked_team_ids(&self) -> Vec<i64> {
        self.unlocked_for_teams
            .as_deref()
            .unwrap_or("")
            .split(';')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SaveStateRow {
    pub id: i64,
    pub user_id: i64,
    pub story_id: i64,
    pub chapter_id: i64,
    pub scene_id: i64,
    pub teasing_level: i64,
    pub friendship_level: i64,
    pub passion_level: i64,
}

#[derive(Debug, Clone)]
pub struct ChoiceHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub story_id: i64,
    pub choice_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct DiamondCodeRow {
    pub code: String,
    pub value: i64,
    pub remaining: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_with_teams(list: Option<&str>) -> ChoiceRow {
        ChoiceRow {
            id: 1,
            scene_id: 1,
            choice_number: 1,
            choice_text: "hi".into(),
            next_scene_id: Some(2),
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
            is_locked: true,
            unlocked_for_teams: list.map(str::to_string),
            is_legend: false,
        }
    }

    #[test]
    fn test_unlocked_team_ids_parses_delimited_list() {
        assert_eq!(choice_with_teams(Some("3;7")).unlocked_team_ids(), vec![3, 7]);
        assert_eq!(choice_with_teams(Some(" 3 ; 7 ")).unlocked_team_ids(), vec![3, 7]);
        assert!(choice_with_teams(Some("")).unlocked_team_ids().is_empty());
        assert!(choice_with_teams(None).unlocked_team_ids().is_empty());
    }
}
