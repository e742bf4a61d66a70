use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the middleware. The
/// canonical definition lives here so both sides agree on the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
    pub diamonds: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
    pub diamonds: i64,
    pub is_admin: bool,
}

// -- Profile --

#[derive(Debug, Serialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    pub is_leader: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub theme: String,
    pub diamonds: i64,
    pub is_admin: bool,
    pub created_at: String,
    pub last_login: Option<String>,
    pub team: Option<TeamInfo>,
}

// -- Game catalog --

#[derive(Debug, Serialize)]
pub struct GameSummary {
    pub id: i64,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub chapters: i64,
    pub premium: bool,
    pub diamonds_cost: i64,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub accessible: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub message: String,
    pub diamonds: i64,
}

// -- Playing --

#[derive(Debug, Serialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// One selectable choice as shown to the player. Gating is resolved on the
/// server; clients never re-derive `is_available`.
#[derive(Debug, Serialize)]
pub struct ChoiceView {
    pub id: i64,
    pub choice_number: i64,
    pub text: String,
    pub premium: bool,
    pub diamonds_cost: i64,
    pub is_available: bool,
}

#[derive(Debug, Serialize)]
pub struct SceneView {
    pub scene_id: i64,
    pub chapter_id: i64,
    pub scene_type: String,
    pub character_name: String,
    pub character_image: Option<String>,
    pub background: String,
    pub music: Option<String>,
    pub dialogue: String,
    pub position: Position,
    pub scale: f64,
    pub choices: Vec<ChoiceView>,
    pub current_user_diamonds: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceRequest {
    pub choice_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputChoiceRequest {
    pub text: String,
}

/// Result of committing a choice or a linear advance. On refusal `scene_id`
/// and `chapter_id` are -1 and `next_scene` is absent.
#[derive(Debug, Serialize)]
pub struct ChoiceResponse {
    pub success: bool,
    pub message: String,
    pub scene_id: i64,
    pub chapter_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scene: Option<SceneView>,
}

#[derive(Debug, Serialize)]
pub struct LegendEntry {
    pub choice_id: i64,
    pub choice_text: String,
    pub made_at: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub message: String,
    pub diamonds: i64,
}

// -- Admin: stories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateStoryRequest {
    pub story_key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub diamonds_cost: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub background_image: Option<String>,
    pub premium: Option<bool>,
    pub diamonds_cost: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
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

// -- Admin: chapters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChapterRequest {
    pub story_id: i64,
    pub chapter_number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub background_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChapterResponse {
    pub id: i64,
    pub story_id: i64,
    pub chapter_number: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub background_image: Option<String>,
}

// -- Admin: scenes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSceneRequest {
    pub chapter_id: i64,
    pub scene_number: i64,
    #[serde(default = "default_scene_type")]
    pub scene_type: String,
    pub character_name: String,
    pub dialogue_text: String,
    #[serde(default)]
    pub character_image: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub music_track: Option<String>,
    #[serde(default)]
    pub position_x: i64,
    #[serde(default)]
    pub position_y: i64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scene_type() -> String {
    "normal".to_string()
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSceneRequest {
    pub scene_type: Option<String>,
    pub character_name: Option<String>,
    pub dialogue_text: Option<String>,
    pub character_image: Option<String>,
    pub background_image: Option<String>,
    pub music_track: Option<String>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub scale: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub id: i64,
    pub chapter_id: i64,
    pub scene_number: i64,
    pub scene_type: String,
    pub character_name: String,
    pub dialogue_text: String,
    pub character_image: Option<String>,
    pub background_image: Option<String>,
    pub music_track: Option<String>,
    pub position_x: i64,
    pub position_y: i64,
    pub scale: f64,
}

// -- Admin: choices --

/// Authoring contract for a choice. The effect and gating field names are the
/// compatibility surface for existing story content; do not rename them.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChoiceRequest {
    pub scene_id: i64,
    pub choice_number: i64,
    pub choice_text: String,
    #[serde(default)]
    pub next_scene_id: Option<i64>,
    #[serde(default)]
    pub next_chapter_id: Option<i64>,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub diamonds_cost: i64,
    #[serde(default)]
    pub teasing_change: i64,
    #[serde(default)]
    pub friendship_change: i64,
    #[serde(default)]
    pub passion_change: i64,
    #[serde(default)]
    pub required_teasing_level: Option<i64>,
    #[serde(default)]
    pub required_friendship_level: Option<i64>,
    #[serde(default)]
    pub required_passion_level: Option<i64>,
    #[serde(default)]
    pub only_leader: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub unlocked_for_teams: Option<String>,
    #[serde(default)]
    pub is_legend: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChoiceRequest {
    pub choice_text: Option<String>,
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
    pub unlocked_for_teams: Option<String>,
    pub is_legend: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceDetail {
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

// -- Admin: teams --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignTeamRequest {
    /// None removes the user from their team.
    pub team_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub leader_id: Option<i64>,
}

// -- Admin: diamond codes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCodeRequest {
    pub value: i64,
    pub remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub value: i64,
    pub remaining: i64,
}

// -- Export / import --

/// Portable story document. Destinations are addressed by chapter and scene
/// numbers so a document survives re-import into a database with fresh row
/// ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryExport {
    pub story_key: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub background_image: Option<String>,
    pub premium: bool,
    pub diamonds_cost: i64,
    pub chapters: Vec<ChapterExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterExport {
    pub chapter_number: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub background_image: Option<String>,
    pub scenes: Vec<SceneExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneExport {
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
    pub choices: Vec<ChoiceExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationExport {
    Scene { chapter_number: i64, scene_number: i64 },
    ChapterStart { chapter_number: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceExport {
    pub choice_number: i64,
    pub choice_text: String,
    pub destination: DestinationExport,
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
