//! Admin endpoints: story-tree CRUD, export/import, diamond codes and
//! progress resets. Everything here sits behind the admin middleware.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use amora_db::content;
use amora_db::models::{ChapterRow, ChoiceRow, SceneRow, StoryRow};
use amora_game::authoring;
use amora_types::api::{
    AssignTeamRequest, ChapterResponse, ChoiceDetail, CodeResponse, CreateChapterRequest,
    CreateChoiceRequest, CreateCodeRequest, CreateSceneRequest, CreateStoryRequest,
    CreateTeamRequest, SceneResponse, StoryExport, StoryResponse, TeamResponse,
    UpdateChapterRequest, UpdateChoiceRequest, UpdateSceneRequest, UpdateStoryRequest,
};
use amora_types::models::SceneKind;

use crate::auth::AppState;
use crate::error::ApiError;

fn story_response(story: StoryRow) -> StoryResponse {
    StoryResponse {
        id: story.id,
        story_key: story.story_key,
        title: story.title,
        description: story.description,
        cover_image: story.cover_image,
        background_image: story.background_image,
        premium: story.premium,
        diamonds_cost: story.diamonds_cost,
        chapters_count: story.chapters_count,
        scenes_count: story.scenes_count,
        is_published: story.is_published,
    }
}

fn chapter_response(chapter: ChapterRow) -> ChapterResponse {
    ChapterResponse {
        id: chapter.id,
        story_id: chapter.story_id,
        chapter_number: chapter.chapter_number,
        title: chapter.title,
        description: chapter.description,
        background_image: chapter.background_image,
    }
}

fn scene_response(scene: SceneRow) -> SceneResponse {
    SceneResponse {
        id: scene.id,
        chapter_id: scene.chapter_id,
        scene_number: scene.scene_number,
        scene_type: scene.scene_type,
        character_name: scene.character_name,
        dialogue_text: scene.dialogue_text,
        character_image: scene.character_image,
        background_image: scene.background_image,
        music_track: scene.music_track,
        position_x: scene.position_x,
        position_y: scene.position_y,
        scale: scene.scale,
    }
}

fn choice_detail(choice: ChoiceRow) -> ChoiceDetail {
    ChoiceDetail {
        id: choice.id,
        scene_id: choice.scene_id,
        choice_number: choice.choice_number,
        choice_text: choice.choice_text,
        next_scene_id: choice.next_scene_id,
        next_chapter_id: choice.next_chapter_id,
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
    }
}

// -- Stories --

pub async fn list_stories(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    let stories = state.db.list_stories(false)?;
    Ok(Json(stories.into_iter().map(story_response).collect()))
}

pub async fn create_story(
    State(state): State<AppState>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let story_key = req.story_key.trim();
    if story_key.is_empty() {
        return Err(ApiError::Validation("story key must not be empty".to_string()));
    }
    if state.db.get_story_by_key(story_key)?.is_some() {
        return Err(ApiError::Validation("story key already exists".to_string()));
    }

    let id = state.db.with_conn_mut(|conn| {
        content::insert_story(
            conn,
            story_key,
            &req.title,
            req.description.as_deref(),
            req.cover_image.as_deref(),
            req.background_image.as_deref(),
            req.premium,
            req.diamonds_cost,
        )
    })?;

    let story = state.db.get_story(id)?.ok_or(ApiError::NotFound("story"))?;
    Ok((StatusCode::CREATED, Json(story_response(story))))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Json<StoryResponse>, ApiError> {
    let story = state
        .db
        .get_story(story_id)?
        .ok_or(ApiError::NotFound("story"))?;
    Ok(Json(story_response(story)))
}

pub async fn update_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
    Json(req): Json<UpdateStoryRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    let changed = state.db.with_conn_mut(|conn| {
        content::update_story(
            conn,
            story_id,
            req.title.as_deref(),
            req.description.as_deref(),
            req.cover_image.as_deref(),
            req.background_image.as_deref(),
            req.premium,
            req.diamonds_cost,
            req.is_published,
        )
    })?;
    if !changed {
        return Err(ApiError::NotFound("story"));
    }

    let story = state
        .db
        .get_story(story_id)?
        .ok_or(ApiError::NotFound("story"))?;
    Ok(Json(story_response(story)))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .db
        .with_conn_mut(|conn| content::delete_story(conn, story_id))?;
    if !deleted {
        return Err(ApiError::NotFound("story"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn export_story(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Json<StoryExport>, ApiError> {
    Ok(Json(authoring::export_story(&state.db, story_id)?))
}

pub async fn import_story(
    State(state): State<AppState>,
    Json(doc): Json<StoryExport>,
) -> Result<impl IntoResponse, ApiError> {
    let id = authoring::import_story(&state.db, &doc)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

// -- Chapters --

pub async fn list_chapters(
    State(state): State<AppState>,
    Path(story_id): Path<i64>,
) -> Result<Json<Vec<ChapterResponse>>, ApiError> {
    if state.db.get_story(story_id)?.is_none() {
        return Err(ApiError::NotFound("story"));
    }
    let chapters = state.db.chapters_by_story(story_id)?;
    Ok(Json(chapters.into_iter().map(chapter_response).collect()))
}

pub async fn create_chapter(
    State(state): State<AppState>,
    Json(req): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_story(req.story_id)?.is_none() {
        return Err(ApiError::NotFound("story"));
    }
    let duplicate = state
        .db
        .chapters_by_story(req.story_id)?
        .iter()
        .any(|c| c.chapter_number == req.chapter_number);
    if duplicate {
        return Err(ApiError::Validation(format!(
            "chapter {} already exists in this story",
            req.chapter_number
        )));
    }

    let id = state.db.with_conn_mut(|conn| {
        content::insert_chapter(
            conn,
            req.story_id,
            req.chapter_number,
            req.title.as_deref(),
            req.description.as_deref(),
            req.background_image.as_deref(),
        )
    })?;

    let chapter = state
        .db
        .get_chapter(id)?
        .ok_or(ApiError::NotFound("chapter"))?;
    Ok((StatusCode::CREATED, Json(chapter_response(chapter))))
}

pub async fn update_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
    Json(req): Json<UpdateChapterRequest>,
) -> Result<Json<ChapterResponse>, ApiError> {
    let changed = state.db.with_conn_mut(|conn| {
        content::update_chapter(
            conn,
            chapter_id,
            req.title.as_deref(),
            req.description.as_deref(),
            req.background_image.as_deref(),
        )
    })?;
    if !changed {
        return Err(ApiError::NotFound("chapter"));
    }

    let chapter = state
        .db
        .get_chapter(chapter_id)?
        .ok_or(ApiError::NotFound("chapter"))?;
    Ok(Json(chapter_response(chapter)))
}

pub async fn delete_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .db
        .with_conn_mut(|conn| content::delete_chapter(conn, chapter_id))?;
    if !deleted {
        return Err(ApiError::NotFound("chapter"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// -- Scenes --

pub async fn list_scenes(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> Result<Json<Vec<SceneResponse>>, ApiError> {
    if state.db.get_chapter(chapter_id)?.is_none() {
        return Err(ApiError::NotFound("chapter"));
    }
    let scenes = state.db.scenes_by_chapter(chapter_id)?;
    Ok(Json(scenes.into_iter().map(scene_response).collect()))
}

pub async fn create_scene(
    State(state): State<AppState>,
    Json(req): Json<CreateSceneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.scene_type
        .parse::<SceneKind>()
        .map_err(ApiError::Validation)?;

    if state.db.get_chapter(req.chapter_id)?.is_none() {
        return Err(ApiError::NotFound("chapter"));
    }
    let duplicate = state
        .db
        .scenes_by_chapter(req.chapter_id)?
        .iter()
        .any(|s| s.scene_number == req.scene_number);
    if duplicate {
        return Err(ApiError::Validation(format!(
            "scene {} already exists in this chapter",
            req.scene_number
        )));
    }

    let id = state.db.with_conn_mut(|conn| {
        content::insert_scene(
            conn,
            req.chapter_id,
            req.scene_number,
            &req.scene_type,
            &req.character_name,
            &req.dialogue_text,
            req.character_image.as_deref(),
            req.background_image.as_deref(),
            req.music_track.as_deref(),
            req.position_x,
            req.position_y,
            req.scale,
        )
    })?;

    let scene = state.db.get_scene(id)?.ok_or(ApiError::NotFound("scene"))?;
    Ok((StatusCode::CREATED, Json(scene_response(scene))))
}

pub async fn update_scene(
    State(state): State<AppState>,
    Path(scene_id): Path<i64>,
    Json(req): Json<UpdateSceneRequest>,
) -> Result<Json<SceneResponse>, ApiError> {
    if let Some(scene_type) = req.scene_type.as_deref() {
        scene_type
            .parse::<SceneKind>()
            .map_err(ApiError::Validation)?;
    }

    let changed = state.db.with_conn_mut(|conn| {
        content::update_scene(
            conn,
            scene_id,
            req.scene_type.as_deref(),
            req.character_name.as_deref(),
            req.dialogue_text.as_deref(),
            req.character_image.as_deref(),
            req.background_image.as_deref(),
            req.music_track.as_deref(),
            req.position_x,
            req.position_y,
            req.scale,
        )
    })?;
    if !changed {
        return Err(ApiError::NotFound("scene"));
    }

    let scene = state
        .db
        .get_scene(scene_id)?
        .ok_or(ApiError::NotFound("scene"))?;
    Ok(Json(scene_response(scene)))
}

pub async fn delete_scene(
    State(state): State<AppState>,
    Path(scene_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .db
        .with_conn_mut(|conn| content::delete_scene(conn, scene_id))?;
    if !deleted {
        return Err(ApiError::NotFound("scene"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// -- Choices --

pub async fn list_choices(
    State(state): State<AppState>,
    Path(scene_id): Path<i64>,
) -> Result<Json<Vec<ChoiceDetail>>, ApiError> {
    if state.db.get_scene(scene_id)?.is_none() {
        return Err(ApiError::NotFound("scene"));
    }
    let choices = state.db.choices_by_scene(scene_id)?;
    Ok(Json(choices.into_iter().map(choice_detail).collect()))
}

pub async fn get_choice(
    State(state): State<AppState>,
    Path(choice_id): Path<i64>,
) -> Result<Json<ChoiceDetail>, ApiError> {
    let choice = state
        .db
        .get_choice(choice_id)?
        .ok_or(ApiError::NotFound("choice"))?;
    Ok(Json(choice_detail(choice)))
}

pub async fn create_choice(
    State(state): State<AppState>,
    Json(req): Json<CreateChoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let row = authoring::create_choice(&state.db, &req)?;
    Ok((StatusCode::CREATED, Json(choice_detail(row))))
}

pub async fn update_choice(
    State(state): State<AppState>,
    Path(choice_id): Path<i64>,
    Json(req): Json<UpdateChoiceRequest>,
) -> Result<Json<ChoiceDetail>, ApiError> {
    let row = authoring::update_choice(&state.db, choice_id, &req)?;
    Ok(Json(choice_detail(row)))
}

pub async fn delete_choice(
    State(state): State<AppState>,
    Path(choice_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .db
        .with_conn_mut(|conn| content::delete_choice(conn, choice_id))?;
    if !deleted {
        return Err(ApiError::NotFound("choice"));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

// -- Teams --

pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("team name must not be empty".to_string()));
    }
    if let Some(leader_id) = req.leader_id {
        if state.db.get_user_by_id(leader_id)?.is_none() {
            return Err(ApiError::NotFound("user"));
        }
    }

    let team = state.db.with_conn_mut(|conn| {
        let id = amora_db::queries::insert_team(conn, name, req.leader_id)?;
        // The leader joins their own team.
        if let Some(leader_id) = req.leader_id {
            amora_db::queries::set_user_team(conn, leader_id, Some(id))?;
        }
        Ok(id)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            id: team,
            name: name.to_string(),
            leader_id: req.leader_id,
        }),
    ))
}

pub async fn assign_team(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<AssignTeamRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }
    if let Some(team_id) = req.team_id {
        if state.db.get_team(team_id)?.is_none() {
            return Err(ApiError::NotFound("team"));
        }
    }

    state
        .db
        .with_conn_mut(|conn| amora_db::queries::set_user_team(conn, user_id, req.team_id))?;

    Ok(Json(serde_json::json!({ "success": true })))
}

// -- Diamond codes --

pub async fn create_code(
    State(state): State<AppState>,
    Json(req): Json<CreateCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.value <= 0 || req.remaining <= 0 {
        return Err(ApiError::Validation(
            "code value and remaining uses must be positive".to_string(),
        ));
    }

    let code = Uuid::new_v4().to_string();
    state.db.create_diamond_code(&code, req.value, req.remaining)?;

    Ok((
        StatusCode::CREATED,
        Json(CodeResponse {
            code,
            value: req.value,
            remaining: req.remaining,
        }),
    ))
}

// -- Users --

pub async fn reset_progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.db.get_user_by_id(user_id)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }
    state.db.reset_progress(user_id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "user progress has been reset"
    })))
}
