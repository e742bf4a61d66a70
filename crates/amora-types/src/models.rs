//! Domain value types shared between the persistence layer, the game core
//! and the API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a committed choice sends the player.
///
/// Stored as two nullable columns (`next_scene_id` / `next_chapter_id`) for
/// compatibility with authored content, but decoded into this enum so the
/// mutual-exclusivity invariant is checked in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Jump to a specific scene (and its owning chapter).
    Scene(i64),
    /// Jump to the first scene of a chapter.
    ChapterStart(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a choice must target exactly one of next_scene_id or next_chapter_id")]
pub struct InvalidDestination;

impl Destination {
    pub fn from_columns(
        next_scene_id: Option<i64>,
        next_chapter_id: Option<i64>,
    ) -> Result<Self, InvalidDestination> {
        match (next_scene_id, next_chapter_id) {
            (Some(scene), None) => Ok(Self::Scene(scene)),
            (None, Some(chapter)) => Ok(Self::ChapterStart(chapter)),
            _ => Err(InvalidDestination),
        }
    }
}

/// How a scene is played: enumerated choices, or a free-text prompt that is
/// matched against the scene's choice texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Normal,
    Input,
}

impl SceneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Input => "input",
        }
    }
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "input" => Ok(Self::Input),
            other => Err(format!("unknown scene type: {other}")),
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_requires_exactly_one_target() {
        assert_eq!(
            Destination::from_columns(Some(7), None),
            Ok(Destination::Scene(7))
        );
        assert_eq!(
            Destination::from_columns(None, Some(3)),
            Ok(Destination::ChapterStart(3))
        );
        assert!(Destination::from_columns(None, None).is_err());
        assert!(Destination::from_columns(Some(7), Some(3)).is_err());
    }

    #[test]
    fn test_scene_kind_round_trip() {
        assert_eq!("input".parse::<SceneKind>(), Ok(SceneKind::Input));
        assert_eq!(SceneKind::Normal.as_str(), "normal");
        assert!("cutscene".parse::<SceneKind>().is_err());
    }
}
