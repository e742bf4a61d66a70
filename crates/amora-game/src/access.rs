//! Story access and purchase.

use amora_db::Database;
use amora_db::content;
use amora_db::queries;
use rusqlite::Connection;
use tracing::info;

use crate::error::GameError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub accessible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    pub success: bool,
    pub message: String,
    pub diamonds: i64,
}

/// Whether the user may open a story: it must be published, and premium
/// stories must have been purchased first.
pub fn check(db: &Database, user_id: i64, story_id: i64) -> Result<AccessDecision, GameError> {
    db.with_conn(|conn| Ok(check_conn(conn, user_id, story_id)))?
}

fn check_conn(conn: &Connection, user_id: i64, story_id: i64) -> Result<AccessDecision, GameError> {
    let story = content::query_story(conn, story_id)?.ok_or(GameError::NotFound("story"))?;

    if !story.is_published {
        return Ok(AccessDecision {
            accessible: false,
            message: "This story is not published yet".to_string(),
        });
    }

    if !story.premium || queries::has_unlock(conn, user_id, story_id)? {
        return Ok(AccessDecision {
            accessible: true,
            message: "Story is available".to_string(),
        });
    }

    Ok(AccessDecision {
        accessible: false,
        message: format!("This story costs {} diamonds", story.diamonds_cost),
    })
}

/// Unlock a premium story: conditional debit plus the unlock row, one
/// transaction.
pub fn purchase(db: &Database, user_id: i64, story_id: i64) -> Result<PurchaseOutcome, GameError> {
    db.with_conn_mut(|conn| Ok(purchase_tx(conn, user_id, story_id)))?
}

fn purchase_tx(
    conn: &mut Connection,
    user_id: i64,
    story_id: i64,
) -> Result<PurchaseOutcome, GameError> {
    let tx = conn.transaction()?;

    let story = content::query_story(&tx, story_id)?.ok_or(GameError::NotFound("story"))?;
    let user = queries::get_user(&tx, user_id)?.ok_or(GameError::NotFound("user"))?;

    if !story.is_published {
        return Ok(PurchaseOutcome {
            success: false,
            message: "This story is not published yet".to_string(),
            diamonds: user.diamonds,
        });
    }

    if !story.premium {
        return Ok(PurchaseOutcome {
            success: true,
            message: "Story is free".to_string(),
            diamonds: user.diamonds,
        });
    }

    if queries::has_unlock(&tx, user_id, story_id)? {
        return Ok(PurchaseOutcome {
            success: true,
            message: "Story is already unlocked".to_string(),
            diamonds: user.diamonds,
        });
    }

    if !queries::debit_diamonds(&tx, user_id, story.diamonds_cost)? {
        return Ok(PurchaseOutcome {
            success: false,
            message: format!("Not enough diamonds. {} required", story.diamonds_cost),
            diamonds: user.diamonds,
        });
    }
    queries::insert_unlock(&tx, user_id, story_id)?;

    let balance = queries::get_user(&tx, user_id)?
        .map(|u| u.diamonds)
        .unwrap_or(0);
    tx.commit()?;

    info!(user_id, story_id, "story purchased");
    Ok(PurchaseOutcome {
        success: true,
        message: "Story unlocked".to_string(),
        diamonds: balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn seed_premium_story(db: &amora_db::Database, cost: i64, published: bool) -> i64 {
        db.with_conn_mut(|conn| {
            let story = content::insert_story(
                conn,
                "velvet_nights",
                "Velvet Nights",
                None,
                None,
                None,
                true,
                cost,
            )?;
            content::update_story(
                conn,
                story,
                None,
                None,
                None,
                None,
                None,
                None,
                Some(published),
            )?;
            Ok(story)
        })
        .unwrap()
    }

    #[test]
    fn test_free_published_story_is_accessible() {
        let db = fixtures::db();
        let world = fixtures::seed_world(&db);
        let user = fixtures::seed_user(&db, "ann", 0);

        let decision = check(&db, user, world.story).unwrap();
        assert!(decision.accessible);
    }

    #[test]
    fn test_unpublished_story_is_not_accessible() {
        let db = fixtures::db();
        fixtures::seed_world(&db);
        let story = seed_premium_story(&db, 10, false);
        let user = fixtures::seed_user(&db, "ann", 100);

        let decision = check(&db, user, story).unwrap();
        assert!(!decision.accessible);
        assert!(decision.message.contains("not published"));
    }

    #[test]
    fn test_purchase_debits_once_and_unlocks() {
        let db = fixtures::db();
        fixtures::seed_world(&db);
        let story = seed_premium_story(&db, 30, true);
        let user = fixtures::seed_user(&db, "ann", 100);

        assert!(!check(&db, user, story).unwrap().accessible);

        let bought = purchase(&db, user, story).unwrap();
        assert!(bought.success);
        assert_eq!(bought.diamonds, 70);
        assert!(check(&db, user, story).unwrap().accessible);

        // Buying again is a no-op, not a second debit.
        let again = purchase(&db, user, story).unwrap();
        assert!(again.success);
        assert_eq!(again.diamonds, 70);
    }

    #[test]
    fn test_purchase_refuses_overdraft() {
        let db = fixtures::db();
        fixtures::seed_world(&db);
        let story = seed_premium_story(&db, 30, true);
        let user = fixtures::seed_user(&db, "ann", 5);

        let outcome = purchase(&db, user, story).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("Not enough diamonds"));
        assert_eq!(outcome.diamonds, 5);
        assert!(!check(&db, user, story).unwrap().accessible);
    }
}
