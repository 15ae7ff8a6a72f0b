//! Read-side actions: the public board and the moderation dashboard.

use chrono::Utc;
use tracing::debug;

use crate::domains::posts::actions::{ActionError, ActionResult};
use crate::domains::posts::data::{BoardData, DashboardData};
use crate::domains::posts::models::Post;
use crate::kernel::ServerDeps;

/// Build the public board. Runs the lazy expiry sweep first so stale posts
/// never render; the sweep is idempotent so concurrent reads are harmless.
pub async fn get_board(deps: &ServerDeps) -> ActionResult<BoardData> {
    let expired = Post::auto_expire(Utc::now(), &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    if expired > 0 {
        debug!(expired, "Expiry sweep retired posts");
    }

    let live = Post::list_live(&deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    Ok(BoardData::from_posts(&live))
}

/// Build the moderation dashboard: queue, live board and archive.
pub async fn get_dashboard(deps: &ServerDeps) -> ActionResult<DashboardData> {
    Post::auto_expire(Utc::now(), &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;

    let pending = Post::list_pending(&deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    let live = Post::list_live(&deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    let archive = Post::list_archive(&deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;

    Ok(DashboardData::new(&pending, &live, &archive))
}
