//! Read-side operations: history listing and the dashboard.

use tracing::warn;
use uuid::Uuid;

use super::AssetService;
use crate::{
  Error, Result,
  auth::{self, Identity},
  dashboard::{Dashboard, UtilizationPoint, trend_windows},
  history::{HistoryAction, HistoryCount, HistoryCursor, HistoryFilter, HistoryPage, HistoryQuery},
  store::{AssetQuery, AssetStore},
};

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

impl<S: AssetStore> AssetService<S> {
  /// One page of an asset's history, newest first.
  ///
  /// A cursor that does not decode restarts the listing from the first page.
  #[tracing::instrument(name = "assets.history", skip(self, filter, cursor), err)]
  pub async fn list_asset_history(
    &self,
    identity: Identity,
    asset_id: Uuid,
    filter: HistoryFilter,
    cursor: Option<&str>,
    page_size: Option<usize>,
  ) -> Result<HistoryPage> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    self.load_owned(&caller, asset_id).await?;

    if let (Some(from), Some(to)) = (filter.from, filter.to)
      && from > to
    {
      return Err(Error::Validation(format!("history range start {from} is after end {to}")));
    }

    let after = cursor.and_then(|raw| {
      let decoded = HistoryCursor::decode(raw);
      if decoded.is_none() {
        warn!(%asset_id, "invalid history cursor, restarting from the first page");
      }
      decoded
    });
    let limit = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let query = HistoryQuery { asset_id, filter, after, limit: limit + 1 };
    let mut page = self.store.list_history(&query).await.map_err(Error::store)?;

    let is_done = page.len() <= limit;
    page.truncate(limit);
    let continue_cursor = if is_done {
      None
    } else {
      page.last().map(|e| HistoryCursor::after(e).encode())
    };

    Ok(HistoryPage { page, is_done, continue_cursor })
  }

  /// Counts, financials, ranked alerts, location histogram and the 30-day
  /// utilization trend for one property or every managed property.
  #[tracing::instrument(name = "assets.dashboard", skip(self), err)]
  pub async fn get_asset_dashboard(
    &self,
    identity: Identity,
    property_id: Option<Uuid>,
  ) -> Result<Dashboard> {
    let caller = auth::authenticate(&*self.store, identity).await?;
    let property_ids = auth::scope(&*self.store, &caller, property_id).await?;
    let now = self.now();

    let query = AssetQuery { property_ids: property_ids.clone(), ..AssetQuery::default() };
    let assets = self.store.list_assets(&query).await.map_err(Error::store)?;

    // One ranged count per day and direction.
    let mut trend = Vec::new();
    for window in trend_windows(now) {
      let mut counts = [0_u64; 2];
      let directions = [HistoryAction::CheckOut, HistoryAction::CheckIn];
      for (slot, action) in directions.into_iter().enumerate() {
        let count = HistoryCount {
          property_ids: property_ids.clone(),
          action,
          from: window.start,
          until: window.end,
        };
        counts[slot] = self.store.count_history(&count).await.map_err(Error::store)?;
      }
      trend.push(UtilizationPoint::new(window.date, counts[0], counts[1]));
    }

    Ok(Dashboard::build(property_id, &assets, trend, now))
  }
}
