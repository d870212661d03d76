//! Needs and their type-specific detail records
//!
//! A need is stored as two rows: a base row under `needs/` and one detail
//! row under `money-needs/`, `time-needs/` or `item-needs/`. [`NeedsClient`]
//! keeps the two in step for create, update and delete, and persists
//! display order changes.

mod reorder;
mod resolver;
mod types;

use futures_util::future::join_all;
use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{Error, PartialFailure, Result, Step};
use crate::fetch::{coerce_id, HttpClient, ListEnvelope};

pub use reorder::*;
pub use resolver::select_detail_id;
pub use types::*;

use crate::validate::validate_title;
use types::{NewDetailBody, NewNeedBody};

/// Result of [`NeedsClient::move_need`]
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The move was at a group boundary; nothing was sent
    NoOp,
    /// The server confirmed every changed need
    Moved(Vec<Need>),
}

/// Client for needs
#[derive(Clone)]
pub struct NeedsClient {
    http: HttpClient,
}

impl NeedsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch a single base need
    pub async fn get(&self, need_id: i64) -> Result<Need> {
        self.http
            .get(&format!("needs/{}/", need_id))
            .execute("Could not load need.")
            .await
    }

    /// `POST needs/`
    pub async fn create_base(&self, new_need: &NewNeed, need_type: NeedType) -> Result<Need> {
        let body = NewNeedBody {
            base: new_need,
            need_type,
        };
        self.http
            .post("needs/")
            .json(&body)?
            .execute("Could not create need.")
            .await
    }

    /// `PUT needs/{id}/` with the full record
    pub async fn update_base(&self, need_id: i64, record: &NeedRecord) -> Result<Need> {
        self.http
            .put(&format!("needs/{}/", need_id))
            .json(record)?
            .execute("Could not update need.")
            .await
    }

    pub async fn delete_base(&self, need_id: i64) -> Result<()> {
        self.http
            .delete(&format!("needs/{}/", need_id))
            .execute_empty("Could not delete need.")
            .await
    }

    /// Find the id of the detail row for a need.
    ///
    /// The detail endpoints are keyed by their own id, so this lookup has to
    /// run before a detail row can be updated or deleted. A 404 or an empty
    /// result yields `None`.
    pub async fn find_detail_id(&self, need_type: NeedType, need_id: i64) -> Result<Option<i64>> {
        let response = self
            .http
            .get(need_type.detail_path())
            .query("need", &need_id.to_string())
            .execute_raw()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No {} detail collection entry for need {}", need_type, need_id);
            return Ok(None);
        }
        let response = crate::fetch::ensure_success(response, "Could not find need detail.").await?;
        let rows = response.json::<ListEnvelope<Value>>().await?.into_vec();
        Ok(select_detail_id(&rows, need_id))
    }

    /// Load the detail row of a need, if it has one
    pub async fn get_detail(&self, need: &Need) -> Result<Option<NeedDetailRecord>> {
        let Some(detail_id) = self.find_detail_id(need.need_type, need.id).await? else {
            return Ok(None);
        };
        let value: Value = self
            .http
            .get(&format!("{}{}/", need.need_type.detail_path(), detail_id))
            .execute("Could not load need detail.")
            .await?;
        Ok(Some(NeedDetailRecord::from_value(need.need_type, value)?))
    }

    /// `POST {type}-needs/` with the `need` foreign key
    pub async fn create_detail(&self, need_id: i64, detail: &NeedDetail) -> Result<NeedDetailRecord> {
        let need_type = detail.need_type();
        let body = NewDetailBody {
            need: need_id,
            detail,
        };
        let value: Value = self
            .http
            .post(need_type.detail_path())
            .json(&body)?
            .execute(&format!("Could not create {} need.", need_type))
            .await?;
        record_from_response(value, need_id, detail)
    }

    /// `PUT {type}-needs/{id}/`. The body never includes `need`; the backend
    /// treats it as a one-to-one key and rejects it on write.
    pub async fn update_detail(
        &self,
        need_id: i64,
        detail_id: i64,
        detail: &NeedDetail,
    ) -> Result<NeedDetailRecord> {
        let value: Value = self
            .http
            .put(&format!("{}{}/", detail.need_type().detail_path(), detail_id))
            .json(detail)?
            .execute("Could not update need detail.")
            .await?;
        record_from_response(value, need_id, detail)
    }

    pub async fn delete_detail(&self, need_type: NeedType, detail_id: i64) -> Result<()> {
        self.http
            .delete(&format!("{}{}/", need_type.detail_path(), detail_id))
            .execute_empty(&format!("Could not delete {} need.", need_type))
            .await
    }

    /// Create a base need and then its detail row.
    ///
    /// If the detail request fails the base row stays persisted; the error
    /// is `CreateDetailFailed` and its [`PartialFailure`] carries the base id.
    pub async fn create(&self, new_need: NewNeed, detail: NeedDetail) -> Result<CreatedNeed> {
        validate_title(&new_need.title)?;
        detail.validate()?;

        let need_type = detail.need_type();
        let need = self
            .create_base(&new_need, need_type)
            .await
            .map_err(Error::into_create_base)?;
        debug!("Created base need {} ({})", need.id, need_type);

        match self.create_detail(need.id, &detail).await {
            Ok(record) => {
                debug!("Created {} detail {} for need {}", need_type, record.id, need.id);
                Ok(CreatedNeed {
                    need,
                    detail: record,
                })
            }
            Err(err) => {
                warn!(
                    "Need {} was created but its {} detail was not: {}",
                    need.id, need_type, err
                );
                Err(err.into_create_detail(PartialFailure::new(
                    vec![Step::CreateBase],
                    Step::CreateDetail,
                    Some(need.id),
                )))
            }
        }
    }

    /// Replace the base need with `changes` applied, then the detail row.
    ///
    /// The detail id is resolved before anything is written. When no detail
    /// row exists only the base is saved and the result reports
    /// [`DetailUpdate::NotFound`].
    pub async fn update(
        &self,
        need: &Need,
        changes: NeedChanges,
        detail: Option<NeedDetail>,
    ) -> Result<UpdatedNeed> {
        let record = need.to_record(&changes);
        validate_title(&record.title)?;
        if let Some(detail) = &detail {
            if detail.need_type() != need.need_type {
                return Err(Error::validation(format!(
                    "need_type: Cannot save {} details on a {} need.",
                    detail.need_type(),
                    need.need_type
                )));
            }
            detail.validate()?;
        }

        let detail_id = match &detail {
            Some(_) => self
                .find_detail_id(need.need_type, need.id)
                .await
                .map_err(Error::into_update_base)?,
            None => None,
        };

        let updated = self
            .update_base(need.id, &record)
            .await
            .map_err(Error::into_update_base)?;
        debug!("Updated base need {}", updated.id);

        let detail = match (detail, detail_id) {
            (None, _) => DetailUpdate::Unchanged,
            (Some(_), None) => {
                warn!("Need {} has no detail row; only the base was saved", need.id);
                DetailUpdate::NotFound
            }
            (Some(detail), Some(detail_id)) => {
                match self.update_detail(need.id, detail_id, &detail).await {
                    Ok(record) => DetailUpdate::Saved(record),
                    Err(err) => {
                        warn!("Need {} base saved but detail {} was not: {}", need.id, detail_id, err);
                        return Err(err.into_update_detail(PartialFailure::new(
                            vec![Step::UpdateBase],
                            Step::UpdateDetail,
                            Some(need.id),
                        )));
                    }
                }
            }
        };

        Ok(UpdatedNeed {
            need: updated,
            detail,
        })
    }

    /// Delete the detail row (if any), then the base need.
    pub async fn delete(&self, need: &Need) -> Result<()> {
        let detail_id = self
            .find_detail_id(need.need_type, need.id)
            .await
            .map_err(|err| err.into_delete(None))?;

        let mut completed = Vec::new();
        if let Some(detail_id) = detail_id {
            self.delete_detail(need.need_type, detail_id)
                .await
                .map_err(|err| err.into_delete(None))?;
            debug!("Deleted {} detail {} of need {}", need.need_type, detail_id, need.id);
            completed.push(Step::DeleteDetail);
        }

        self.delete_base(need.id).await.map_err(|err| {
            let partial = if completed.is_empty() {
                None
            } else {
                warn!("Detail of need {} deleted but the base was not: {}", need.id, err);
                Some(PartialFailure::new(completed, Step::DeleteBase, Some(need.id)))
            };
            err.into_delete(partial)
        })?;
        debug!("Deleted need {}", need.id);
        Ok(())
    }

    /// Save the sort orders of a plan, one full-record PUT per changed need.
    ///
    /// Requests run concurrently. On failure the error carries the records
    /// that were confirmed.
    pub async fn persist_order(&self, plan: &ReorderPlan) -> Result<Vec<Need>> {
        let requests = plan.changes.iter().map(|need| {
            let record = need.to_record(&NeedChanges::default());
            async move { self.update_base(need.id, &record).await }
        });

        let mut applied = Vec::new();
        let mut failure = None;
        for result in join_all(requests).await {
            match result {
                Ok(need) => applied.push(need),
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        match failure {
            None => Ok(applied),
            Some(err) => {
                warn!("Reorder failed after {} of {} updates: {}", applied.len(), plan.changes.len(), err);
                Err(Error::ReorderFailed {
                    message: err.to_string(),
                    applied,
                })
            }
        }
    }

    /// Move a need one place within its type group on `board`.
    ///
    /// The board shows the new order right away. It is committed with the
    /// server's records, or rolled back (keeping whatever the server did
    /// confirm) if any update fails.
    pub async fn move_need(
        &self,
        board: &mut NeedBoard,
        need_id: i64,
        direction: MoveDirection,
        strategy: ReorderStrategy,
    ) -> Result<MoveOutcome> {
        let Some(plan) = board.plan_move(need_id, direction, strategy) else {
            return Ok(MoveOutcome::NoOp);
        };
        board.begin_move(&plan);

        match self.persist_order(&plan).await {
            Ok(records) => {
                board.commit(records.clone());
                Ok(MoveOutcome::Moved(records))
            }
            Err(Error::ReorderFailed { message, applied }) => {
                board.rollback(applied.clone());
                Err(Error::ReorderFailed { message, applied })
            }
            Err(err) => {
                board.rollback(Vec::new());
                Err(err)
            }
        }
    }
}

/// Decode a saved detail row. The id must be present; fields the response
/// does not carry are taken from what was sent.
fn record_from_response(
    value: Value,
    need_id: i64,
    sent: &NeedDetail,
) -> Result<NeedDetailRecord> {
    let need_type = sent.need_type();
    let id = value.get("id").and_then(coerce_id).ok_or_else(|| {
        Error::general(format!("The saved {} need detail has no id.", need_type))
    })?;
    let need = value.get("need").and_then(coerce_id).unwrap_or(need_id);
    let detail = NeedDetail::from_value(need_type, value).unwrap_or_else(|err| {
        debug!("Keeping sent {} detail fields: {}", need_type, err);
        sent.clone()
    });
    Ok(NeedDetailRecord { id, need, detail })
}
