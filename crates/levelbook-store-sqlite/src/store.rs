//! [`SqliteStore`], the SQLite implementation of [`SurveyStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use levelbook_core::{
  row::{NewRow, Row},
  store::SurveyStore,
  survey::{NewPurpose, NewSurvey, Purpose, PurposeStatus, Survey},
};

use crate::{
  Error, Result,
  encode::{
    RawPurpose, RawRow, RawSurvey, encode_dt, encode_phase,
    encode_reading, encode_reduction, encode_status, encode_uuid,
  },
  schema::{PRAGMAS, SCHEMA, SCHEMA_VERSION},
};

type CoreResult<T> = std::result::Result<T, levelbook_core::Error>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A levelbook store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        let version: i64 =
          conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if version < SCHEMA_VERSION {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert `row` as the next observation of `purpose_id`, refusing it unless
  /// the purpose is accepting rows and `row.seq` follows the last row.
  ///
  /// With `replace_last`, the last row is treated as provisional: it is
  /// deleted and `row` takes its `seq`, and the purpose becomes active again.
  async fn write_row(
    &self,
    purpose_id: Uuid,
    row: NewRow,
    replace_last: bool,
  ) -> Result<Row> {
    let recorded_at = Utc::now();

    let id_str         = encode_uuid(purpose_id);
    let reading_json   = encode_reading(&row.reading)?;
    let reduction_json = encode_reduction(&row.reduction)?;
    let at_str         = encode_dt(recorded_at);
    let remarks        = row.remarks.clone();
    let seq            = row.seq;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some((status, last_seq)) = purpose_state(&tx, &id_str)? else {
          return Ok(Err(levelbook_core::Error::PurposeNotFound(purpose_id)));
        };

        let expected = match (status.as_str(), replace_last) {
          ("finished", _) => {
            return Ok(Err(levelbook_core::Error::PurposeFinished(purpose_id)));
          }
          ("paused", false) => {
            return Ok(Err(levelbook_core::Error::PurposePaused(purpose_id)));
          }
          ("paused", true) => last_seq.max(1),
          (_, true) => {
            return Ok(Err(levelbook_core::Error::PurposeNotPaused(purpose_id)));
          }
          (_, false) => last_seq + 1,
        };
        if seq != expected {
          return Ok(Err(levelbook_core::Error::SequenceConflict {
            expected,
            found: seq,
          }));
        }

        if replace_last {
          tx.execute(
            "DELETE FROM observations WHERE purpose_id = ?1 AND seq = ?2",
            rusqlite::params![id_str, seq],
          )?;
          tx.execute(
            "UPDATE purposes SET status = 'active' WHERE purpose_id = ?1",
            rusqlite::params![id_str],
          )?;
        }

        tx.execute(
          "INSERT INTO observations (
             purpose_id, seq, reading_json, remarks, reduction_json, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, seq, reading_json, remarks, reduction_json, at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::debug!(
      purpose = %purpose_id,
      seq,
      kind = row.reading.discriminant(),
      replaced = replace_last,
      "row committed"
    );

    Ok(Row {
      seq,
      reading: row.reading,
      remarks: row.remarks,
      reduction: Some(row.reduction),
      recorded_at,
    })
  }

  /// Move a purpose to `to`, checking its current status first.
  async fn set_purpose_status(
    &self,
    purpose_id: Uuid,
    to: PurposeStatus,
    final_fore_sight: Option<f64>,
  ) -> Result<Purpose> {
    let id_str = encode_uuid(purpose_id);
    let to_str = encode_status(to);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some((status, _)) = purpose_state(&tx, &id_str)? else {
          return Ok(Err(levelbook_core::Error::PurposeNotFound(purpose_id)));
        };
        match status.as_str() {
          "finished" => {
            return Ok(Err(levelbook_core::Error::PurposeFinished(purpose_id)));
          }
          "paused" if to == PurposeStatus::Finished => {
            return Ok(Err(levelbook_core::Error::PurposePaused(purpose_id)));
          }
          _ => {}
        }
        tx.execute(
          "UPDATE purposes
           SET status = ?2, final_fore_sight = COALESCE(?3, final_fore_sight)
           WHERE purpose_id = ?1",
          rusqlite::params![id_str, to_str, final_fore_sight],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    tracing::info!(purpose = %purpose_id, status = to_str, "purpose status changed");

    self
      .get_purpose(purpose_id)
      .await?
      .ok_or(Error::Core(levelbook_core::Error::PurposeNotFound(purpose_id)))
  }
}

/// Status and last `seq` of a purpose, or `None` if it does not exist.
fn purpose_state(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<(String, u32)>> {
  conn
    .query_row(
      "SELECT p.status, COALESCE(MAX(o.seq), 0)
       FROM purposes p
       LEFT JOIN observations o ON o.purpose_id = p.purpose_id
       WHERE p.purpose_id = ?1
       GROUP BY p.purpose_id",
      rusqlite::params![id_str],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()
}

fn load_rows(conn: &rusqlite::Connection, id_str: &str) -> rusqlite::Result<Vec<RawRow>> {
  let sql = format!(
    "SELECT {} FROM observations WHERE purpose_id = ?1 ORDER BY seq",
    RawRow::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(rusqlite::params![id_str], RawRow::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn create_survey(&self, input: NewSurvey) -> Result<Survey> {
    let survey = Survey {
      survey_id:         Uuid::new_v4(),
      name:              input.name,
      instrument:        input.instrument,
      datum_rl:          input.datum_rl,
      chainage_multiple: input.chainage_multiple,
      finished:          false,
      created_at:        Utc::now(),
    };

    let id_str     = encode_uuid(survey.survey_id);
    let name       = survey.name.clone();
    let instrument = survey.instrument.clone();
    let datum_rl   = survey.datum_rl;
    let multiple   = survey.chainage_multiple;
    let at_str     = encode_dt(survey.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO surveys (
             survey_id, name, instrument, datum_rl, chainage_multiple, finished, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
          rusqlite::params![id_str, name, instrument, datum_rl, multiple, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(survey = %survey.survey_id, name = %survey.name, "survey created");
    Ok(survey)
  }

  async fn get_survey(&self, id: Uuid) -> Result<Option<Survey>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSurvey> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM surveys WHERE survey_id = ?1", RawSurvey::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawSurvey::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSurvey::into_survey).transpose()
  }

  async fn list_surveys(&self) -> Result<Vec<Survey>> {
    let raws: Vec<RawSurvey> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM surveys ORDER BY created_at, rowid",
          RawSurvey::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawSurvey::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSurvey::into_survey).collect()
  }

  async fn finish_survey(&self, id: Uuid) -> Result<Survey> {
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE surveys SET finished = 1 WHERE survey_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    if updated == 0 {
      return Err(levelbook_core::Error::SurveyNotFound(id).into());
    }

    tracing::info!(survey = %id, "survey finished");
    self
      .get_survey(id)
      .await?
      .ok_or(Error::Core(levelbook_core::Error::SurveyNotFound(id)))
  }

  // ── Purposes ──────────────────────────────────────────────────────────────

  async fn create_purpose(&self, input: NewPurpose) -> Result<Purpose> {
    let purpose = Purpose {
      purpose_id:       Uuid::new_v4(),
      survey_id:        input.survey_id,
      kind:             input.kind,
      phase:            input.phase,
      status:           PurposeStatus::Active,
      final_fore_sight: None,
      rows:             Vec::new(),
      created_at:       Utc::now(),
    };

    let survey_id  = purpose.survey_id;
    let id_str     = encode_uuid(purpose.purpose_id);
    let survey_str = encode_uuid(survey_id);
    let kind_str   = purpose.kind.to_string();
    let phase_str  = encode_phase(purpose.phase);
    let status_str = encode_status(purpose.status);
    let at_str     = encode_dt(purpose.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let finished: Option<bool> = tx
          .query_row(
            "SELECT finished FROM surveys WHERE survey_id = ?1",
            rusqlite::params![survey_str],
            |r| r.get(0),
          )
          .optional()?;
        match finished {
          None => return Ok(Err(levelbook_core::Error::SurveyNotFound(survey_id))),
          Some(true) => return Ok(Err(levelbook_core::Error::SurveyFinished(survey_id))),
          Some(false) => {}
        }
        tx.execute(
          "INSERT INTO purposes (
             purpose_id, survey_id, kind, phase, status, final_fore_sight, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
          rusqlite::params![id_str, survey_str, kind_str, phase_str, status_str, at_str],
        )?;
        tx.commit()?;
        Ok(CoreResult::Ok(()))
      })
      .await??;

    tracing::info!(
      survey = %purpose.survey_id,
      purpose = %purpose.purpose_id,
      kind = %purpose.kind,
      phase = %purpose.phase,
      "purpose started"
    );
    Ok(purpose)
  }

  async fn get_purpose(&self, id: Uuid) -> Result<Option<Purpose>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawPurpose, Vec<RawRow>)> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM purposes WHERE purpose_id = ?1", RawPurpose::COLUMNS);
        let Some(purpose) = conn
          .query_row(&sql, rusqlite::params![id_str], RawPurpose::from_row)
          .optional()?
        else {
          return Ok(None);
        };
        let rows = load_rows(conn, &id_str)?;
        Ok(Some((purpose, rows)))
      })
      .await?;

    raw.map(|(p, rows)| p.into_purpose(rows)).transpose()
  }

  async fn list_purposes(&self, survey_id: Uuid) -> Result<Vec<Purpose>> {
    let survey_str = encode_uuid(survey_id);

    let (raws, mut rows): (Vec<RawPurpose>, HashMap<String, Vec<RawRow>>) = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM purposes WHERE survey_id = ?1 ORDER BY created_at, rowid",
          RawPurpose::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let purposes = stmt
          .query_map(rusqlite::params![survey_str], RawPurpose::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let sql = format!(
          "SELECT {} FROM observations o
           JOIN purposes p ON p.purpose_id = o.purpose_id
           WHERE p.survey_id = ?1
           ORDER BY o.purpose_id, o.seq",
          qualified_row_columns()
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut grouped: HashMap<String, Vec<RawRow>> = HashMap::new();
        for row in stmt.query_map(rusqlite::params![survey_str], RawRow::from_row)? {
          let row = row?;
          grouped.entry(row.purpose_id.clone()).or_default().push(row);
        }
        Ok((purposes, grouped))
      })
      .await?;

    raws
      .into_iter()
      .map(|p| {
        let own = rows.remove(&p.purpose_id).unwrap_or_default();
        p.into_purpose(own)
      })
      .collect()
  }

  // ── Rows: append-only writes ────────────────────────────────────────────

  async fn append_row(&self, purpose_id: Uuid, row: NewRow) -> Result<Row> {
    self.write_row(purpose_id, row, false).await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn pause_purpose(&self, purpose_id: Uuid) -> Result<Purpose> {
    self
      .set_purpose_status(purpose_id, PurposeStatus::Paused, None)
      .await
  }

  async fn resume_purpose(&self, purpose_id: Uuid, row: NewRow) -> Result<Row> {
    self.write_row(purpose_id, row, true).await
  }

  async fn finish_purpose(
    &self,
    purpose_id: Uuid,
    final_fore_sight: Option<f64>,
  ) -> Result<Purpose> {
    self
      .set_purpose_status(purpose_id, PurposeStatus::Finished, final_fore_sight)
      .await
  }
}

/// [`RawRow::COLUMNS`] prefixed with the `o.` alias for joined queries.
fn qualified_row_columns() -> String {
  RawRow::COLUMNS
    .split(", ")
    .map(|c| format!("o.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}
