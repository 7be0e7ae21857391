use rusqlite::Row;
use serde::Serialize;

/// One stay at a physical station.
///
/// A row with `check_out_time` unset is an "open visit": the participant is
/// currently at the station. The matching exit event closes it exactly once;
/// rows are never deleted. `token` is a soft reference to `visitors` —
/// orphaned visits are tolerated.
#[derive(Debug, Clone, Serialize)]
pub struct StationVisit {
    pub id: i64,            // ⇔ station_visits.id (INTEGER PRIMARY KEY AUTOINCREMENT)
    pub token: String,      // ⇔ station_visits.token
    pub station_id: String, // ⇔ station_visits.station_id
    pub check_in_time: String, // ⇔ station_visits.check_in_time
    pub check_out_time: Option<String>, // ⇔ station_visits.check_out_time (NULL = open)
    pub created_at: String, // ⇔ station_visits.created_at

    /// Local-only bookkeeping; never serialized past the upload boundary.
    #[serde(skip_serializing)]
    pub synced_to_remote: bool, // ⇔ station_visits.synced_to_remote (INTEGER 0/1)
}

impl StationVisit {
    pub fn map_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            token: row.get("token")?,
            station_id: row.get("station_id")?,
            check_in_time: row.get("check_in_time")?,
            check_out_time: row.get("check_out_time")?,
            created_at: row.get("created_at")?,
            synced_to_remote: row.get::<_, i64>("synced_to_remote")? == 1,
        })
    }

    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}
