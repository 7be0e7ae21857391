use rusqlite::Row;
use serde::Serialize;

/// One participant, keyed by the externally assigned badge token.
///
/// Rows are created at first sighting (station entry) with only `token`
/// and `created_at`; the registration fields are filled in later by a
/// `register` event and transition only from unset to set.
#[derive(Debug, Clone, Serialize)]
pub struct Visitor {
    pub token: String,            // ⇔ visitors.token (TEXT PRIMARY KEY)
    pub created_at: String,       // ⇔ visitors.created_at (TEXT "YYYY-MM-DD HH:MM:SS")
    pub fullname: Option<String>, // ⇔ visitors.fullname
    pub age: Option<i64>,         // ⇔ visitors.age
    pub gender: Option<String>,   // ⇔ visitors.gender
    pub school: Option<String>,   // ⇔ visitors.school
    pub email: Option<String>,    // ⇔ visitors.email
    pub phone: Option<String>,    // ⇔ visitors.phone
    pub registered_at: Option<String>, // ⇔ visitors.registered_at
    pub reward_claimed_at: Option<String>, // ⇔ visitors.reward_claimed_at

    /// Local-only bookkeeping; never serialized past the upload boundary.
    #[serde(skip_serializing)]
    pub synced_to_remote: bool, // ⇔ visitors.synced_to_remote (INTEGER 0/1)
}

impl Visitor {
    pub fn map_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            token: row.get("token")?,
            created_at: row.get("created_at")?,
            fullname: row.get("fullname")?,
            age: row.get("age")?,
            gender: row.get("gender")?,
            school: row.get("school")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            registered_at: row.get("registered_at")?,
            reward_claimed_at: row.get("reward_claimed_at")?,
            synced_to_remote: row.get::<_, i64>("synced_to_remote")? == 1,
        })
    }

    pub fn is_registered(&self) -> bool {
        self.registered_at.is_some()
    }
}
