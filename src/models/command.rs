//! Pending write operations, as buffered between the ingestor and the
//! persistence worker.
//!
//! A closed enum instead of a name→statement lookup: each variant carries
//! its own typed parameter struct and is dispatched with a `match` in
//! `db::queries::apply_command`.

/// Create the visitor row at first sighting. Duplicate tokens are a no-op
/// (the first-seen `created_at` wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertVisitor {
    pub token: String,
    pub created_at: String,
}

/// Open a new visit at a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertVisit {
    pub token: String,
    pub station_id: String,
    pub check_in_time: String,
    pub created_at: String,
}

/// Close the open visit for `(token, station_id)`. Matches only rows whose
/// `check_out_time` is still NULL; no open row means no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseVisit {
    pub check_out_time: String,
    pub token: String,
    pub station_id: String,
}

/// Fill in the registration fields of an existing visitor. Registration and
/// reward claim are stamped with the same event time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterVisitor {
    pub token: String,
    pub fullname: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub school: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub registered_at: String,
    pub reward_claimed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UpsertVisitor(UpsertVisitor),
    InsertVisit(InsertVisit),
    CloseVisit(CloseVisit),
    RegisterVisitor(RegisterVisitor),
}

impl Command {
    /// Short name used in worker logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::UpsertVisitor(_) => "upsert_visitor",
            Command::InsertVisit(_) => "insert_visit",
            Command::CloseVisit(_) => "close_visit",
            Command::RegisterVisitor(_) => "register_visitor",
        }
    }

    /// Token the command refers to, for log context.
    pub fn token(&self) -> &str {
        match self {
            Command::UpsertVisitor(c) => &c.token,
            Command::InsertVisit(c) => &c.token,
            Command::CloseVisit(c) => &c.token,
            Command::RegisterVisitor(c) => &c.token,
        }
    }
}
