//! Inbound message shapes.
//!
//! Everything arriving on the scan topic is parsed into the closed
//! `ScanEvent` union before it touches the rest of the pipeline. A payload
//! that fits none of the three shapes is a parse error, logged and dropped
//! by the ingestor.

use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::models::command::{
    CloseVisit, Command, InsertVisit, RegisterVisitor, UpsertVisitor,
};
use crate::utils::time::format_epoch_sortable;

/// Wire payload as published by the scanner stations and the registration
/// kiosk. All discriminating fields are optional here; validation happens
/// in [`ScanEvent::parse`].
#[derive(Debug, Deserialize)]
struct RawPayload {
    token: Option<String>,
    epoch: Option<i64>,
    check: Option<i64>,
    #[serde(rename = "eventType")]
    event_type: Option<String>,
    location: Option<String>,
    fullname: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    school: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFields {
    pub fullname: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub school: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A validated inbound event. `at` is the event time already normalized to
/// the sortable local-time text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    StationEntry {
        token: String,
        station_id: String,
        at: String,
    },
    StationExit {
        token: String,
        station_id: String,
        at: String,
    },
    Registration {
        token: String,
        at: String,
        fields: RegistrationFields,
    },
}

impl ScanEvent {
    /// Validating parse of a raw broker message.
    pub fn parse(payload: &[u8]) -> AppResult<Self> {
        let raw: RawPayload = serde_json::from_slice(payload)
            .map_err(|e| AppError::InvalidPayload(e.to_string()))?;

        let token = raw.token.ok_or(AppError::MissingField("token"))?;
        let epoch = raw.epoch.ok_or(AppError::MissingField("epoch"))?;
        let at = format_epoch_sortable(epoch);

        match (raw.check, raw.event_type.as_deref()) {
            (Some(1), _) => Ok(ScanEvent::StationEntry {
                token,
                station_id: raw.location.ok_or(AppError::MissingField("location"))?,
                at,
            }),
            (Some(0), _) => Ok(ScanEvent::StationExit {
                token,
                station_id: raw.location.ok_or(AppError::MissingField("location"))?,
                at,
            }),
            (None, Some("register")) => Ok(ScanEvent::Registration {
                token,
                at,
                fields: RegistrationFields {
                    fullname: raw.fullname,
                    age: raw.age,
                    gender: raw.gender,
                    school: raw.school,
                    email: raw.email,
                    phone: raw.phone,
                },
            }),
            _ => Err(AppError::UnknownEventShape(token)),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            ScanEvent::StationEntry { token, .. }
            | ScanEvent::StationExit { token, .. }
            | ScanEvent::Registration { token, .. } => token,
        }
    }

    /// Expand the event into the write commands it implies, in the order
    /// they must be applied. An entry produces the visitor row before the
    /// visit row that references it.
    pub fn into_commands(self) -> Vec<Command> {
        match self {
            ScanEvent::StationEntry {
                token,
                station_id,
                at,
            } => vec![
                Command::UpsertVisitor(UpsertVisitor {
                    token: token.clone(),
                    created_at: at.clone(),
                }),
                Command::InsertVisit(InsertVisit {
                    token,
                    station_id,
                    check_in_time: at.clone(),
                    created_at: at,
                }),
            ],
            ScanEvent::StationExit {
                token,
                station_id,
                at,
            } => vec![Command::CloseVisit(CloseVisit {
                check_out_time: at,
                token,
                station_id,
            })],
            ScanEvent::Registration { token, at, fields } => {
                vec![Command::RegisterVisitor(RegisterVisitor {
                    token,
                    fullname: fields.fullname,
                    age: fields.age,
                    gender: fields.gender,
                    school: fields.school,
                    email: fields.email,
                    phone: fields.phone,
                    registered_at: at.clone(),
                    reward_claimed_at: at,
                })]
            }
        }
    }
}
