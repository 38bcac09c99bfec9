//! Database models.

pub mod click;
pub mod contact;
pub mod deal;
pub mod lead;
pub mod lead_comment;
pub mod target;
pub mod telegram;
pub mod user;

pub use click::Click;
pub use contact::{Contact, ContactFilter, CreateContact, UpdateContact};
pub use deal::{CreateDeal, Deal, DealFilter, DealStatus, UpdateDeal};
pub use lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead};
pub use lead_comment::LeadComment;
pub use target::{CreateTarget, TargetCompany, TargetFilter, TargetSummary, UpdateTarget};
pub use telegram::{CreateTelegramUser, TelegramUser};
pub use user::{NewUser, UpdateUser, User, UserFilter};

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// Decode a nullable UUID stored as hyphenated text.
pub(crate) fn uuid_column(row: &SqliteRow, column: &str) -> Result<Option<Uuid>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

/// Decode a non-null UUID stored as hyphenated text.
pub(crate) fn required_uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    uuid_column(row, column)?.ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected NULL in {column}").into(),
    })
}
