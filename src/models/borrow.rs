//! Borrow model and lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Borrow lifecycle.
/// `Overdue` is part of the vocabulary but no code path assigns it; a borrow
/// past its due date stays `Active` until returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Active,
    Returned,
    Overdue,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Active => "active",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(BorrowStatus::Active),
            "returned" => Ok(BorrowStatus::Returned),
            "overdue" => Ok(BorrowStatus::Overdue),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowStatus (stored as a string column)
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrow model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub status: BorrowStatus,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Set exactly once, at the return transition
    pub returned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrow {
    pub fn is_returned(&self) -> bool {
        self.status == BorrowStatus::Returned || self.returned_at.is_some()
    }
}

fn default_days() -> i64 {
    14
}

/// Create borrow request.
/// `user_id` is honored for librarians and admins borrowing on a member's
/// behalf; members always borrow for themselves.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorrow {
    pub book_id: i32,
    pub user_id: Option<i32>,
    #[serde(default = "default_days")]
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: i64,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [BorrowStatus::Active, BorrowStatus::Returned, BorrowStatus::Overdue] {
            assert_eq!(status.as_str().parse::<BorrowStatus>().unwrap(), status);
        }
        assert!("lost".parse::<BorrowStatus>().is_err());
    }

    #[test]
    fn is_returned_checks_both_flag_and_timestamp() {
        let now = Utc::now();
        let mut borrow = Borrow {
            id: 1,
            user_id: 1,
            book_id: 1,
            status: BorrowStatus::Active,
            borrowed_at: now,
            due_date: now,
            returned_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!borrow.is_returned());

        borrow.returned_at = Some(now);
        assert!(borrow.is_returned());

        borrow.returned_at = None;
        borrow.status = BorrowStatus::Returned;
        assert!(borrow.is_returned());
    }
}
