use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub country: String,
    pub category: String,
    pub notify_daily: bool,
    pub delivery_method: String,
    pub phone_number: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub country: &'a str,
    pub category: &'a str,
    pub notify_daily: bool,
    pub delivery_method: &'a str,
    pub phone_number: Option<&'a str>,
}

/// Partial profile update; None leaves the column untouched.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub notify_daily: Option<bool>,
    pub delivery_method: Option<String>,
    pub phone_number: Option<String>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, country, category, \
     notify_daily, delivery_method, phone_number, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: &NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (name, email, password_hash, country, category,
                 notify_daily, delivery_method, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.country)
        .bind(new.category)
        .bind(new.notify_daily)
        .bind(new.delivery_method)
        .bind(new.phone_number)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Apply a partial update; returns None when the id no longer resolves.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                country = COALESCE($4, country),
                category = COALESCE($5, category),
                notify_daily = COALESCE($6, notify_daily),
                delivery_method = COALESCE($7, delivery_method),
                phone_number = COALESCE($8, phone_number)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.country.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.notify_daily)
        .bind(changes.delivery_method.as_deref())
        .bind(changes.phone_number.as_deref())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Everyone opted into the daily digest.
    pub async fn list_daily_subscribers(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE notify_daily = true ORDER BY created_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}

/// Pending one-time code. At most one row per email; login upserts.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub email: String,
    pub code: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    Mismatch,
    Expired,
}

impl OtpCode {
    /// Replace any pending code for this email (last write wins).
    pub async fn upsert(
        db: &PgPool,
        email: &str,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (email, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<OtpCode>> {
        let record = sqlx::query_as::<_, OtpCode>(
            "SELECT email, code, expires_at FROM otp_codes WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Consume the code. Verification deletes on success so each issued code
    /// can be used at most once.
    pub async fn delete(db: &PgPool, email: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM otp_codes WHERE email = $1")
            .bind(email)
            .execute(db)
            .await?;
        Ok(())
    }

    /// A wrong code is reported before an expired one.
    pub fn check(&self, submitted: &str, now: OffsetDateTime) -> OtpCheck {
        if self.code != submitted {
            OtpCheck::Mismatch
        } else if self.expires_at < now {
            OtpCheck::Expired
        } else {
            OtpCheck::Valid
        }
    }
}

#[cfg(test)]
mod otp_tests {
    use super::*;
    use time::Duration;

    fn record(code: &str, expires_in: Duration) -> OtpCode {
        OtpCode {
            email: "a@x.com".to_string(),
            code: code.to_string(),
            expires_at: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[test]
    fn fresh_matching_code_is_valid() {
        let otp = record("123456", Duration::minutes(5));
        assert_eq!(
            otp.check("123456", OffsetDateTime::now_utc()),
            OtpCheck::Valid
        );
    }

    #[test]
    fn wrong_code_is_mismatch() {
        let otp = record("123456", Duration::minutes(5));
        assert_eq!(
            otp.check("654321", OffsetDateTime::now_utc()),
            OtpCheck::Mismatch
        );
    }

    #[test]
    fn correct_code_after_expiry_is_expired() {
        let otp = record("123456", Duration::minutes(5));
        let six_minutes_later = OffsetDateTime::now_utc() + Duration::minutes(6);
        assert_eq!(otp.check("123456", six_minutes_later), OtpCheck::Expired);
    }

    #[test]
    fn wrong_code_beats_expiry() {
        let otp = record("123456", Duration::minutes(-1));
        assert_eq!(
            otp.check("000000", OffsetDateTime::now_utc()),
            OtpCheck::Mismatch
        );
    }
}
