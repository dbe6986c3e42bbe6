use chrono::NaiveDateTime;
use sqlx::MySqlPool;

use crate::database::models::{AdminSummary, StudentSummary, User};
use crate::database::query_builder::Condition;
use crate::database::{DatabaseError, Repository};

/// Fields of a new account row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub nickname: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub birthday: Option<String>,
    pub uni_id: Option<String>,
    pub is_student: bool,
    pub is_admin: bool,
}

const DELETE_ADMIN: &str = "DELETE FROM user WHERE id = ? AND is_admin = 1";

/// Accounts, the student registry and email verification codes
pub struct UserService {
    pool: MySqlPool,
}

impl UserService {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn users(&self) -> Repository<'_, User> {
        Repository::new("user", &self.pool)
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        self.users().select_one(vec![Condition::eq("id", id)]).await
    }

    pub async fn find_by_credentials(&self, id: &str, password_hash: &str) -> Result<Option<User>, DatabaseError> {
        self.users()
            .select_one(vec![Condition::eq("id", id), Condition::eq("password", password_hash)])
            .await
    }

    pub async fn is_admin(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.find(id).await?.map(|user| user.is_admin).unwrap_or(false))
    }

    pub async fn id_taken(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.users().count(vec![Condition::eq("id", id)]).await? > 0)
    }

    pub async fn nickname_taken(&self, nickname: &str) -> Result<bool, DatabaseError> {
        Ok(self.users().count(vec![Condition::eq("nickname", nickname)]).await? > 0)
    }

    /// An account already registered for this student identity
    pub async fn student_account_exists(&self, uni_id: &str, name: &str, birthday: &str) -> Result<bool, DatabaseError> {
        let count = self
            .users()
            .count(vec![
                Condition::eq("uni_id", uni_id),
                Condition::eq("name", name),
                Condition::eq("birthday", birthday),
            ])
            .await?;
        Ok(count > 0)
    }

    pub async fn is_registered_student(&self, uni_id: &str, name: &str, birthday: &str) -> Result<bool, DatabaseError> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT uni_id FROM student WHERE uni_id = ? AND name = ? AND birthday = ? LIMIT 1")
                .bind(uni_id)
                .bind(name)
                .bind(birthday)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn create(&self, user: &NewUser) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user (id, nickname, password, name, birthday, uni_id, is_student, is_admin) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.birthday)
        .bind(&user.uni_id)
        .bind(user.is_student)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn admin_count(&self) -> Result<i64, DatabaseError> {
        self.users().count(vec![Condition::eq("is_admin", true)]).await
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE user SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_student_info(&self, id: &str, uni_id: &str, name: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE user SET uni_id = ?, name = ? WHERE id = ?")
            .bind(uni_id)
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Users with a student number matching either the number or the name
    pub async fn search_students(&self, uni_id: Option<&str>, name: Option<&str>) -> Result<Vec<StudentSummary>, DatabaseError> {
        let alternatives: Vec<Condition> = [("uni_id", uni_id), ("name", name)]
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| Condition::eq(column, v)))
            .collect();

        Repository::<StudentSummary>::new("user", &self.pool)
            .select_any(vec![Condition::Any(alternatives), Condition::NotNull("uni_id".into())])
            .await
    }

    pub async fn student_summary(&self, id: &str) -> Result<Vec<StudentSummary>, DatabaseError> {
        Repository::<StudentSummary>::new("user", &self.pool)
            .select_any(vec![Condition::eq("id", id)])
            .await
    }

    pub async fn admins_except(&self, supervisor_id: &str) -> Result<Vec<AdminSummary>, DatabaseError> {
        Repository::<AdminSummary>::new("user", &self.pool)
            .select_any(vec![
                Condition::eq("is_admin", true),
                Condition::Ne("id".into(), supervisor_id.into()),
            ])
            .await
    }

    /// Remove an admin account; regular users are left alone
    pub async fn delete_admin(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(DELETE_ADMIN).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace any pending code for `email` with a fresh one
    pub async fn store_code(&self, email: &str, code: &str, now: NaiveDateTime) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM auth WHERE email = ? AND is_auth = 0")
            .bind(email)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO auth (email, auth_code, date) VALUES (?, ?, ?)")
            .bind(email)
            .bind(code)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Issue time of the pending code, if `code` is the pending code for `email`
    pub async fn pending_code_issued_at(&self, email: &str, code: &str) -> Result<Option<NaiveDateTime>, DatabaseError> {
        let issued: Option<NaiveDateTime> = sqlx::query_scalar(
            "SELECT date FROM auth WHERE email = ? AND auth_code = ? AND is_auth = 0 ORDER BY date DESC LIMIT 1",
        )
        .bind(email)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(issued)
    }

    pub async fn mark_code_verified(&self, email: &str, code: &str, now: NaiveDateTime) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE auth SET is_auth = 1, date = ? WHERE email = ? AND auth_code = ?")
            .bind(now)
            .bind(email)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// When `email` last completed verification
    pub async fn last_verified_at(&self, email: &str) -> Result<Option<NaiveDateTime>, DatabaseError> {
        let verified: Option<NaiveDateTime> =
            sqlx::query_scalar("SELECT MAX(date) FROM auth WHERE email = ? AND is_auth = 1")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(verified)
    }
}

/// A code issued at `issued_at` is still usable at `now`
pub fn code_is_fresh(issued_at: NaiveDateTime, now: NaiveDateTime, lifetime_minutes: i64) -> bool {
    now - issued_at < chrono::Duration::minutes(lifetime_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn admin_delete_only_matches_admins() {
        assert!(DELETE_ADMIN.ends_with("WHERE id = ? AND is_admin = 1"));
    }

    #[test]
    fn codes_expire_after_lifetime() {
        let issued = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        assert!(code_is_fresh(issued, issued + Duration::minutes(4), 5));
        assert!(code_is_fresh(issued, issued + Duration::seconds(299), 5));
        assert!(!code_is_fresh(issued, issued + Duration::minutes(5), 5));
        assert!(!code_is_fresh(issued, issued + Duration::hours(1), 5));
    }
}
