//! 사용자 저장소
//!
//! 인증 정보는 다루지 않습니다. 권한 판정은 `commands::users` 소관

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_millis, Database};
use crate::error::{conflict_on_unique, ForestError};
use crate::models::{NewUser, User, UserProfileUpdate};
use crate::rbac::Role;

const USER_COLUMNS: &str = "id, username, email, role, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn find_user(conn: &Connection, id: i64) -> Result<User, ForestError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .optional()?
    .ok_or(ForestError::UserNotFound(id))
}

fn validate_username(username: &str) -> Result<(), ForestError> {
    if username.trim().is_empty() {
        return Err(ForestError::Validation("Username is required".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ForestError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ForestError::Validation(format!("Invalid email address: {email}"))),
    }
}

impl Database {
    pub fn create_user(&self, input: &NewUser) -> Result<User, ForestError> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;

        let now = now_millis();
        self.conn
            .execute(
                "INSERT INTO users (username, email, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.username.trim(), input.email.trim(), input.role, now],
            )
            .map_err(|e| conflict_on_unique(e, "Username or email"))?;

        let user = find_user(&self.conn, self.conn.last_insert_rowid())?;
        tracing::info!(id = user.id, username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    pub fn get_user(&self, id: i64) -> Result<User, ForestError> {
        find_user(&self.conn, id)
    }

    pub fn list_users(&self) -> Result<Vec<User>, ForestError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let iter = stmt.query_map([], user_from_row)?;
        let mut out = Vec::new();
        for user in iter {
            out.push(user?);
        }
        Ok(out)
    }

    /// 이름/이메일 부분 수정
    pub fn update_user_profile(&self, id: i64, update: &UserProfileUpdate) -> Result<User, ForestError> {
        let current = find_user(&self.conn, id)?;
        if let Some(username) = update.username.as_deref() {
            validate_username(username)?;
        }
        if let Some(email) = update.email.as_deref() {
            validate_email(email)?;
        }

        let username = update.username.as_deref().map(str::trim).unwrap_or(&current.username);
        let email = update.email.as_deref().map(str::trim).unwrap_or(&current.email);
        self.conn
            .execute(
                "UPDATE users SET username = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
                params![username, email, now_millis(), id],
            )
            .map_err(|e| conflict_on_unique(e, "Username or email"))?;

        tracing::info!(id, "user profile updated");
        find_user(&self.conn, id)
    }

    pub fn update_user_role(&self, id: i64, role: Role) -> Result<User, ForestError> {
        let current = find_user(&self.conn, id)?;
        self.conn.execute(
            "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
            params![role, now_millis(), id],
        )?;

        tracing::info!(id, from = %current.role, to = %role, "user role changed");
        find_user(&self.conn, id)
    }

    /// 사용자 삭제. 작성한 원문/이력의 사용자 id는 그대로 남음
    pub fn delete_user(&self, id: i64) -> Result<(), ForestError> {
        let deleted = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(ForestError::UserNotFound(id));
        }
        tracing::info!(id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{entry, memory_db, user};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            role: Role::Translator,
        }
    }

    #[test]
    fn test_create_and_get_user() {
        let db = memory_db();
        let created = db.create_user(&new_user(" sora ", "sora@forest.test")).unwrap();
        assert_eq!(created.username, "sora");

        let fetched = db.get_user(created.id).unwrap();
        assert_eq!(fetched, created);
        assert!(matches!(db.get_user(99), Err(ForestError::UserNotFound(99))));
    }

    #[test]
    fn test_duplicate_username_or_email_is_conflict() {
        let db = memory_db();
        db.create_user(&new_user("sora", "sora@forest.test")).unwrap();

        let err = db.create_user(&new_user("sora", "other@forest.test")).unwrap_err();
        assert!(matches!(err, ForestError::Conflict(_)));
        // 저장소 진단 메시지 비노출
        assert!(!err.to_string().contains("UNIQUE"));

        let err = db.create_user(&new_user("riku", "sora@forest.test")).unwrap_err();
        assert!(matches!(err, ForestError::Conflict(_)));
    }

    #[test]
    fn test_invalid_profile_fields() {
        let db = memory_db();
        assert!(matches!(
            db.create_user(&new_user("", "a@b")),
            Err(ForestError::Validation(_))
        ));
        assert!(matches!(
            db.create_user(&new_user("a", "not-an-email")),
            Err(ForestError::Validation(_))
        ));
    }

    #[test]
    fn test_profile_update_is_partial() {
        let db = memory_db();
        let id = user(&db, "sora", Role::Reviewer);
        let other = user(&db, "riku", Role::Reviewer);

        let updated = db
            .update_user_profile(
                id,
                &UserProfileUpdate {
                    email: Some("sora@new.test".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.username, "sora");
        assert_eq!(updated.email, "sora@new.test");

        let err = db
            .update_user_profile(
                other,
                &UserProfileUpdate {
                    username: Some("sora".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ForestError::Conflict(_)));
    }

    #[test]
    fn test_role_change_and_delete() {
        let db = memory_db();
        let id = user(&db, "sora", Role::Reviewer);
        assert_eq!(db.update_user_role(id, Role::Translator).unwrap().role, Role::Translator);

        let e = entry(&db, "EV_040", "x", id);
        db.delete_user(id).unwrap();
        assert!(matches!(db.delete_user(id), Err(ForestError::UserNotFound(_))));

        // 원문은 남고 작성자 참조도 유지
        assert_eq!(db.get_text_entry(e.id).unwrap().created_by, Some(id));
        assert!(db.list_users().unwrap().is_empty());
    }
}
