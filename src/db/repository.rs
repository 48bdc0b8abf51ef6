//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity. Every multi-row
//! mutation (signup, approve, reject, remove) commits or rolls back as a unit.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CustomDesign, Notification, NotificationKind, SignupRequest, StudentRecord, StudentStatus,
    UnitMarks,
};

const STUDENT_COLUMNS: &str = "id, name, email, class_name, roll_no, school, marks, password_hash, status, signup_date, unit_marks";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== STUDENT OPERATIONS ====================

    /// Create a pending student together with its signup notification.
    pub async fn create_student(
        &self,
        request: &SignupRequest,
        password_hash: String,
    ) -> Result<StudentRecord, AppError> {
        let student = StudentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            class_name: request.class_name.trim().to_string(),
            roll_no: request.roll_no.trim().to_string(),
            school: request.school.trim().to_string(),
            marks: request.marks.trim().to_string(),
            password_hash,
            status: StudentStatus::Pending,
            signup_date: Utc::now().to_rfc3339(),
            unit_marks: UnitMarks::new(),
            custom_designs: Vec::new(),
        };
        let snapshot = serde_json::to_string(&student)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO students (id, name, email, class_name, roll_no, school, marks, password_hash, status, signup_date, unit_marks) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '{}')"
        )
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.class_name)
        .bind(&student.roll_no)
        .bind(&student.school)
        .bind(&student.marks)
        .bind(&student.password_hash)
        .bind(student.status.as_str())
        .bind(&student.signup_date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO notifications (kind, student_id, student_snapshot, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(NotificationKind::SignupRequest.as_str())
        .bind(&student.id)
        .bind(&snapshot)
        .bind(&student.signup_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(student)
    }

    /// Get a student by ID, including unit marks and designs.
    pub async fn get_student(&self, id: &str) -> Result<Option<StudentRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_student(&mut conn, id).await
    }

    /// All students with exactly this name, in signup order.
    pub async fn find_students_by_name(&self, name: &str) -> Result<Vec<StudentRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE name = ? ORDER BY rowid"
        ))
        .bind(name)
        .fetch_all(&mut *conn)
        .await?;

        let mut students = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut student = student_from_row(row);
            student.custom_designs = fetch_designs(&mut conn, &student.id).await?;
            students.push(student);
        }
        Ok(students)
    }

    /// List all students in signup order.
    pub async fn list_students(&self) -> Result<Vec<StudentRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY rowid"))
            .fetch_all(&mut *conn)
            .await?;

        let mut students = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut student = student_from_row(row);
            student.custom_designs = fetch_designs(&mut conn, &student.id).await?;
            students.push(student);
        }
        Ok(students)
    }

    /// Number of approved students.
    pub async fn count_approved(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM students WHERE status = ?")
            .bind(StudentStatus::Approved.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Replace a student's unit marks wholesale.
    pub async fn update_unit_marks(
        &self,
        id: &str,
        unit_marks: &UnitMarks,
    ) -> Result<StudentRecord, AppError> {
        let marks_json = serde_json::to_string(unit_marks)?;

        let result = sqlx::query("UPDATE students SET unit_marks = ? WHERE id = ?")
            .bind(&marks_json)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Student {} not found", id)));
        }

        self.get_student(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    /// Append a design to a student's collection.
    ///
    /// If the student already owns a design with the same name, a numeric suffix
    /// (`_2`, `_3`, ...) is added so names stay unique per student.
    pub async fn add_design(
        &self,
        student_id: &str,
        mut design: CustomDesign,
    ) -> Result<CustomDesign, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing: Vec<String> =
            sqlx::query("SELECT name FROM custom_designs WHERE student_id = ?")
                .bind(student_id)
                .fetch_all(&mut *tx)
                .await?
                .iter()
                .map(|row| row.get("name"))
                .collect();

        design.name = unique_design_name(&design.name, &existing);

        let row = sqlx::query(
            "SELECT COALESCE(MAX(position) + 1, 0) AS next FROM custom_designs WHERE student_id = ?",
        )
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;
        let position: i64 = row.get("next");

        let palette_json = serde_json::to_string(&design.color_palette)?;

        sqlx::query(
            "INSERT INTO custom_designs (student_id, position, name, display_name, description, style_preference, color_mood, color_palette, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(student_id)
        .bind(position)
        .bind(&design.name)
        .bind(&design.display_name)
        .bind(&design.description)
        .bind(&design.style_preference)
        .bind(&design.color_mood)
        .bind(&palette_json)
        .bind(&design.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(design)
    }

    /// Remove the first student (in signup order) matching name and roll number,
    /// together with its notification, sessions and designs.
    pub async fn remove_student(
        &self,
        name: &str,
        roll_no: &str,
    ) -> Result<StudentRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: Option<String> = sqlx::query(
            "SELECT id FROM students WHERE name = ? AND roll_no = ? ORDER BY rowid LIMIT 1",
        )
        .bind(name)
        .bind(roll_no)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get("id"));

        let student = match id {
            Some(id) => fetch_student(&mut tx, &id).await?,
            None => None,
        }
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Student {} with roll number {} not found",
                name, roll_no
            ))
        })?;

        delete_student(&mut tx, &student.id).await?;
        tx.commit().await?;

        Ok(student)
    }

    // ==================== NOTIFICATION OPERATIONS ====================

    /// List pending notifications, oldest first.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query(
            "SELECT id, kind, student_snapshot, timestamp FROM notifications ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    /// Approve the student behind a notification and consume the notification.
    pub async fn approve_notification(&self, id: i64) -> Result<StudentRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let student_id = notification_student(&mut tx, id).await?;

        sqlx::query("UPDATE students SET status = ? WHERE id = ?")
            .bind(StudentStatus::Approved.as_str())
            .bind(&student_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let student = fetch_student(&mut tx, &student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?;

        tx.commit().await?;

        Ok(student)
    }

    /// Reject the student behind a notification: the student and the notification
    /// are both deleted.
    pub async fn reject_notification(&self, id: i64) -> Result<StudentRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let student_id = notification_student(&mut tx, id).await?;
        let student = fetch_student(&mut tx, &student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?;

        delete_student(&mut tx, &student_id).await?;
        tx.commit().await?;

        Ok(student)
    }

    // ==================== SESSION OPERATIONS ====================

    /// Issue a new session token for a student.
    pub async fn create_session(&self, student_id: &str) -> Result<String, AppError> {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO sessions (token, student_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(student_id)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    /// Resolve a session token to the current state of its student.
    pub async fn student_for_session(&self, token: &str) -> Result<Option<StudentRecord>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let student_id: Option<String> =
            sqlx::query("SELECT student_id FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&mut *conn)
                .await?
                .map(|row| row.get("student_id"));

        match student_id {
            Some(id) => fetch_student(&mut conn, &id).await,
            None => Ok(None),
        }
    }

    /// Delete a session. Unknown tokens are ignored.
    pub async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// Helpers shared by pooled connections and transactions

async fn fetch_student(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<StudentRecord>, AppError> {
    let row = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut student = student_from_row(&row);
    student.custom_designs = fetch_designs(conn, id).await?;
    Ok(Some(student))
}

async fn fetch_designs(
    conn: &mut SqliteConnection,
    student_id: &str,
) -> Result<Vec<CustomDesign>, AppError> {
    let rows = sqlx::query(
        "SELECT name, display_name, description, style_preference, color_mood, color_palette, created_at FROM custom_designs WHERE student_id = ? ORDER BY position"
    )
    .bind(student_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(design_from_row).collect())
}

async fn notification_student(conn: &mut SqliteConnection, id: i64) -> Result<String, AppError> {
    sqlx::query("SELECT student_id FROM notifications WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| row.get("student_id"))
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
}

/// Deleting the student cascades to its designs, notification and sessions.
async fn delete_student(conn: &mut SqliteConnection, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn unique_design_name(base: &str, existing: &[String]) -> String {
    if !existing.iter().any(|n| n == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !existing.iter().any(|n| n == candidate))
        .unwrap_or_else(|| base.to_string())
}

// Helper functions for row conversion

fn student_from_row(row: &SqliteRow) -> StudentRecord {
    let status: String = row.get("status");
    let id: String = row.get("id");
    let unit_marks: String = row.get("unit_marks");
    let unit_marks = serde_json::from_str(&unit_marks).unwrap_or_else(|e| {
        tracing::warn!("Malformed unit marks for student {}: {}", id, e);
        UnitMarks::default()
    });
    StudentRecord {
        id,
        name: row.get("name"),
        email: row.get("email"),
        class_name: row.get("class_name"),
        roll_no: row.get("roll_no"),
        school: row.get("school"),
        marks: row.get("marks"),
        password_hash: row.get("password_hash"),
        status: StudentStatus::parse(&status).unwrap_or(StudentStatus::Pending),
        signup_date: row.get("signup_date"),
        unit_marks,
        custom_designs: Vec::new(),
    }
}

fn design_from_row(row: &SqliteRow) -> CustomDesign {
    let name: String = row.get("name");
    let palette: String = row.get("color_palette");
    let color_palette = serde_json::from_str(&palette).unwrap_or_else(|e| {
        tracing::warn!("Malformed color palette for design {}: {}", name, e);
        Vec::new()
    });
    CustomDesign {
        name,
        display_name: row.get("display_name"),
        description: row.get("description"),
        style_preference: row.get("style_preference"),
        color_mood: row.get("color_mood"),
        color_palette,
        created_at: row.get("created_at"),
    }
}

fn notification_from_row(row: &SqliteRow) -> Result<Notification, AppError> {
    let kind: String = row.get("kind");
    let snapshot: String = row.get("student_snapshot");
    Ok(Notification {
        id: row.get("id"),
        kind: NotificationKind::parse(&kind)
            .ok_or_else(|| AppError::Internal(format!("Unknown notification kind {}", kind)))?,
        user: serde_json::from_str(&snapshot)?,
        timestamp: row.get("timestamp"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn signup(name: &str, roll_no: &str) -> SignupRequest {
        SignupRequest {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            class_name: "10".to_string(),
            roll_no: roll_no.to_string(),
            school: "North High School".to_string(),
            marks: "90".to_string(),
            password: "pw".to_string(),
        }
    }

    fn design(name: &str) -> CustomDesign {
        CustomDesign {
            name: name.to_string(),
            display_name: "AI Design 10:00".to_string(),
            description: "stars".to_string(),
            style_preference: "modern".to_string(),
            color_mood: "neon".to_string(),
            color_palette: vec!["#00FFF0".to_string()],
            created_at: "2024-01-01T10:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_pending_student_and_notification() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();
        assert_eq!(student.status, StudentStatus::Pending);

        let notifications = repo.list_notifications().await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::SignupRequest);
        assert_eq!(notifications[0].user.id, student.id);
        assert_eq!(repo.count_approved().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approve_consumes_notification_once() {
        let (repo, _dir) = repo().await;
        repo.create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();
        let id = repo.list_notifications().await.unwrap()[0].id;

        let approved = repo.approve_notification(id).await.unwrap();
        assert!(approved.is_approved());
        assert!(repo.list_notifications().await.unwrap().is_empty());
        assert_eq!(repo.count_approved().await.unwrap(), 1);

        let again = repo.approve_notification(id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reject_deletes_student() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();
        let id = repo.list_notifications().await.unwrap()[0].id;

        repo.reject_notification(id).await.unwrap();
        assert!(repo.get_student(&student.id).await.unwrap().is_none());
        assert!(repo.list_notifications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unit_marks_keep_order() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();

        let mut marks = UnitMarks::new();
        marks.insert("unit_3".to_string(), "70".to_string());
        marks.insert("unit_1".to_string(), "95".to_string());

        let updated = repo.update_unit_marks(&student.id, &marks).await.unwrap();
        let keys: Vec<&str> = updated.unit_marks.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["unit_3", "unit_1"]);
    }

    #[tokio::test]
    async fn test_duplicate_design_names_get_suffix() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();

        let first = repo.add_design(&student.id, design("ai_design_x")).await.unwrap();
        let second = repo.add_design(&student.id, design("ai_design_x")).await.unwrap();
        let third = repo.add_design(&student.id, design("ai_design_x")).await.unwrap();
        assert_eq!(first.name, "ai_design_x");
        assert_eq!(second.name, "ai_design_x_2");
        assert_eq!(third.name, "ai_design_x_3");

        let stored = repo.get_student(&student.id).await.unwrap().unwrap();
        let names: Vec<&str> = stored.custom_designs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ai_design_x", "ai_design_x_2", "ai_design_x_3"]);
    }

    #[tokio::test]
    async fn test_sessions_follow_student_lifecycle() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "7"), "hash".to_string())
            .await
            .unwrap();
        let token = repo.create_session(&student.id).await.unwrap();

        let resolved = repo.student_for_session(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, student.id);

        repo.remove_student("Ada", "7").await.unwrap();
        assert!(repo.student_for_session(&token).await.unwrap().is_none());
        assert!(repo.list_notifications().await.unwrap().is_empty());

        let missing = repo.remove_student("Ada", "7").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_students_by_name_returns_all_matches() {
        let (repo, _dir) = repo().await;
        repo.create_student(&signup("Ada", "1"), "a".to_string())
            .await
            .unwrap();
        repo.create_student(&signup("Ada", "2"), "b".to_string())
            .await
            .unwrap();
        repo.create_student(&signup("Bob", "3"), "c".to_string())
            .await
            .unwrap();

        let found = repo.find_students_by_name("Ada").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].roll_no, "1");
        assert_eq!(found[1].roll_no, "2");
    }

    #[test]
    fn test_unique_design_name() {
        let existing = vec!["a".to_string(), "a_2".to_string()];
        assert_eq!(unique_design_name("b", &existing), "b");
        assert_eq!(unique_design_name("a", &existing), "a_3");
    }

    #[tokio::test]
    async fn test_malformed_json_columns_load_empty() {
        let (repo, _dir) = repo().await;
        let student = repo
            .create_student(&signup("Ada", "1"), "hash".to_string())
            .await
            .unwrap();
        repo.add_design(&student.id, design("ai_design_20240101_100000"))
            .await
            .unwrap();

        sqlx::query("UPDATE students SET unit_marks = 'not json' WHERE id = ?")
            .bind(&student.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        sqlx::query("UPDATE custom_designs SET color_palette = '{' WHERE student_id = ?")
            .bind(&student.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let loaded = repo.get_student(&student.id).await.unwrap().unwrap();
        assert!(loaded.unit_marks.is_empty());
        assert_eq!(loaded.custom_designs.len(), 1);
        assert!(loaded.custom_designs[0].color_palette.is_empty());
    }
}
