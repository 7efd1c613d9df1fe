use super::{new_id, now_rfc3339, unique_as_duplicate, StoreResult};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    pub school_id: String,
    pub school_name: String,
    pub class_id: String,
    pub class_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub address: String,
    pub parent_name: String,
    pub parent_contact: String,
    pub created_at: String,
}

// student_id is "" rather than NULL so it takes part in the identity key.
#[derive(Debug, Clone, Default)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    pub school_id: String,
    pub class_id: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub address: String,
    pub parent_name: String,
    pub parent_contact: String,
}

/// `date_of_birth: Some(None)` clears the date.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_id: Option<String>,
    pub school_id: Option<String>,
    pub class_id: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub parent_name: Option<String>,
    pub parent_contact: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub school_id: Option<String>,
    pub class_id: Option<String>,
}

const STUDENT_SELECT: &str = "SELECT st.id, st.first_name, st.last_name, st.student_id,
            st.school_id, s.name, st.class_id, c.name,
            st.date_of_birth, st.email, st.address, st.parent_name, st.parent_contact, st.created_at
     FROM students st
     JOIN schools s ON s.id = st.school_id
     JOIN classes c ON c.id = st.class_id";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        student_id: row.get(3)?,
        school_id: row.get(4)?,
        school_name: row.get(5)?,
        class_id: row.get(6)?,
        class_name: row.get(7)?,
        date_of_birth: row.get(8)?,
        email: row.get(9)?,
        address: row.get(10)?,
        parent_name: row.get(11)?,
        parent_contact: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub fn get_student(conn: &Connection, id: &str) -> StoreResult<Option<Student>> {
    let sql = format!("{} WHERE st.id = ?", STUDENT_SELECT);
    Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
}

pub fn list_students(conn: &Connection, filter: &StudentFilter) -> StoreResult<Vec<Student>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR st.school_id = ?1) AND (?2 IS NULL OR st.class_id = ?2)
         ORDER BY s.name, c.name, st.last_name, st.first_name, st.student_id",
        STUDENT_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            (filter.school_id.as_deref(), filter.class_id.as_deref()),
            student_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn insert_student(conn: &Connection, id: &str, draft: &StudentDraft, upsert: bool) -> rusqlite::Result<usize> {
    let conflict = if upsert {
        " ON CONFLICT(first_name, last_name, student_id, school_id, class_id) DO NOTHING"
    } else {
        ""
    };
    let sql = format!(
        "INSERT INTO students(
            id, first_name, last_name, student_id, school_id, class_id,
            date_of_birth, email, address, parent_name, parent_contact, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?){}",
        conflict
    );
    conn.execute(
        &sql,
        (
            id,
            &draft.first_name,
            &draft.last_name,
            &draft.student_id,
            &draft.school_id,
            &draft.class_id,
            draft.date_of_birth,
            &draft.email,
            &draft.address,
            &draft.parent_name,
            &draft.parent_contact,
            now_rfc3339(),
        ),
    )
}

pub fn create_student(conn: &Connection, draft: &StudentDraft) -> StoreResult<Student> {
    let id = new_id();
    insert_student(conn, &id, draft, false).map_err(unique_as_duplicate("student"))?;
    let sql = format!("{} WHERE st.id = ?", STUDENT_SELECT);
    Ok(conn.query_row(&sql, [&id], student_from_row)?)
}

pub fn get_or_create_student(conn: &Connection, draft: &StudentDraft) -> StoreResult<(Student, bool)> {
    let inserted = insert_student(conn, &new_id(), draft, true)?;
    let sql = format!(
        "{} WHERE st.first_name = ? AND st.last_name = ? AND st.student_id = ?
           AND st.school_id = ? AND st.class_id = ?",
        STUDENT_SELECT
    );
    let student = conn.query_row(
        &sql,
        [
            &draft.first_name,
            &draft.last_name,
            &draft.student_id,
            &draft.school_id,
            &draft.class_id,
        ],
        student_from_row,
    )?;
    Ok((student, inserted == 1))
}

pub fn update_student(conn: &Connection, id: &str, patch: &StudentPatch) -> StoreResult<Option<Student>> {
    let Some(mut st) = get_student(conn, id)? else {
        return Ok(None);
    };
    if let Some(v) = &patch.first_name {
        st.first_name = v.clone();
    }
    if let Some(v) = &patch.last_name {
        st.last_name = v.clone();
    }
    if let Some(v) = &patch.student_id {
        st.student_id = v.clone();
    }
    if let Some(v) = &patch.school_id {
        st.school_id = v.clone();
    }
    if let Some(v) = &patch.class_id {
        st.class_id = v.clone();
    }
    if let Some(v) = patch.date_of_birth {
        st.date_of_birth = v;
    }
    if let Some(v) = &patch.email {
        st.email = v.clone();
    }
    if let Some(v) = &patch.address {
        st.address = v.clone();
    }
    if let Some(v) = &patch.parent_name {
        st.parent_name = v.clone();
    }
    if let Some(v) = &patch.parent_contact {
        st.parent_contact = v.clone();
    }
    conn.execute(
        "UPDATE students SET
            first_name = ?, last_name = ?, student_id = ?, school_id = ?, class_id = ?,
            date_of_birth = ?, email = ?, address = ?, parent_name = ?, parent_contact = ?
         WHERE id = ?",
        (
            &st.first_name,
            &st.last_name,
            &st.student_id,
            &st.school_id,
            &st.class_id,
            st.date_of_birth,
            &st.email,
            &st.address,
            &st.parent_name,
            &st.parent_contact,
            id,
        ),
    )
    .map_err(unique_as_duplicate("student"))?;
    get_student(conn, id)
}

pub fn delete_student(conn: &Connection, id: &str) -> StoreResult<bool> {
    let removed = conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(removed == 1)
}
