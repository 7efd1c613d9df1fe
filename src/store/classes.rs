use super::{new_id, now_rfc3339, unique_as_duplicate, StoreResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchoolClass {
    pub id: String,
    pub school_id: String,
    pub school_name: String,
    pub name: String,
    pub grade_level: String,
    pub academic_year: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassListing {
    #[serde(flatten)]
    pub class: SchoolClass,
    pub student_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ClassDraft {
    pub school_id: String,
    pub name: String,
    pub grade_level: String,
    pub academic_year: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub school_id: Option<String>,
    pub name: Option<String>,
    pub grade_level: Option<String>,
    pub academic_year: Option<String>,
}

const CLASS_SELECT: &str = "SELECT c.id, c.school_id, s.name, c.name, c.grade_level, c.academic_year, c.created_at
     FROM classes c
     JOIN schools s ON s.id = c.school_id";

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<SchoolClass> {
    Ok(SchoolClass {
        id: row.get(0)?,
        school_id: row.get(1)?,
        school_name: row.get(2)?,
        name: row.get(3)?,
        grade_level: row.get(4)?,
        academic_year: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn get_class(conn: &Connection, id: &str) -> StoreResult<Option<SchoolClass>> {
    let sql = format!("{} WHERE c.id = ?", CLASS_SELECT);
    Ok(conn.query_row(&sql, [id], class_from_row).optional()?)
}

pub fn find_class_by_name(
    conn: &Connection,
    school_id: &str,
    name: &str,
) -> StoreResult<Option<SchoolClass>> {
    let sql = format!("{} WHERE c.school_id = ? AND c.name = ?", CLASS_SELECT);
    Ok(conn
        .query_row(&sql, [school_id, name], class_from_row)
        .optional()?)
}

pub fn list_classes(conn: &Connection, school_id: Option<&str>) -> StoreResult<Vec<ClassListing>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.school_id, s.name, c.name, c.grade_level, c.academic_year, c.created_at,
           (SELECT COUNT(*) FROM students st WHERE st.class_id = c.id) AS student_count
         FROM classes c
         JOIN schools s ON s.id = c.school_id
         WHERE (?1 IS NULL OR c.school_id = ?1)
         ORDER BY s.name, c.name",
    )?;
    let rows = stmt
        .query_map([school_id], |row| {
            Ok(ClassListing {
                class: class_from_row(row)?,
                student_count: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_class(conn: &Connection, draft: &ClassDraft) -> StoreResult<SchoolClass> {
    let id = new_id();
    conn.execute(
        "INSERT INTO classes(id, school_id, name, grade_level, academic_year, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &id,
            &draft.school_id,
            &draft.name,
            &draft.grade_level,
            &draft.academic_year,
            now_rfc3339(),
        ),
    )
    .map_err(unique_as_duplicate("class"))?;
    let sql = format!("{} WHERE c.id = ?", CLASS_SELECT);
    Ok(conn.query_row(&sql, [&id], class_from_row)?)
}

pub fn get_or_create_class(conn: &Connection, draft: &ClassDraft) -> StoreResult<(SchoolClass, bool)> {
    let inserted = conn.execute(
        "INSERT INTO classes(id, school_id, name, grade_level, academic_year, created_at)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(school_id, name) DO NOTHING",
        (
            new_id(),
            &draft.school_id,
            &draft.name,
            &draft.grade_level,
            &draft.academic_year,
            now_rfc3339(),
        ),
    )?;
    let sql = format!("{} WHERE c.school_id = ? AND c.name = ?", CLASS_SELECT);
    let class = conn.query_row(&sql, [&draft.school_id, &draft.name], class_from_row)?;
    Ok((class, inserted == 1))
}

/// Moving a class to another school is refused while it has students, since
/// their school would no longer match the class's school.
pub fn update_class(conn: &Connection, id: &str, patch: &ClassPatch) -> StoreResult<Option<SchoolClass>> {
    let Some(mut class) = get_class(conn, id)? else {
        return Ok(None);
    };
    if let Some(v) = &patch.school_id {
        class.school_id = v.clone();
    }
    if let Some(v) = &patch.name {
        class.name = v.clone();
    }
    if let Some(v) = &patch.grade_level {
        class.grade_level = v.clone();
    }
    if let Some(v) = &patch.academic_year {
        class.academic_year = v.clone();
    }
    conn.execute(
        "UPDATE classes SET school_id = ?, name = ?, grade_level = ?, academic_year = ? WHERE id = ?",
        (
            &class.school_id,
            &class.name,
            &class.grade_level,
            &class.academic_year,
            id,
        ),
    )
    .map_err(unique_as_duplicate("class"))?;
    get_class(conn, id)
}

pub fn delete_class(conn: &Connection, id: &str) -> StoreResult<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM students WHERE class_id = ?", [id])?;
    let removed = tx.execute("DELETE FROM classes WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(removed == 1)
}
