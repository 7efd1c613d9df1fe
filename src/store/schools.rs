use super::{new_id, now_rfc3339, unique_as_duplicate, StoreResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct School {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolListing {
    #[serde(flatten)]
    pub school: School,
    pub class_count: i64,
    pub student_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SchoolDraft {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct SchoolPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

const SCHOOL_COLUMNS: &str = "id, name, address, phone, email, created_at";

fn school_from_row(row: &Row<'_>) -> rusqlite::Result<School> {
    Ok(School {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn get_school(conn: &Connection, id: &str) -> StoreResult<Option<School>> {
    let sql = format!("SELECT {} FROM schools WHERE id = ?", SCHOOL_COLUMNS);
    Ok(conn.query_row(&sql, [id], school_from_row).optional()?)
}

pub fn find_school_by_name(conn: &Connection, name: &str) -> StoreResult<Option<School>> {
    let sql = format!("SELECT {} FROM schools WHERE name = ?", SCHOOL_COLUMNS);
    Ok(conn.query_row(&sql, [name], school_from_row).optional()?)
}

pub fn list_schools(conn: &Connection) -> StoreResult<Vec<SchoolListing>> {
    // Correlated subqueries avoid double-counting from joins.
    let mut stmt = conn.prepare(
        "SELECT
           s.id, s.name, s.address, s.phone, s.email, s.created_at,
           (SELECT COUNT(*) FROM classes c WHERE c.school_id = s.id) AS class_count,
           (SELECT COUNT(*) FROM students st WHERE st.school_id = s.id) AS student_count
         FROM schools s
         ORDER BY s.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SchoolListing {
                school: school_from_row(row)?,
                class_count: row.get(6)?,
                student_count: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create_school(conn: &Connection, draft: &SchoolDraft) -> StoreResult<School> {
    let id = new_id();
    conn.execute(
        "INSERT INTO schools(id, name, address, phone, email, created_at) VALUES(?, ?, ?, ?, ?, ?)",
        (
            &id,
            &draft.name,
            &draft.address,
            &draft.phone,
            &draft.email,
            now_rfc3339(),
        ),
    )
    .map_err(unique_as_duplicate("school"))?;
    let sql = format!("SELECT {} FROM schools WHERE id = ?", SCHOOL_COLUMNS);
    Ok(conn.query_row(&sql, [&id], school_from_row)?)
}

pub fn get_or_create_school(conn: &Connection, draft: &SchoolDraft) -> StoreResult<(School, bool)> {
    let inserted = conn.execute(
        "INSERT INTO schools(id, name, address, phone, email, created_at) VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(name) DO NOTHING",
        (
            new_id(),
            &draft.name,
            &draft.address,
            &draft.phone,
            &draft.email,
            now_rfc3339(),
        ),
    )?;
    let sql = format!("SELECT {} FROM schools WHERE name = ?", SCHOOL_COLUMNS);
    let school = conn.query_row(&sql, [&draft.name], school_from_row)?;
    Ok((school, inserted == 1))
}

pub fn update_school(conn: &Connection, id: &str, patch: &SchoolPatch) -> StoreResult<Option<School>> {
    let Some(mut school) = get_school(conn, id)? else {
        return Ok(None);
    };
    if let Some(v) = &patch.name {
        school.name = v.clone();
    }
    if let Some(v) = &patch.address {
        school.address = v.clone();
    }
    if let Some(v) = &patch.phone {
        school.phone = v.clone();
    }
    if let Some(v) = &patch.email {
        school.email = v.clone();
    }
    conn.execute(
        "UPDATE schools SET name = ?, address = ?, phone = ?, email = ? WHERE id = ?",
        (&school.name, &school.address, &school.phone, &school.email, id),
    )
    .map_err(unique_as_duplicate("school"))?;
    Ok(Some(school))
}

pub fn delete_school(conn: &Connection, id: &str) -> StoreResult<bool> {
    let tx = conn.unchecked_transaction()?;
    // Dependency order; there is no ON DELETE CASCADE.
    tx.execute("DELETE FROM students WHERE school_id = ?", [id])?;
    tx.execute("DELETE FROM classes WHERE school_id = ?", [id])?;
    let removed = tx.execute("DELETE FROM schools WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(removed == 1)
}
