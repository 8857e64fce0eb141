//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// User record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

/// New user for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub created_at: &'a str,
}

/// Page record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::pages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PageRecord {
    pub id: String,
    pub user_id: String,
    pub image_path: String,
    pub segment_index: i32,
    pub ocr_parsed_text: Option<String>,
    pub summary: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New page for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::pages)]
pub struct NewPage<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub image_path: &'a str,
    pub segment_index: i32,
    pub ocr_parsed_text: Option<&'a str>,
    pub summary: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
