use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod schema {
    diesel::table! {
        departments (id) {
            id -> Uuid,
            name -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        users (id) {
            id -> Uuid,
            name -> Text,
            email -> Text,
            password_hash -> Text,
            role -> Text,
            department_id -> Nullable<Uuid>,
            client_company_name -> Nullable<Text>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        goals (id) {
            id -> Uuid,
            user_id -> Uuid,
            title -> Text,
            description -> Text,
            start_date -> Timestamptz,
            end_date -> Timestamptz,
            status -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        key_results (id) {
            id -> Uuid,
            goal_id -> Uuid,
            title -> Text,
            target_value -> Float8,
            current_value -> Float8,
            unit -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        one_on_ones (id) {
            id -> Uuid,
            supervisor_id -> Uuid,
            member_id -> Uuid,
            scheduled_at -> Timestamptz,
            status -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        agendas (id) {
            id -> Uuid,
            one_on_one_id -> Uuid,
            title -> Text,
            description -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        minutes (id) {
            id -> Uuid,
            one_on_one_id -> Uuid,
            speaker_id -> Uuid,
            content -> Text,
            timestamp -> Timestamptz,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        next_actions (id) {
            id -> Uuid,
            one_on_one_id -> Uuid,
            user_id -> Uuid,
            title -> Text,
            description -> Text,
            due_date -> Timestamptz,
            status -> Text,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }
}

pub use schema::*;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = departments)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department_id: Option<Uuid>,
    pub client_company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = goals)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = key_results)]
pub struct KeyResult {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub title: String,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = one_on_ones)]
pub struct OneOnOne {
    pub id: Uuid,
    pub supervisor_id: Uuid,
    pub member_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = agendas)]
pub struct Agenda {
    pub id: Uuid,
    pub one_on_one_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = minutes)]
pub struct Minute {
    pub id: Uuid,
    pub one_on_one_id: Uuid,
    pub speaker_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = next_actions)]
pub struct NextAction {
    pub id: Uuid,
    pub one_on_one_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
