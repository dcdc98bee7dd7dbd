// ============================
// portfolio-backend-lib/src/resume.rs
// ============================
//! Resume tree: institution -> position -> experience -> skill.
//!
//! Assembled with one query per level per parent id. Each node carries its
//! row's columns flattened next to a map of its children keyed by id.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::storage::{Gateway, Record, SqlParam};

pub type Resume = BTreeMap<i64, Institution>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Institution {
    #[serde(flatten)]
    pub fields: Record,
    pub positions: BTreeMap<i64, Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Position {
    #[serde(flatten)]
    pub fields: Record,
    pub experiences: BTreeMap<i64, Experience>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Experience {
    #[serde(flatten)]
    pub fields: Record,
    pub skills: BTreeMap<i64, Record>,
}

/// Build the full resume. Storage failures leave the affected branch empty.
pub async fn load_resume(gateway: &dyn Gateway) -> Resume {
    let mut resume = Resume::new();

    for (inst_id, fields) in keyed(gateway.query("SELECT * FROM institutions", &[]).await, "inst_id") {
        let mut institution = Institution {
            fields,
            positions: BTreeMap::new(),
        };

        let positions = children(gateway, "positions", "inst_id", inst_id).await;
        for (position_id, fields) in keyed(positions, "position_id") {
            let mut position = Position {
                fields,
                experiences: BTreeMap::new(),
            };

            let experiences = children(gateway, "experiences", "position_id", position_id).await;
            for (experience_id, fields) in keyed(experiences, "experience_id") {
                let skills = children(gateway, "skills", "experience_id", experience_id).await;
                position.experiences.insert(
                    experience_id,
                    Experience {
                        fields,
                        skills: keyed(skills, "skill_id").collect(),
                    },
                );
            }

            institution.positions.insert(position_id, position);
        }

        resume.insert(inst_id, institution);
    }

    resume
}

async fn children(gateway: &dyn Gateway, table: &str, parent_column: &str, parent_id: i64) -> Vec<Record> {
    let statement = format!("SELECT * FROM {table} WHERE {parent_column} = ?");
    gateway.query(&statement, &[SqlParam::Int(parent_id)]).await
}

/// Pair each row with its numeric id; rows without one are dropped
fn keyed(rows: Vec<Record>, id_column: &'static str) -> impl Iterator<Item = (i64, Record)> {
    rows.into_iter().filter_map(move |row| match row.get(id_column).and_then(id_of) {
        Some(id) => Some((id, row)),
        None => {
            warn!(column = id_column, "row without a usable id");
            None
        },
    })
}

fn id_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
