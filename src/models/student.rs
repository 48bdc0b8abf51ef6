//! Student model and the request bodies of the student workflow.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::CustomDesign;

/// Ordered mapping of unit key (`unit_<n>`) to the raw mark the student entered.
pub type UnitMarks = IndexMap<String, String>;

/// Prefix every stored unit-mark key carries.
pub const UNIT_KEY_PREFIX: &str = "unit_";

/// Approval state of a student account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Pending,
    Approved,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Pending => "pending",
            StudentStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(StudentStatus::Pending),
            "approved" => Some(StudentStatus::Approved),
            _ => None,
        }
    }
}

/// A registered student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub roll_no: String,
    pub school: String,
    /// Baseline marks declared at signup.
    pub marks: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub status: StudentStatus,
    pub signup_date: String,
    #[serde(default)]
    pub unit_marks: UnitMarks,
    #[serde(default)]
    pub custom_designs: Vec<CustomDesign>,
}

impl StudentRecord {
    pub fn is_approved(&self) -> bool {
        self.status == StudentStatus::Approved
    }

    pub fn find_design(&self, name: &str) -> Option<&CustomDesign> {
        self.custom_designs.iter().find(|d| d.name == name)
    }
}

/// Request body for signing up.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub roll_no: String,
    pub school: String,
    #[serde(default)]
    pub marks: String,
    pub password: String,
}

/// Request body for signing in.
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    pub name: String,
    pub password: String,
}

/// Response body for a successful sign in.
#[derive(Debug, Clone, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub student: StudentRecord,
}

/// Keep only `unit_`-prefixed entries, in request order, with every value as a string.
///
/// JSON numbers are accepted and stored in their textual form; `null` becomes an
/// empty mark.
pub fn unit_marks_from_form(form: IndexMap<String, serde_json::Value>) -> UnitMarks {
    form.into_iter()
        .filter(|(key, _)| key.starts_with(UNIT_KEY_PREFIX))
        .map(|(key, value)| {
            let raw = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, raw)
        })
        .collect()
}
