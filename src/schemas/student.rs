use serde::{Deserialize, Serialize};

use crate::models::student;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentSearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentView {
    pub id: i64,
    pub name: String,
    pub roll_number: Option<String>,
    pub email: Option<String>,
}

impl From<student::Model> for StudentView {
    fn from(student: student::Model) -> Self {
        Self {
            id: student.id,
            name: student.name,
            roll_number: student.roll_number,
            email: student.email,
        }
    }
}
