pub mod auth;
pub mod courses;
pub mod enrollment;
pub mod grades;
pub mod reports;
pub mod students;
pub mod teachers;
pub mod users;
