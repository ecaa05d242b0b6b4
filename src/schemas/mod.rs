pub mod feedback;
pub mod invite;
pub mod student;

pub use feedback::*;
pub use invite::*;
pub use student::*;
