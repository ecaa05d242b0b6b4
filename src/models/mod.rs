pub mod feedback;
pub mod invite;
pub mod student;
pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::feedback::{self, Entity as Feedback};
    pub use super::invite::{self, Entity as Invite};
    pub use super::student::{self, Entity as Student};
    pub use super::user::{self, Entity as User};
}
