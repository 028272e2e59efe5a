pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;
pub mod validation;

pub use bootcamp::{Bootcamp, BootcampPayload};
pub use course::{Course, CoursePayload, MinimumSkill};
pub use review::{Review, ReviewPayload};
pub use user::{User, UserPayload, UserRecord};
