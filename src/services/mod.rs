//! Business logic services

mod article;
mod creator;
mod email;
pub mod password;
mod session;
mod user;

pub use article::{ArticleService, ArticleServiceError};
pub use creator::{CreatorService, CreatorServiceError};
pub use email::Mailer;
pub use session::SessionService;
pub use user::{UserService, UserServiceError};
