//! Repository traits and their SQLite implementations

mod article;
mod creator;
mod session;
mod user;

pub use article::{ArticleRepository, MutationError, SqlxArticleRepository};
pub use creator::{CreatorRepository, SqlxCreatorRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
