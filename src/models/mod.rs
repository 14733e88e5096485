//! Data models
//!
//! Entities, validated input types, and the pure merge logic used by the
//! partial-update paths.

mod article;
mod creator;
mod session;
mod user;
mod validation;

pub use article::{Article, ArticlePatch, FilterCriteria, NewArticle, SearchCriteria};
pub use creator::{Creator, CreatorPatch, CreatorProfile, NewCreator, RegisterCreator};
pub use session::{PrincipalKind, Session};
pub use user::{NewUser, RegisterUser, User, UserPatch, UserProfile};
pub use validation::ValidationErrors;
