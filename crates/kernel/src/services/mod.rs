//! Domain services.
//!
//! Each service owns the storage handle (and any collaborators) it needs and
//! returns [`AppResult`](crate::error::AppResult) so route handlers stay thin.

pub mod auth;
pub mod click;
pub mod contact;
pub mod deal;
pub mod lead;
pub mod password;
pub mod target;
pub mod telegram;
pub mod token;
pub mod user;

pub use auth::AuthService;
pub use click::ClickService;
pub use contact::ContactService;
pub use deal::DealService;
pub use lead::LeadService;
pub use target::{TargetService, TargetView};
pub use telegram::TelegramService;
pub use token::{Claims, TokenConfig, TokenError, TokenKind, TokenPair, TokenService};
pub use user::{CreateUserRequest, UserService};
