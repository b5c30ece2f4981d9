use serde::Serialize;

use crate::domain::auth::models::AuthOutcome;
use crate::inbound::http::handlers::users::UserData;

pub mod login;
pub mod logout;
pub mod me;
pub mod register;

pub use login::login;
pub use logout::logout;
pub use me::me;
pub use register::register;

/// Payload returned by register and login.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseData {
    pub token: String,
    pub user: UserData,
}

impl From<AuthOutcome> for AuthResponseData {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            token: outcome.token,
            user: UserData::from(outcome.user),
        }
    }
}
