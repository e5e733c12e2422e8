mod handler;
mod model;

pub use handler::{check_token, login, logout};
pub use model::{LoginRequest, LoginResponse};
