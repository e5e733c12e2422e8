mod handler;
mod model;

pub use handler::{change_password, delete_user, get_users, insert_user, update_user};
pub use model::{
    ChangePasswordRequest, DeleteUserRequest, ProfileInfo, UpdateUserResponse, UserInfo, UserQuery,
};
