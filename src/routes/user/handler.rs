use axum::{
    extract::{
        Extension, Form, Json, Multipart, Query, State,
        multipart::MultipartRejection,
        rejection::{FormRejection, JsonRejection},
    },
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    AppState,
    database::models::user::{NewUser, NewUserProfile, UserFilter},
    error::AppError,
    storage::AvatarStorage,
    utils::{Claims, hash_password, message_response, messages, verify_password},
};

use super::model::{
    ChangePasswordRequest, DeleteUserRequest, InsertUserRequest, ProfileForm, UpdateUserRequest,
    UpdateUserResponse, UserInfo, UserQuery, is_valid_gender,
};

async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> Result<ProfileForm, AppError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!("multipart rejected: {}", e);
        AppError::ParamError
    })?;
    ProfileForm::read(multipart).await.map_err(|e| {
        tracing::debug!("multipart read failed: {}", e);
        AppError::ParamError
    })
}

/// 查询用户列表或单个用户
#[axum::debug_handler]
pub async fn get_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<UserInfo>>, AppError> {
    // 没有任何条件时返回当前登录用户
    let username = if params.kind.is_empty() && params.username.is_empty() {
        claims.username.clone()
    } else {
        params.username
    };

    let filter = if !username.is_empty() {
        UserFilter::Username(username)
    } else {
        match params.kind.as_str() {
            "" => UserFilter::Active,
            "delete" => UserFilter::Deleted,
            "all" => UserFilter::All,
            other => {
                tracing::debug!("unknown user list type: {}", other);
                return Ok(Json(Vec::new()));
            }
        }
    };

    let users = state.users.list_users(filter).await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

/// 新建用户及其档案
#[axum::debug_handler]
pub async fn insert_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart).await?;
    let req = InsertUserRequest::from_form(&form);

    if state.users.find_active_user(&req.username).await?.is_some() {
        return Err(AppError::UsernameExists);
    }

    if !is_valid_gender(&req.gender) {
        return Err(AppError::GenderInvalid);
    }

    req.validate().map_err(AppError::Validation)?;

    let password_hash =
        hash_password(&req.password, state.config.bcrypt_cost).map_err(AppError::system)?;

    let avatar = match form.avatar.as_ref().map(AvatarStorage::avatar_path) {
        Some(Ok(path)) => path,
        Some(Err(e)) => {
            tracing::warn!("ignoring avatar for {}: {}", req.username, e);
            String::new()
        }
        None => String::new(),
    };

    let new_user = NewUser {
        username: req.username,
        password_hash,
    };
    let new_profile = NewUserProfile {
        name: req.name,
        birthday: req.birthday,
        phone: req.phone,
        gender: req.gender,
        email: req.email,
        address: req.address,
        date_join: req.date_join,
        insurance_number: req.insurance_number,
        id_card: req.id_card,
        avatar: avatar.clone(),
    };
    let (user, _) = state
        .users
        .create_user_with_profile(new_user, new_profile)
        .await
        .map_err(|e| AppError::InsertFailed(e.to_string()))?;

    if let Some(file) = form.avatar.as_ref().filter(|_| !avatar.is_empty()) {
        if let Err(e) = state.avatars.save(file).await {
            tracing::warn!("Failed to save avatar for {}: {}", user.username, e);
        }
    }

    tracing::info!("user {} inserted", user.username);
    Ok(message_response(messages::SUCCESS))
}

/// 按字段更新档案，空字段保持不变
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart).await?;
    let req = UpdateUserRequest::from_form(&form);

    let user = state
        .users
        .find_active_user(&req.username)
        .await?
        .ok_or(AppError::UpdateTargetMissing)?;

    let mut profile = state
        .users
        .find_profile(user.id)
        .await?
        .ok_or(AppError::ProfileIncorrect)?;

    if !is_valid_gender(&req.gender) {
        return Err(AppError::GenderInvalid);
    }

    let mut dirty = req.apply(&mut profile);

    if let Some(file) = &form.avatar {
        match state.avatars.save(file).await {
            Ok(path) => {
                profile.avatar = path;
                dirty = true;
            }
            Err(e) => tracing::warn!("Failed to save avatar for {}: {}", user.username, e),
        }
    }

    if !dirty {
        return Err(AppError::NoChange);
    }

    state.users.save_profile(&profile).await?;

    tracing::info!("profile of {} updated", user.username);
    Ok(Json(UpdateUserResponse {
        message: messages::SUCCESS.into(),
        avatar: profile.avatar,
    }))
}

/// 软删除用户和档案，并立即撤销会话
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    payload: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("delete body rejected: {}", e);
        AppError::ParamError
    })?;

    let user = state
        .users
        .find_active_user(&req.username)
        .await?
        .ok_or(AppError::UsernameIncorrect)?;

    if state.users.find_profile(user.id).await?.is_none() {
        return Err(AppError::ProfileIncorrect);
    }

    // 先撤销会话，写库失败时用户仍是未删除状态
    state.sessions.delete(&user.username).await?;
    state.users.soft_delete(user.id, Utc::now()).await?;

    tracing::info!("user {} deleted", user.username);
    Ok(message_response(messages::SUCCESS))
}

/// 修改当前登录用户的密码，现有会话保持有效
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    form: Result<Form<ChangePasswordRequest>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(req) = form.map_err(|e| {
        tracing::debug!("change-password form rejected: {}", e);
        AppError::PasswordInvalid
    })?;

    if !req.lengths_valid() {
        return Err(AppError::PasswordInvalid);
    }

    let mut user = state
        .users
        .find_active_user(&claims.username)
        .await?
        .ok_or(AppError::AccountMissing)?;

    match verify_password(&req.password_current, &user.password) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::PasswordCurrentIncorrect),
        Err(e) => {
            tracing::warn!("stored hash unreadable for {}: {}", user.username, e);
            return Err(AppError::PasswordCurrentIncorrect);
        }
    }

    user.password =
        hash_password(&req.password_new, state.config.bcrypt_cost).map_err(AppError::system)?;
    state.users.save_user(&user).await?;

    tracing::info!("password of {} changed", user.username);
    Ok(message_response(messages::SUCCESS))
}
