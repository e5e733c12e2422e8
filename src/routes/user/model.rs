use std::collections::HashMap;

use axum::extract::{Multipart, multipart::MultipartError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::user::{UserProfile, UserWithProfile};
use crate::error::FieldError;
use crate::storage::UploadedFile;
use crate::utils::normalize_username;

pub const MIN_PASSWORD_LEN: usize = 5;

/// 空字符串表示未填写
pub const VALID_GENDERS: [&str; 4] = ["male", "female", "other", ""];

pub fn is_valid_gender(gender: &str) -> bool {
    VALID_GENDERS.contains(&gender)
}

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
    pub avatar: String,
}

impl From<UserProfile> for ProfileInfo {
    fn from(p: UserProfile) -> Self {
        Self {
            name: p.name,
            birthday: p.birthday,
            phone: p.phone,
            gender: p.gender,
            email: p.email,
            address: p.address,
            date_join: p.date_join,
            insurance_number: p.insurance_number,
            id_card: p.id_card,
            avatar: p.avatar,
        }
    }
}

/// 列表返回的用户，不含密码哈希
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub profile: Option<ProfileInfo>,
}

impl From<UserWithProfile> for UserInfo {
    fn from(entry: UserWithProfile) -> Self {
        Self {
            id: entry.user.id,
            username: entry.user.username,
            created_at: entry.user.created_at,
            updated_at: entry.user.updated_at,
            deleted_at: entry.user.lifecycle.deleted_at(),
            profile: entry.profile.map(ProfileInfo::from),
        }
    }
}

/// multipart 表单：文本字段加可选的头像文件
#[derive(Debug, Default)]
pub struct ProfileForm {
    fields: HashMap<String, String>,
    pub avatar: Option<UploadedFile>,
}

impl ProfileForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = ProfileForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "avatar" {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // 未选择文件时浏览器仍会提交一个空文件名
                if let Some(file_name) = file_name.filter(|n| !n.is_empty()) {
                    form.avatar = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await?;
            form.fields.insert(name, value);
        }

        Ok(form)
    }

    /// 缺失的字段按空字符串处理
    pub fn value(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug)]
pub struct InsertUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
}

impl InsertUserRequest {
    pub fn from_form(form: &ProfileForm) -> Self {
        Self {
            username: normalize_username(form.value("username")),
            password: form.value("password").to_string(),
            name: form.value("name").to_string(),
            birthday: form.value("birthday").to_string(),
            phone: form.value("phone").to_string(),
            gender: form.value("gender").to_string(),
            email: form.value("email").to_string(),
            address: form.value("address").to_string(),
            date_join: form.value("start_date").to_string(),
            insurance_number: form.value("social_insurance_code").to_string(),
            id_card: form.value("id_card").to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.username.is_empty() {
            errors.push(FieldError {
                field: "username",
                rule: "required",
            });
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError {
                field: "password",
                rule: "min_length_5",
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug)]
pub struct UpdateUserRequest {
    pub username: String,
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
}

impl UpdateUserRequest {
    pub fn from_form(form: &ProfileForm) -> Self {
        Self {
            username: normalize_username(form.value("username")),
            name: form.value("name").to_string(),
            birthday: form.value("birthday").to_string(),
            phone: form.value("phone").to_string(),
            gender: form.value("gender").to_string(),
            email: form.value("email").to_string(),
            address: form.value("address").to_string(),
            date_join: form.value("date_join").to_string(),
            insurance_number: form.value("insurance_number").to_string(),
            id_card: form.value("id_card").to_string(),
        }
    }

    /// 把非空字段写入档案，返回是否有改动
    pub fn apply(&self, profile: &mut UserProfile) -> bool {
        let mut dirty = false;
        let updates = [
            (&self.name, &mut profile.name),
            (&self.birthday, &mut profile.birthday),
            (&self.phone, &mut profile.phone),
            (&self.gender, &mut profile.gender),
            (&self.email, &mut profile.email),
            (&self.address, &mut profile.address),
            (&self.date_join, &mut profile.date_join),
            (&self.insurance_number, &mut profile.insurance_number),
            (&self.id_card, &mut profile.id_card),
        ];
        for (value, column) in updates {
            if !value.is_empty() {
                *column = value.clone();
                dirty = true;
            }
        }
        dirty
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password_current: String,
    #[serde(default)]
    pub password_new: String,
}

impl ChangePasswordRequest {
    pub fn lengths_valid(&self) -> bool {
        self.password_current.chars().count() >= MIN_PASSWORD_LEN
            && self.password_new.chars().count() >= MIN_PASSWORD_LEN
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub avatar: String,
}
