use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Role;

/// JSON-тело запроса. Ошибки разбора превращаются в `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Параметры пути, например `{id}`. Неверный UUID даёт 400 с JSON-ответом.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Содержимое JWT, который выпускает сервис авторизации ERP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default)]
    pub department: Option<Uuid>,
    #[serde(default)]
    pub section: Option<Uuid>,
    pub exp: usize,
}

/// Текущий пользователь запроса.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub department: Option<Uuid>,
    pub section: Option<Uuid>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            department: claims.department,
            section: claims.section,
        }
    }
}

impl AuthUser {
    // Проверка роли на уровне маршрута
    pub fn require_role(&self, allowed: &[Role]) -> AppResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "User role '{}' is not authorized to access this route",
                self.role
            )))
        }
    }

    /// HOD кафедры, к которой относится секция.
    pub fn is_hod_of(&self, department: Option<Uuid>) -> bool {
        self.role == Role::Hod && department.is_some() && self.department == department
    }
}

// Bearer JWT extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!("JWT rejected: {:?}", e);
            AppError::Unauthorized("Not authorized, token failed".to_string())
        })?;

        Ok(AuthUser::from(data.claims))
    }
}
