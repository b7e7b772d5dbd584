//! 요청 범위 인증 주체.

use axum::{extract::FromRequestParts, http::request::Parts};

use library_core::Role;

use super::error::AuthError;

/// 인증된 요청 주체.
///
/// 인증 미들웨어가 request extensions에 넣고, 인가 정책과 핸들러가 읽습니다.
/// 한 요청 동안만 유효합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub username: String,
    pub role: Role,
}

impl AuthenticatedPrincipal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// 인증된 주체를 꺼내는 추출기.
///
/// 주체가 없으면 403으로 거부합니다.
///
/// ```rust,ignore
/// async fn my_borrows(CurrentUser(principal): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", principal.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_installed_principal() {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        request
            .extensions_mut()
            .insert(AuthenticatedPrincipal::new("alice", Role::User));
        let (mut parts, _) = request.into_parts();

        let CurrentUser(principal) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_principal_is_forbidden() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), AuthError::Forbidden);
    }
}
