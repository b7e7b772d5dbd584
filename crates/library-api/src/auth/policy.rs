//! 역할 기반 인가 정책.
//!
//! 경로 패턴과 HTTP 메서드를 필요한 역할로 매핑하는 정적 규칙 테이블입니다.
//! 규칙은 순서대로 평가되며 처음 일치한 규칙이 적용됩니다.
//!
//! 경로 패턴 문법:
//! - `*` - 한 세그먼트
//! - `**` - 0개 이상의 세그먼트

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use library_core::Role;

use super::error::AuthError;
use super::principal::AuthenticatedPrincipal;
use crate::state::AppState;

/// 접근 요구 수준.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// 인증 불필요
    Public,
    /// 인증된 주체라면 역할 무관
    Authenticated,
    /// 지정된 역할 중 하나 필요
    AnyRole(Vec<Role>),
}

/// 인가 판정 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// 인증 주체 없음
    DenyUnauthenticated,
    /// 주체의 역할이 부족함
    DenyForbidden,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// 정책 규칙 하나.
#[derive(Debug, Clone)]
pub struct Rule {
    /// `None`이면 모든 메서드
    method: Option<Method>,
    patterns: Vec<&'static str>,
    access: Access,
}

impl Rule {
    /// 모든 메서드에 적용되는 규칙.
    pub fn any_method(patterns: &[&'static str], access: Access) -> Self {
        Self {
            method: None,
            patterns: patterns.to_vec(),
            access,
        }
    }

    /// 특정 메서드에만 적용되는 규칙.
    pub fn for_method(method: Method, patterns: &[&'static str], access: Access) -> Self {
        Self {
            method: Some(method),
            patterns: patterns.to_vec(),
            access,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method)
            && self.patterns.iter().any(|pattern| path_matches(pattern, path))
    }
}

/// 순서가 있는 인가 규칙 테이블.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<Rule>,
    fallback: Access,
}

impl AuthorizationPolicy {
    /// 규칙 목록과 기본 접근 수준으로 정책 생성.
    pub fn new(rules: Vec<Rule>, fallback: Access) -> Self {
        Self { rules, fallback }
    }

    /// 도서관 API 정책.
    pub fn library() -> Self {
        let admin = || Access::AnyRole(vec![Role::Admin]);

        Self::new(
            vec![
                Rule::for_method(Method::OPTIONS, &["/**"], Access::Public),
                Rule::any_method(&["/auth/login", "/api/users/register"], Access::Public),
                Rule::for_method(Method::GET, &["/health", "/health/ready"], Access::Public),
                Rule::for_method(Method::GET, &["/api/books/**"], Access::Public),
                Rule::any_method(&["/api/books/admin/**"], admin()),
                Rule::any_method(&["/api/borrows/all"], admin()),
                Rule::any_method(&["/api/borrows/admin/**"], admin()),
                Rule::for_method(
                    Method::POST,
                    &["/api/borrows/user/borrow", "/api/borrows/user/return/**"],
                    Access::AnyRole(vec![Role::User]),
                ),
                Rule::any_method(
                    &["/api/borrows/user/**"],
                    Access::AnyRole(vec![Role::User, Role::Admin]),
                ),
                Rule::any_method(&["/api/users/all", "/api/users/admin/**"], admin()),
            ],
            Access::Authenticated,
        )
    }

    /// 요청에 적용될 접근 수준.
    pub fn access_for(&self, method: &Method, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| &rule.access)
            .unwrap_or(&self.fallback)
    }

    /// 요청과 인증 주체에 대한 인가 판정.
    pub fn evaluate(
        &self,
        method: &Method,
        path: &str,
        principal: Option<&AuthenticatedPrincipal>,
    ) -> Decision {
        match (self.access_for(method, path), principal) {
            (Access::Public, _) => Decision::Allow,
            (_, None) => Decision::DenyUnauthenticated,
            (Access::Authenticated, Some(_)) => Decision::Allow,
            (Access::AnyRole(roles), Some(p)) if p.role.is_any_of(roles) => Decision::Allow,
            (Access::AnyRole(_), Some(_)) => Decision::DenyForbidden,
        }
    }
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::library()
    }
}

/// Ant 스타일 경로 매칭.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    match_segments(&segments(pattern), &segments(path))
}

fn segments(s: &str) -> Vec<&str> {
    s.split('/').filter(|seg| !seg.is_empty()).collect()
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((&"**", rest)) => (0..=path.len()).any(|skip| match_segments(rest, &path[skip..])),
        Some((expected, rest)) => match path.split_first() {
            Some((actual, path_rest)) => {
                (*expected == "*" || expected == actual) && match_segments(rest, path_rest)
            }
            None => false,
        },
    }
}

/// 인가 미들웨어.
///
/// 인증 미들웨어 이후에 실행되어야 합니다.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let principal = request.extensions().get::<AuthenticatedPrincipal>();
    let decision = state
        .policy
        .evaluate(request.method(), request.uri().path(), principal);

    match decision {
        Decision::Allow => {
            debug!(method = %request.method(), path = %request.uri().path(), "Access granted");
            next.run(request).await
        }
        Decision::DenyUnauthenticated => {
            warn!(method = %request.method(), path = %request.uri().path(), "Anonymous request to protected route");
            AuthError::Forbidden.into_response()
        }
        Decision::DenyForbidden => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                username = principal.map(|p| p.username.as_str()).unwrap_or_default(),
                "Insufficient role"
            );
            AuthError::Forbidden.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal::new("alice", Role::User)
    }

    fn admin() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal::new("root", Role::Admin)
    }

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/api/books/**", "/api/books"));
        assert!(path_matches("/api/books/**", "/api/books/7"));
        assert!(path_matches("/api/books/**", "/api/books/search/title"));
        assert!(!path_matches("/api/books/**", "/api/bookshelf"));
        assert!(path_matches("/api/users/*", "/api/users/3"));
        assert!(!path_matches("/api/users/*", "/api/users/3/extra"));
        assert!(path_matches("/auth/login", "/auth/login/"));
        assert!(!path_matches("/auth/login", "/auth"));
        assert!(path_matches("/**", "/"));
    }

    #[test]
    fn test_public_routes() {
        let policy = AuthorizationPolicy::library();
        for (method, path) in [
            (Method::POST, "/auth/login"),
            (Method::POST, "/api/users/register"),
            (Method::GET, "/api/books"),
            (Method::GET, "/api/books/12"),
            (Method::GET, "/api/books/search/category"),
            (Method::OPTIONS, "/api/users/all"),
            (Method::GET, "/health"),
        ] {
            assert_eq!(policy.evaluate(&method, path, None), Decision::Allow, "{method} {path}");
        }
    }

    #[test]
    fn test_book_admin_routes() {
        let policy = AuthorizationPolicy::library();

        assert_eq!(
            policy.evaluate(&Method::POST, "/api/books/admin", None),
            Decision::DenyUnauthenticated
        );
        assert_eq!(
            policy.evaluate(&Method::PUT, "/api/books/admin/4", Some(&user())),
            Decision::DenyForbidden
        );
        assert_eq!(
            policy.evaluate(&Method::DELETE, "/api/books/admin/4", Some(&admin())),
            Decision::Allow
        );
    }

    #[test]
    fn test_borrow_routes() {
        let policy = AuthorizationPolicy::library();

        // 대출/반납은 USER 전용
        assert_eq!(
            policy.evaluate(&Method::POST, "/api/borrows/user/borrow", Some(&user())),
            Decision::Allow
        );
        assert_eq!(
            policy.evaluate(&Method::POST, "/api/borrows/user/borrow", Some(&admin())),
            Decision::DenyForbidden
        );
        assert_eq!(
            policy.evaluate(&Method::POST, "/api/borrows/user/return/9", Some(&admin())),
            Decision::DenyForbidden
        );

        // 내 대출 목록은 둘 다 허용
        for principal in [user(), admin()] {
            assert_eq!(
                policy.evaluate(&Method::GET, "/api/borrows/user/my-borrows", Some(&principal)),
                Decision::Allow
            );
        }

        assert_eq!(
            policy.evaluate(&Method::GET, "/api/borrows/all", Some(&user())),
            Decision::DenyForbidden
        );
        assert_eq!(
            policy.evaluate(&Method::DELETE, "/api/borrows/admin/2", Some(&admin())),
            Decision::Allow
        );
    }

    #[test]
    fn test_user_routes() {
        let policy = AuthorizationPolicy::library();

        assert_eq!(
            policy.evaluate(&Method::GET, "/api/users/all", Some(&user())),
            Decision::DenyForbidden
        );
        assert_eq!(
            policy.evaluate(&Method::PUT, "/api/users/admin/3", Some(&admin())),
            Decision::Allow
        );
        // 나머지는 인증만 필요
        assert_eq!(
            policy.evaluate(&Method::GET, "/api/users/3", Some(&user())),
            Decision::Allow
        );
        assert_eq!(
            policy.evaluate(&Method::GET, "/api/users/3", None),
            Decision::DenyUnauthenticated
        );
    }

    #[test]
    fn test_first_match_wins() {
        let policy = AuthorizationPolicy::new(
            vec![
                Rule::any_method(&["/a/**"], Access::Public),
                Rule::any_method(&["/a/b"], Access::AnyRole(vec![Role::Admin])),
            ],
            Access::Authenticated,
        );

        assert_eq!(policy.access_for(&Method::GET, "/a/b"), &Access::Public);
        assert_eq!(policy.access_for(&Method::GET, "/z"), &Access::Authenticated);
    }
}
