//! 사용자 역할.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 토큰의 `role` 클레임과 저장소의 역할 컬럼 모두 대문자 문자열("USER", "ADMIN")로 표현됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// 일반 회원 - 도서 대출/반납
    User,
    /// 관리자 - 도서/회원/대출 기록 관리
    Admin,
}

impl Role {
    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// 저장/직렬화에 쓰이는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// 주어진 역할 목록 중 하나인지 확인.
    pub fn is_any_of(&self, roles: &[Role]) -> bool {
        roles.contains(self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse(" User "), Some(Role::User));
        assert_eq!(Role::parse("librarian"), None);
        assert!("viewer".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");

        let parsed: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(parsed, Role::User);

        // 소문자는 직렬화 형식이 아님
        assert!(serde_json::from_str::<Role>("\"user\"").is_err());
    }

    #[test]
    fn test_is_any_of() {
        assert!(Role::Admin.is_any_of(&[Role::User, Role::Admin]));
        assert!(!Role::Admin.is_any_of(&[Role::User]));
        assert!(!Role::User.is_any_of(&[]));
    }
}
