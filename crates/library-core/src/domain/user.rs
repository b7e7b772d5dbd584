//! 회원(신원) 타입.
//!
//! - `User` - 저장된 신원 레코드 (비밀번호 해시 포함)
//! - `NewUser` - 가입 시 저장소에 전달되는 입력
//! - `UserUpdate` - 관리자 수정 입력

use serde::{Deserialize, Serialize};

use super::Role;

/// 저장된 회원 레코드.
///
/// `password_hash`는 응답 JSON에 절대 포함되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

/// 새 회원 입력 (이미 해시된 비밀번호).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// 회원 수정 입력.
///
/// `password_hash`가 `None`이면 기존 비밀번호를 유지합니다.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: Option<String>,
}

impl User {
    /// 수정 입력을 적용합니다.
    pub fn apply(&mut self, update: UserUpdate) {
        self.username = update.username;
        self.email = update.email;
        self.role = update.role;
        if let Some(hash) = update.password_hash {
            self.password_hash = hash;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::User,
            password_hash: "$argon2id$v=19$secret".to_string(),
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&alice()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains(r#""role":"USER""#));
    }

    #[test]
    fn test_apply_keeps_hash_when_absent() {
        let mut user = alice();
        user.apply(UserUpdate {
            username: "alice2".to_string(),
            email: "a2@example.com".to_string(),
            role: Role::Admin,
            password_hash: None,
        });

        assert_eq!(user.username, "alice2");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.password_hash, "$argon2id$v=19$secret");

        user.apply(UserUpdate {
            username: "alice2".to_string(),
            email: "a2@example.com".to_string(),
            role: Role::Admin,
            password_hash: Some("new-hash".to_string()),
        });
        assert_eq!(user.password_hash, "new-hash");
    }
}
