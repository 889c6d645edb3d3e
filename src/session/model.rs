use crate::api::AppError;
use crate::models::string_or_number;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Supervisor,
    Tester,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "supervisor" => Ok(Role::Supervisor),
            "tester" => Ok(Role::Tester),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Role::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Supervisor => f.write_str("supervisor"),
            Role::Tester => f.write_str("tester"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// What the login call hands back, and what gets persisted between restarts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user: User,
}

impl Session {
    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }

    pub fn require_supervisor(&self, action: &str) -> Result<(), AppError> {
        if self.is_supervisor() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Only supervisors can {}", action)))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub name: String,
}

/// Session as shown to the UI: the token stays inside the service.
#[derive(Serialize, Clone, Debug)]
pub struct SessionInfo {
    pub role: Role,
    pub user: User,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        SessionInfo {
            role: session.role,
            user: session.user.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_login_response() {
        let session: Session = serde_json::from_value(json!({
            "token": "abc",
            "role": "Supervisor",
            "user": {"id": 3, "name": "Mei"}
        }))
        .unwrap();
        assert_eq!(session.role, Role::Supervisor);
        assert_eq!(session.user.id, "3");
        assert!(session.require_supervisor("delete units").is_ok());
    }

    #[test]
    fn rejects_unknown_roles() {
        let parsed = serde_json::from_value::<Session>(json!({
            "token": "abc",
            "role": "admin",
            "user": {"id": "u1", "name": "Mei"}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn testers_are_forbidden_supervisor_actions() {
        let session = Session {
            token: "t".to_string(),
            role: Role::Tester,
            user: User { id: "u1".to_string(), name: "Ola".to_string() },
        };
        match session.require_supervisor("create units") {
            Err(AppError::Forbidden(message)) => assert_eq!(message, "Only supervisors can create units"),
            _ => panic!("expected forbidden"),
        }
    }
}
