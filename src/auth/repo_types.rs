use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// User record as stored in `users.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,                   // opaque; older records carry numeric ids
    #[serde(default)]
    pub name: String,
    pub email: String,                // natural key, compared exactly
    pub password: String,             // Argon2 PHC string (legacy records: plaintext)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_answer: Option<String>,
    #[serde(default = "unknown_creation", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

fn unknown_creation() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_loads_as_text() {
        let users: Vec<User> = serde_json::from_str(
            r#"[{"id":1700000000000,"name":"Old","email":"old@example.com","password":"abc12!",
                 "createdAt":"2023-11-14T22:13:20.000Z"}]"#,
        )
        .unwrap();
        assert_eq!(users[0].id, "1700000000000");
        assert_eq!(users[0].created_at.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn bare_record_gets_defaults() {
        let users: Vec<User> = serde_json::from_str(
            r#"[{"name":"Old","email":"old@example.com","password":"abc12!"}]"#,
        )
        .unwrap();
        assert_eq!(users[0].id, "");
        assert_eq!(users[0].created_at, OffsetDateTime::UNIX_EPOCH);
        assert!(users[0].last_login.is_none());
    }
}
