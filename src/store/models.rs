use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored user, including the password digest.
///
/// Never serialized directly; the API maps it to a response without the digest.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("country_id", &self.country_id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating or replacing a user. The password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub country_id: i64,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("country_id", &self.country_id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(ToSchema, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub common_name: String,
    pub official_name: String,
    pub country_code: String,
    pub capital: String,
    pub region: String,
    #[serde(rename = "subregion")]
    pub sub_region: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCountry {
    pub common_name: String,
    pub official_name: String,
    pub country_code: String,
    pub capital: String,
    pub region: String,
    pub sub_region: String,
}

impl NewCountry {
    #[must_use]
    pub fn with_id(self, id: i64) -> Country {
        Country {
            id,
            common_name: self.common_name,
            official_name: self.official_name,
            country_code: self.country_code,
            capital: self.capital,
            region: self.region,
            sub_region: self.sub_region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_password_hash() {
        let user = NewUser {
            name: "Ann".to_string(),
            country_id: 1,
            email: "ann@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
        };
        assert!(!format!("{user:?}").contains("argon2id"));
    }

    #[test]
    fn country_serializes_camel_case() {
        let country = NewCountry {
            common_name: "Chile".to_string(),
            official_name: "Republic of Chile".to_string(),
            country_code: "CL".to_string(),
            capital: "Santiago".to_string(),
            region: "Americas".to_string(),
            sub_region: "South America".to_string(),
        }
        .with_id(3);
        let value = serde_json::to_value(&country).unwrap_or_default();
        assert_eq!(value["commonName"], "Chile");
        assert_eq!(value["countryCode"], "CL");
        assert_eq!(value["subregion"], "South America");
        assert_eq!(value["id"], 3);
    }
}
