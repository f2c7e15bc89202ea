use serde::{Deserialize, Serialize};

use crate::auth::repo::User;

/// How the daily digest reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Email,
    Whatsapp,
}

impl DeliveryMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "whatsapp" => Some(Self::Whatsapp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }
}

impl Default for DeliveryMethod {
    fn default() -> Self {
        Self::Email
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub country: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub notify_daily: bool,
    pub delivery_method: Option<String>,
    pub phone_number: Option<String>,
}

/// Request body for the password step of login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the OTP step. Fields are optional so a missing one maps
/// to 400 rather than a body-rejection.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub notify_daily: Option<bool>,
    pub delivery_method: Option<String>,
    pub phone_number: Option<String>,
}

/// Public part of the user echoed after registration.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub name: String,
    pub email: String,
}

/// Full preference profile, returned once the caller is authenticated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub country: String,
    pub category: String,
    pub notify_daily: bool,
    pub delivery_method: String,
    pub phone_number: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email,
            country: user.country,
            category: user.category,
            notify_daily: user.notify_daily,
            delivery_method: user.delivery_method,
            phone_number: user.phone_number,
        }
    }
}

/// Response for register: token plus the public summary only.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Response for login: acknowledgment only, the token comes after the OTP.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response for verify-otp.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Response for GET /auth/me.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// Response for profile update.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn delivery_method_parses_known_values_only() {
        assert_eq!(DeliveryMethod::parse("email"), Some(DeliveryMethod::Email));
        assert_eq!(
            DeliveryMethod::parse("whatsapp"),
            Some(DeliveryMethod::Whatsapp)
        );
        assert_eq!(DeliveryMethod::parse("sms"), None);
    }

    #[test]
    fn profile_never_includes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            country: "in".into(),
            category: "top".into(),
            notify_daily: true,
            delivery_method: "email".into(),
            phone_number: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&UserProfile::from(user)).unwrap();
        assert!(json.contains("asha@example.com"));
        assert!(json.contains("notifyDaily"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn register_request_accepts_camel_case_fields() {
        let body = r#"{
            "name": "Asha",
            "email": "asha@example.com",
            "password": "longenough",
            "country": "in",
            "category": "sports",
            "notifyDaily": true,
            "deliveryMethod": "whatsapp",
            "phoneNumber": "+911234567890"
        }"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert!(req.notify_daily);
        assert_eq!(req.delivery_method.as_deref(), Some("whatsapp"));
        assert_eq!(req.phone_number.as_deref(), Some("+911234567890"));
    }
}
