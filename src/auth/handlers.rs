use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, DeliveryMethod, LoginRequest, MeResponse, MessageResponse, PublicUser,
            RegisterRequest, RegisterResponse, UpdateProfileRequest, UpdateResponse, UserProfile,
            VerifyOtpRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::{NewUser, OtpCheck, OtpCode, ProfileChanges, User},
    },
    news::dto::{Category, Country},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/me", get(get_me))
        .route("/auth/update", put(update_profile))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Preferences are checked against the allow-lists up front; defaults
    // apply when a field is omitted.
    let country = match payload.country.as_deref() {
        Some(raw) => Country::parse(raw)
            .ok_or((StatusCode::BAD_REQUEST, format!("Unknown country: {raw}")))?,
        None => Country::default(),
    };
    let category = match payload.category.as_deref() {
        Some(raw) => Category::parse(raw)
            .ok_or((StatusCode::BAD_REQUEST, format!("Unknown category: {raw}")))?,
        None => Category::default(),
    };
    let delivery_method = match payload.delivery_method.as_deref() {
        Some(raw) => DeliveryMethod::parse(raw).ok_or((
            StatusCode::BAD_REQUEST,
            format!("Unknown delivery method: {raw}"),
        ))?,
        None => DeliveryMethod::default(),
    };

    if let Ok(Some(_)) = User::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "User already exists".into()));
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let user = match User::create(
        &state.db,
        &NewUser {
            name: &payload.name,
            email: &payload.email,
            password_hash: &hash,
            country: country.as_str(),
            category: category.as_str(),
            notify_daily: payload.notify_daily,
            delivery_method: delivery_method.as_str(),
            phone_number: payload.phone_number.as_deref(),
        },
    )
    .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            user: PublicUser {
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

/// Password step. On success a one-time code is issued and mailed; no token
/// is returned until the code is verified.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::NOT_FOUND, "User not found".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let code = generate_otp();
    let ttl = state.config.otp_ttl_minutes;
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl);

    // Upsert: a second login replaces any pending code for this email.
    if let Err(e) = OtpCode::upsert(&state.db, &user.email, &code, expires_at).await {
        error!(error = %e, "otp upsert failed");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    let body = format!("Your OTP is: {code}. It will expire in {ttl} minutes.");
    if let Err(e) = state
        .email
        .send(&user.email, "Your OTP for MeraPaper Login", &body)
        .await
    {
        error!(error = %e, email = %user.email, "otp email failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send OTP email".into(),
        ));
    }

    info!(user_id = %user.id, "otp issued");
    Ok(Json(MessageResponse {
        message: "OTP sent to email".into(),
    }))
}

/// OTP step: the only path to a session token. The stored code is consumed
/// on success, so each issued code verifies at most once.
#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let (email, otp) = match (payload.email, payload.otp) {
        (Some(e), Some(o)) => (e.trim().to_lowercase(), o),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Email and OTP are required".into(),
            ))
        }
    };

    let record = match OtpCode::find_by_email(&state.db, &email).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            warn!(email = %email, "no pending otp");
            return Err((StatusCode::NOT_FOUND, "No pending OTP for this email".into()));
        }
        Err(e) => {
            error!(error = %e, "otp lookup failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    match record.check(&otp, OffsetDateTime::now_utc()) {
        OtpCheck::Mismatch => {
            warn!(email = %email, "otp mismatch");
            return Err((StatusCode::UNAUTHORIZED, "Invalid OTP".into()));
        }
        OtpCheck::Expired => {
            warn!(email = %email, "otp expired");
            return Err((StatusCode::GONE, "OTP expired".into()));
        }
        OtpCheck::Valid => {}
    }

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "User not found".into())),
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if let Err(e) = OtpCode::delete(&state.db, &email).await {
        error!(error = %e, "otp delete failed");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(user_id = %user.id, "otp verified, session issued");
    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%user_id, "token resolves to no user");
            return Err((StatusCode::NOT_FOUND, "User not found".into()));
        }
        Err(e) => {
            error!(error = %e, %user_id, "find_by_id failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    Ok(Json(MeResponse {
        user: UserProfile::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateResponse>, (StatusCode, String)> {
    if let Some(raw) = payload.country.as_deref() {
        Country::parse(raw)
            .ok_or((StatusCode::BAD_REQUEST, format!("Unknown country: {raw}")))?;
    }
    if let Some(raw) = payload.category.as_deref() {
        Category::parse(raw)
            .ok_or((StatusCode::BAD_REQUEST, format!("Unknown category: {raw}")))?;
    }
    if let Some(raw) = payload.delivery_method.as_deref() {
        DeliveryMethod::parse(raw).ok_or((
            StatusCode::BAD_REQUEST,
            format!("Unknown delivery method: {raw}"),
        ))?;
    }

    let email = match payload.email {
        Some(raw) => {
            let email = raw.trim().to_lowercase();
            if !is_valid_email(&email) {
                return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
            }
            // The DB unique constraint backs this; the lookup gives a 409
            // instead of a constraint violation.
            match User::find_by_email(&state.db, &email).await {
                Ok(Some(other)) if other.id != user_id => {
                    warn!(email = %email, "email already taken");
                    return Err((StatusCode::CONFLICT, "Email already registered".into()));
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "find_by_email failed");
                    return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
                }
            }
            Some(email)
        }
        None => None,
    };

    let changes = ProfileChanges {
        name: payload.name,
        email,
        country: payload.country,
        category: payload.category,
        notify_daily: payload.notify_daily,
        delivery_method: payload.delivery_method,
        phone_number: payload.phone_number,
    };

    let user = match User::update_profile(&state.db, user_id, &changes).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%user_id, "update for missing user");
            return Err((StatusCode::NOT_FOUND, "User not found".into()));
        }
        Err(e) => {
            error!(error = %e, %user_id, "update_profile failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UpdateResponse {
        message: "Profile updated".into(),
        user: UserProfile::from(user),
    }))
}
