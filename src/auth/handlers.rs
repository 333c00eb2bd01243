use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{PublicUser, SigninRequest, SignupRequest, TokenResponse},
        error::AuthError,
        extractors::{bearer_token, AuthUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    payload.validate()?;

    // Advisory check only; the unique constraint in User::create is
    // what actually prevents the duplicate under a race.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "signup with registered email");
        return Err(AuthError::Conflict);
    }

    let hash = hash_password(payload.password).await?;
    let user = User::create(&state.db, &payload.fullname, &payload.email, &hash).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, headers, payload))]
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let keys = JwtKeys::from_ref(&state);

    // A presented bearer token settles the request either way: a live
    // session blocks re-authentication, a dead one is rejected without
    // falling through to the password flow.
    if let Some(token) = bearer_token(&headers) {
        return match keys.verify(token) {
            Ok(claims) => {
                warn!(user_id = %claims.sub, "signin while already signed in");
                Err(AuthError::AlreadySignedIn)
            }
            Err(e) => {
                warn!(error = %e, "signin with rejected bearer token");
                Err(AuthError::InvalidBearer(e))
            }
        };
    }

    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "signin with unknown email");
            AuthError::NotFound
        })?;

    if !verify_password(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "signin with incorrect password");
        return Err(AuthError::WrongPassword);
    }

    let token = keys.sign(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(Json(PublicUser {
        id: user.id,
        fullname: user.fullname,
        email: user.email,
    }))
}
