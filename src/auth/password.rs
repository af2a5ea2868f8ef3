use crate::error::AppError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AppError::Internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AppError::Internal(format!("password verify task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to verify password: {err}")))
}
