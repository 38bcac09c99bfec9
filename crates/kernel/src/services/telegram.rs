//! Bot-facing Telegram user registry.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::telegram::DEFAULT_LANG;
use crate::models::{CreateTelegramUser, TargetCompany, TelegramUser};

const TELEGRAM_USER_EXISTS: &str = "Telegram user already exists";

/// Normalize a language code. Codes are two ASCII letters, stored lowercase.
pub fn normalize_lang(lang: &str) -> AppResult<String> {
    let lang = lang.trim();
    if lang.len() != 2 || !lang.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(AppError::Validation(format!(
            "language code must be two letters, got {lang:?}"
        )));
    }
    Ok(lang.to_ascii_lowercase())
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    pool: SqlitePool,
}

impl TelegramService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreateTelegramUser) -> AppResult<TelegramUser> {
        let lang = match input.lang.as_deref() {
            Some(lang) => normalize_lang(lang)?,
            None => DEFAULT_LANG.to_string(),
        };
        if TelegramUser::find(&self.pool, input.user_id).await?.is_some() {
            return Err(AppError::Conflict(TELEGRAM_USER_EXISTS.into()));
        }

        let user = TelegramUser::create(&self.pool, input.user_id, &lang)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, TELEGRAM_USER_EXISTS))?;
        info!(telegram_user = user.user_id, lang = %user.lang, "telegram user registered");
        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> AppResult<TelegramUser> {
        TelegramUser::find(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Telegram user"))
    }

    pub async fn set_lang(&self, user_id: i64, lang: &str) -> AppResult<TelegramUser> {
        let lang = normalize_lang(lang)?;
        TelegramUser::set_lang(&self.pool, user_id, &lang)
            .await?
            .ok_or_else(|| AppError::not_found("Telegram user"))
    }

    pub async fn assign_company(&self, user_id: i64, company_id: Uuid) -> AppResult<TelegramUser> {
        if TargetCompany::find_by_id(&self.pool, company_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Target company"));
        }
        TelegramUser::assign_company(&self.pool, user_id, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Telegram user"))
    }

    pub async fn touch(&self, user_id: i64) -> AppResult<TelegramUser> {
        TelegramUser::touch(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Telegram user"))
    }

    pub async fn delete(&self, user_id: i64) -> AppResult<()> {
        if !TelegramUser::delete(&self.pool, user_id).await? {
            return Err(AppError::not_found("Telegram user"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn lang_codes_are_normalized() {
        assert_eq!(normalize_lang(" EN ").unwrap(), "en");
        assert!(normalize_lang("eng").is_err());
        assert!(normalize_lang("e1").is_err());
        assert!(normalize_lang("").is_err());
    }
}
