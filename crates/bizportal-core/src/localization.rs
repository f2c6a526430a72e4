//! UI language preference and message lookup.
//!
//! The selected language is persisted in the durable store under
//! `localizationLanguage`, always as an uppercase code. Chinese is the
//! default and is written back the first time the preference is read.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Preference key for the UI language
pub const LANGUAGE_KEY: &str = "localizationLanguage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Language {
    #[default]
    #[serde(rename = "ZH")]
    Zh,
    #[serde(rename = "VI")]
    Vi,
    #[serde(rename = "JA")]
    Ja,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Zh, Language::Vi, Language::Ja];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "ZH",
            Language::Vi => "VI",
            Language::Ja => "JA",
        }
    }

    /// Name shown in the language picker
    pub fn native_name(&self) -> &'static str {
        match self {
            Language::Zh => "中文",
            Language::Vi => "Tiếng Việt",
            Language::Ja => "日本語",
        }
    }

    /// Locale tag for date and number formatting
    pub fn locale(&self) -> &'static str {
        match self {
            Language::Zh => "zh-CN",
            Language::Vi => "vi-VN",
            Language::Ja => "ja-JP",
        }
    }

    fn messages(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::Zh => ZH_MESSAGES,
            Language::Vi => VI_MESSAGES,
            Language::Ja => JA_MESSAGES,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ZH" => Ok(Language::Zh),
            "VI" => Ok(Language::Vi),
            "JA" => Ok(Language::Ja),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Message keys used outside this module
pub mod keys {
    pub const AUTH_INVALID_RESPONSE: &str = "auth-invalid-response";
    pub const AUTH_AUTHENTICATION_FAILED: &str = "auth-authentication-failed";
    pub const AUTH_LOGOUT_FAILED: &str = "auth-logout-failed";
    pub const AUTH_GET_USER_FAILED: &str = "auth-get-user-failed";
    pub const AUTH_RESET_PASSWORD_FAILED: &str = "auth-reset-password-failed";
    pub const AUTH_CHANGE_PASSWORD_FAILED: &str = "auth-change-password-failed";
    pub const AUTH_CREATE_ACCOUNT_FAILED: &str = "auth-create-account-failed";
    pub const LOGIN_FORM_LOGIN_TITLE: &str = "login-form-login-title";
    pub const LOGIN_FORM_USERCODE: &str = "login-form-usercode";
    pub const LOGIN_FORM_PASSWORD: &str = "login-form-password";
    pub const LOGIN_FORM_ORGCODE: &str = "login-form-orgcode";
    pub const HOME_TITLE: &str = "home-title";
    pub const TASKS_TITLE: &str = "tasks-title";
}

const ZH_MESSAGES: &[(&str, &str)] = &[
    (keys::AUTH_INVALID_RESPONSE, "服务器响应无效"),
    (keys::AUTH_AUTHENTICATION_FAILED, "身份验证失败"),
    (keys::AUTH_LOGOUT_FAILED, "登出失败"),
    (keys::AUTH_GET_USER_FAILED, "获取用户信息失败"),
    (keys::AUTH_RESET_PASSWORD_FAILED, "重置密码失败"),
    (keys::AUTH_CHANGE_PASSWORD_FAILED, "修改密码失败"),
    (keys::AUTH_CREATE_ACCOUNT_FAILED, "创建账户失败"),
    (keys::LOGIN_FORM_LOGIN_TITLE, "登录"),
    (keys::LOGIN_FORM_USERCODE, "用户代码"),
    (keys::LOGIN_FORM_PASSWORD, "密码"),
    (keys::LOGIN_FORM_ORGCODE, "组织代码"),
    (keys::HOME_TITLE, "首页"),
    (keys::TASKS_TITLE, "任务"),
];

const VI_MESSAGES: &[(&str, &str)] = &[
    (keys::AUTH_INVALID_RESPONSE, "Phản hồi từ máy chủ không hợp lệ"),
    (keys::AUTH_AUTHENTICATION_FAILED, "Xác thực thất bại"),
    (keys::AUTH_LOGOUT_FAILED, "Đăng xuất thất bại"),
    (keys::AUTH_GET_USER_FAILED, "Không lấy được thông tin người dùng"),
    (keys::AUTH_RESET_PASSWORD_FAILED, "Đặt lại mật khẩu thất bại"),
    (keys::AUTH_CHANGE_PASSWORD_FAILED, "Đổi mật khẩu thất bại"),
    (keys::AUTH_CREATE_ACCOUNT_FAILED, "Tạo tài khoản thất bại"),
    (keys::LOGIN_FORM_LOGIN_TITLE, "Đăng nhập"),
    (keys::LOGIN_FORM_USERCODE, "Mã người dùng"),
    (keys::LOGIN_FORM_PASSWORD, "Mật khẩu"),
    (keys::LOGIN_FORM_ORGCODE, "Mã tổ chức"),
    (keys::HOME_TITLE, "Trang chủ"),
    (keys::TASKS_TITLE, "Công việc"),
];

const JA_MESSAGES: &[(&str, &str)] = &[
    (keys::AUTH_INVALID_RESPONSE, "サーバーの応答が無効です"),
    (keys::AUTH_AUTHENTICATION_FAILED, "認証に失敗しました"),
    (keys::AUTH_LOGOUT_FAILED, "ログアウトに失敗しました"),
    (keys::AUTH_GET_USER_FAILED, "ユーザー情報の取得に失敗しました"),
    (keys::AUTH_RESET_PASSWORD_FAILED, "パスワードのリセットに失敗しました"),
    (keys::AUTH_CHANGE_PASSWORD_FAILED, "パスワードの変更に失敗しました"),
    (keys::AUTH_CREATE_ACCOUNT_FAILED, "アカウントの作成に失敗しました"),
    (keys::LOGIN_FORM_LOGIN_TITLE, "ログイン"),
    (keys::LOGIN_FORM_USERCODE, "ユーザーコード"),
    (keys::LOGIN_FORM_PASSWORD, "パスワード"),
    (keys::LOGIN_FORM_ORGCODE, "組織コード"),
    (keys::HOME_TITLE, "ホーム"),
    (keys::TASKS_TITLE, "タスク"),
];

/// Pure table lookup for one language
pub fn translate_in(language: Language, key: &str) -> String {
    language
        .messages()
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, msg)| msg.to_string())
        .unwrap_or_else(|| format!("Untranslated message with id:{}", key))
}

/// Current UI language plus message lookup.
pub struct Localizer {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Language>,
}

impl Localizer {
    /// Load the language preference from `store`, writing the default back
    /// when none is set.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let language = Self::read_preference(store.as_ref());
        Self {
            store,
            current: RwLock::new(language),
        }
    }

    fn read_preference(store: &dyn KeyValueStore) -> Language {
        let stored = store.get(LANGUAGE_KEY);
        let language = match stored.as_deref().map(str::parse::<Language>) {
            None => Language::default(),
            Some(Ok(language)) => language,
            Some(Err(e)) => {
                warn!(error = %e, "Stored language not supported, using default");
                Language::default()
            }
        };

        // Keep the stored code canonical
        if stored.as_deref() != Some(language.code()) {
            store.set(LANGUAGE_KEY, language.code());
        }
        language
    }

    pub fn language(&self) -> Language {
        self.current.read().map(|l| *l).unwrap_or_default()
    }

    /// Persist and activate a language given by code (any case)
    pub fn set_language(&self, code: &str) -> Result<Language, UnsupportedLanguage> {
        let language: Language = code.parse()?;
        self.store.set(LANGUAGE_KEY, language.code());
        if let Ok(mut current) = self.current.write() {
            *current = language;
        }
        debug!(language = %language, "Language changed");
        Ok(language)
    }

    pub fn supported(&self) -> &'static [Language] {
        &Language::ALL
    }

    pub fn translate(&self, key: &str) -> String {
        translate_in(self.language(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_default_language_written_back() {
        let store = Arc::new(MemoryStore::new());
        let localizer = Localizer::new(store.clone());

        assert_eq!(localizer.language(), Language::Zh);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("ZH"));
    }

    #[test]
    fn test_stored_language_normalized() {
        let store = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_KEY, "ja");
        let localizer = Localizer::new(store.clone());
        assert_eq!(localizer.language(), Language::Ja);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("JA"));

        localizer.set_language("vi").unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("VI"));
        assert_eq!(localizer.language(), Language::Vi);
    }

    #[test]
    fn test_unsupported_stored_language_rewritten() {
        let store = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_KEY, "FR");
        let localizer = Localizer::new(store.clone());

        assert_eq!(localizer.language(), Language::Zh);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("ZH"));
    }

    #[test]
    fn test_set_unsupported_language_keeps_current() {
        let store = Arc::new(MemoryStore::new());
        let localizer = Localizer::new(store.clone());

        assert!(localizer.set_language("fr").is_err());
        assert_eq!(localizer.language(), Language::Zh);
        assert_eq!(store.get(LANGUAGE_KEY).as_deref(), Some("ZH"));
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate_in(Language::Zh, keys::LOGIN_FORM_LOGIN_TITLE), "登录");
        assert_eq!(translate_in(Language::Ja, keys::LOGIN_FORM_LOGIN_TITLE), "ログイン");
        assert_eq!(
            translate_in(Language::Vi, "no-such-key"),
            "Untranslated message with id:no-such-key"
        );
    }

    #[test]
    fn test_every_language_has_every_key() {
        for (key, _) in ZH_MESSAGES {
            for language in Language::ALL {
                assert!(
                    language.messages().iter().any(|(k, _)| k == key),
                    "{} missing {}",
                    language,
                    key
                );
            }
        }
    }
}
