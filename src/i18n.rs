/*
Simple i18n helper for user-facing strings.

This module provides:
- A tiny embedded translations store for EN/AF (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- A `t` convenience wrapper using the default language (DEFAULT_LANG).

Notification producers render titles and messages through `tr` using the
recipient's language, so the stored text is already localized.

Usage:
    use crate::i18n;
    let title = i18n::tr(Some("af"), "notifications.new_job.title", Some(&[("title", "Junior Developer")]));

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `en`. If a key is missing for the requested language,
  the default language is used.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "notifications.new_job.title": "New job: {title}",
  "notifications.new_job.message": "{company} posted a new {job_type} position in {location}",
  "notifications.new_job.message_short": "{company} posted a new position",
  "notifications.application_status.title": "Application update",
  "notifications.application_status.message": "Your application for {job} is now {status}",
  "notifications.new_message.title": "New message from {sender}",
  "status.pending": "pending",
  "status.reviewed": "reviewed",
  "status.shortlisted": "shortlisted",
  "status.accepted": "accepted",
  "status.rejected": "rejected",
  "not_found.job": "Job not found",
  "not_found.application": "Application not found",
  "not_found.notification": "Notification not found",
  "not_found.user": "User not found",
  "validation.unknown_status": "Unknown application status: {status}",
  "validation.job_title_required": "Job title is required",
  "validation.company_name_required": "Company name is required",
  "validation.message_required": "Message text is required",
  "validation.recipient_required": "Recipient is required",
  "validation.apply_requires_job": "Only job notifications can be applied to",
  "conflict.already_applied": "You have already applied to this job",
  "errors.insufficient_permissions": "Only company or admin accounts can do this",
  "error.store_unavailable": "Could not reach the data store. Please try again.",
  "app.name": "CareerHub"
}
"#;

const AF_JSON: &str = r#"
{
  "notifications.new_job.title": "Nuwe pos: {title}",
  "notifications.new_job.message": "{company} het 'n nuwe {job_type} pos in {location} geplaas",
  "notifications.new_job.message_short": "{company} het 'n nuwe pos geplaas",
  "notifications.application_status.title": "Aansoekopdatering",
  "notifications.application_status.message": "Jou aansoek vir {job} is nou {status}",
  "notifications.new_message.title": "Nuwe boodskap van {sender}",
  "status.pending": "hangende",
  "status.reviewed": "hersien",
  "status.shortlisted": "op die kortlys",
  "status.accepted": "aanvaar",
  "status.rejected": "afgekeur",
  "not_found.job": "Pos nie gevind nie",
  "not_found.application": "Aansoek nie gevind nie",
  "not_found.notification": "Kennisgewing nie gevind nie",
  "not_found.user": "Gebruiker nie gevind nie",
  "app.name": "CareerHub"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    let af_map: HashMap<String, String> = serde_json::from_str(AF_JSON).unwrap_or_else(|e| {
        panic!("failed to parse AF_JSON in i18n module: {}", e);
    });
    out.insert("af".to_string(), af_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Normalize a language tag into a short, lowercase code (e.g. "en-ZA" -> "en").
pub fn normalize_language(lang: &str) -> String {
    lang.split('-').next().unwrap_or(lang).to_lowercase()
}

/// Returns true if the given language code has translations.
pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Translate a key using an explicit language (or default if None).
///
/// Returns the translated and parameter-substituted string. If no translation
/// is found, falls back to the default language and then to the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.map(normalize_language);
    let desired = desired.as_deref().unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        // If still missing, return the key itself (useful in logs)
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}

/// Convenience wrapper with params (default language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}
