/// Voice used when the caller sends no voice or an unknown language code
pub const DEFAULT_VOICE: &str = "en-US-ChristopherNeural";

/// Language code to neural voice name
pub const VOICE_MAPPING: &[(&str, &str)] = &[
    ("en", "en-US-ChristopherNeural"),
    ("sv", "sv-SE-MattiasNeural"),
    ("fr", "fr-FR-HenriNeural"),
    ("es", "es-ES-AlvaroNeural"),
    ("de", "de-DE-ConradNeural"),
    ("it", "it-IT-DiegoNeural"),
    ("pt", "pt-BR-FabioNeural"),
    ("ru", "ru-RU-DmitryNeural"),
    ("ja", "ja-JP-KeitaNeural"),
    ("ko", "ko-KR-InJoonNeural"),
    ("zh-CN", "zh-CN-YunxiNeural"),
];

pub fn voice_for_language(code: &str) -> Option<&'static str> {
    VOICE_MAPPING
        .iter()
        .find(|(lang, _)| *lang == code)
        .map(|(_, voice)| *voice)
}

/// Resolve the `voice` field of a request.
///
/// Accepts a language code from the mapping or a full voice name such as
/// `en-GB-RyanNeural`, which is passed through untouched. Anything else falls
/// back to `default_voice`.
pub fn resolve_voice(requested: Option<&str>, default_voice: &str) -> String {
    let requested = match requested.map(str::trim).filter(|v| !v.is_empty()) {
        Some(requested) => requested,
        None => return default_voice.to_string(),
    };

    if let Some(voice) = voice_for_language(requested) {
        return voice.to_string();
    }

    if is_voice_name(requested) {
        return requested.to_string();
    }

    tracing::debug!(requested, default_voice, "Unknown voice, using default");
    default_voice.to_string()
}

/// Full voice names look like `<lang>-<REGION>-<Name>`
fn is_voice_name(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() >= 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Language prefix of a voice name (`fr-FR-HenriNeural` -> `fr`), `en` when absent
pub fn language_of(voice: &str) -> &str {
    match voice.split_once('-') {
        Some((lang, _)) if !lang.is_empty() => lang,
        _ => "en",
    }
}
