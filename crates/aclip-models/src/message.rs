//! Download status message translation.
//!
//! The download service reports free-text status messages in Chinese. These
//! helpers turn them into the Spanish captions shown to users. Messages are
//! display-only; nothing here drives control flow.

/// Keyword rules, checked in order. Every keyword must be present.
const TRANSLATIONS: &[(&[&str], &str)] = &[
    (&["下载完成", "准备开始处理"], "Descarga completa, preparando procesamiento..."),
    (&["正在获取视频信息"], "Obteniendo informacion del video..."),
    (&["正在下载视频"], "Descargando video..."),
    (&["视频下载完成", "处理字幕"], "Video descargado, procesando subtitulos..."),
    (&["正在使用Whisper生成字幕"], "Generando subtitulos con Whisper..."),
    (&["字幕生成完成"], "Subtitulos generados, preparando procesamiento..."),
    (&["下载失败"], "Error de descarga"),
];

/// Caption used while processing before any pipeline data arrived.
pub const PROCESSING_FALLBACK: &str = "Procesando pipeline...";

/// Caption used once the download finished and the pipeline is starting.
pub const PIPELINE_STARTING: &str = "Iniciando pipeline...";

/// Translate a raw download message into a user-facing caption.
///
/// Unrecognized messages are returned trimmed but otherwise unchanged.
pub fn translate_download_message(message: &str) -> String {
    let text = message.trim();
    if text.is_empty() {
        return String::new();
    }

    TRANSLATIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().all(|k| text.contains(k)))
        .map(|(_, translated)| (*translated).to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Caption for the processing state when no pipeline record exists yet.
pub fn processing_fallback_message(message: &str) -> String {
    if message.is_empty() {
        return PROCESSING_FALLBACK.to_string();
    }
    if message.to_lowercase().contains("descarga completa") {
        return PIPELINE_STARTING.to_string();
    }
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_known_messages() {
        assert_eq!(
            translate_download_message("  正在下载视频 45% "),
            "Descargando video..."
        );
        assert_eq!(
            translate_download_message("下载完成，准备开始处理"),
            "Descarga completa, preparando procesamiento..."
        );
        assert_eq!(translate_download_message("下载失败: timeout"), "Error de descarga");
    }

    #[test]
    fn test_translate_requires_all_keywords() {
        // Only one of the two keywords of the first rule
        assert_eq!(translate_download_message("下载完成"), "下载完成");
    }

    #[test]
    fn test_translate_passthrough_and_empty() {
        assert_eq!(translate_download_message(""), "");
        assert_eq!(translate_download_message("   "), "");
        assert_eq!(translate_download_message(" custom step "), "custom step");
    }

    #[test]
    fn test_processing_fallback() {
        assert_eq!(processing_fallback_message(""), PROCESSING_FALLBACK);
        assert_eq!(
            processing_fallback_message("Descarga completa, preparando procesamiento..."),
            PIPELINE_STARTING
        );
        assert_eq!(
            processing_fallback_message("Generando subtitulos con Whisper..."),
            "Generando subtitulos con Whisper..."
        );
    }
}
