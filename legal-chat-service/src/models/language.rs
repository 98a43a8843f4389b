use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages a profile may prefer. Only a subset has chat prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Nl,
    En,
    Ar,
    Es,
    Ru,
    Fr,
    Pl,
    De,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Nl,
        Language::En,
        Language::Ar,
        Language::Es,
        Language::Ru,
        Language::Fr,
        Language::Pl,
        Language::De,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Nl => "nl",
            Language::En => "en",
            Language::Ar => "ar",
            Language::Es => "es",
            Language::Ru => "ru",
            Language::Fr => "fr",
            Language::Pl => "pl",
            Language::De => "de",
        }
    }

    /// Whether the relay accepts this language for conversations.
    pub fn supports_chat(&self) -> bool {
        !matches!(self, Language::Pl | Language::De)
    }

    /// Resolve an optional request field: absent means Dutch, anything
    /// outside the chat set is rejected.
    pub fn for_chat(raw: Option<&str>) -> Result<Language, String> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Language::default()),
            Some(code) => match code.parse::<Language>() {
                Ok(lang) if lang.supports_chat() => Ok(lang),
                _ => Err(format!("Unsupported language: {}", code)),
            },
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown language: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_language_defaults_to_dutch() {
        assert_eq!(Language::for_chat(None), Ok(Language::Nl));
        assert_eq!(Language::for_chat(Some("  ")), Ok(Language::Nl));
    }

    #[test]
    fn profile_only_languages_are_rejected_for_chat() {
        assert!(Language::for_chat(Some("de")).is_err());
        assert!(Language::for_chat(Some("pl")).is_err());
        assert!(Language::for_chat(Some("xx")).is_err());
        assert_eq!(Language::for_chat(Some("AR")), Ok(Language::Ar));
    }
}
