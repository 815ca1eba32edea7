//! User preferences stored in the vault itself.
//!
//! Preferences live in a note at [`PREFERENCES_PATH`]. The YAML header holds
//! structured settings; the body is free-form context handed to the agent
//! verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// Folder holding Jasque's own files, relative to the vault root.
pub const PREFERENCES_DIR: &str = "_jasque";

/// Preferences note, relative to the vault root.
pub const PREFERENCES_PATH: &str = "_jasque/preferences.md";

/// Written when the preferences folder exists but the note does not.
pub const PREFERENCES_TEMPLATE: &str = r#"---
# Jasque User Preferences
# Edit this file to customize how Jasque behaves

# Date/time formatting preferences
date_format: "YYYY-MM-DD"
time_format: "HH:mm"

# Default locations for different note types
default_folders:
  meeting_notes: "Meetings/"
  daily_notes: "Daily/"
  projects: "Projects/"

# Response style preferences
response_style:
  verbosity: "concise"  # concise | detailed
  use_bullet_points: true
  include_timestamps: false

# Folders to exclude from search results (default: ["copilot"])
# The _jasque folder is always excluded automatically
search_exclude_folders:
  - copilot
  # - templates  # Uncomment to also exclude templates folder
---

## Additional Context

Any free-form notes you want Jasque to know about. For example:

- I use the PARA method for organizing my vault
- Meeting notes should always include attendees and action items
- I prefer tasks formatted as `- [ ] task @due(date)`
"#;

/// Default folder locations for different kinds of notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultFolders {
    pub meeting_notes: Option<String>,
    pub daily_notes: Option<String>,
    pub projects: Option<String>,
}

/// How the assistant should shape its replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseStyle {
    /// `concise` or `detailed`.
    pub verbosity: String,
    pub use_bullet_points: bool,
    pub include_timestamps: bool,
}

impl Default for ResponseStyle {
    fn default() -> Self {
        Self {
            verbosity: "concise".to_string(),
            use_bullet_points: true,
            include_timestamps: false,
        }
    }
}

/// Structured preferences from the preferences note's header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub date_format: String,
    pub time_format: String,
    pub default_folders: DefaultFolders,
    pub response_style: ResponseStyle,
    pub search_exclude_folders: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            date_format: "YYYY-MM-DD".to_string(),
            time_format: "HH:mm".to_string(),
            default_folders: DefaultFolders::default(),
            response_style: ResponseStyle::default(),
            search_exclude_folders: vec!["copilot".to_string()],
        }
    }
}

/// A header field that was present but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceWarning {
    pub field: &'static str,
    pub message: String,
}

impl UserPreferences {
    /// Build preferences from a parsed header, field by field.
    ///
    /// Unknown keys are ignored. A known key whose value has the wrong shape
    /// keeps its default and is reported as a warning.
    #[must_use]
    pub fn from_mapping(mapping: &Mapping) -> (Self, Vec<PreferenceWarning>) {
        let mut prefs = Self::default();
        let mut warnings = Vec::new();

        read_field(mapping, "date_format", &mut prefs.date_format, &mut warnings);
        read_field(mapping, "time_format", &mut prefs.time_format, &mut warnings);
        read_field(
            mapping,
            "default_folders",
            &mut prefs.default_folders,
            &mut warnings,
        );
        read_field(
            mapping,
            "response_style",
            &mut prefs.response_style,
            &mut warnings,
        );
        read_field(
            mapping,
            "search_exclude_folders",
            &mut prefs.search_exclude_folders,
            &mut warnings,
        );

        (prefs, warnings)
    }
}

fn read_field<T: DeserializeOwned>(
    mapping: &Mapping,
    field: &'static str,
    slot: &mut T,
    warnings: &mut Vec<PreferenceWarning>,
) {
    let Some(value) = mapping.get(field) else {
        return;
    };
    match serde_yaml::from_value::<T>(value.clone()) {
        Ok(parsed) => *slot = parsed,
        Err(err) => warnings.push(PreferenceWarning {
            field,
            message: err.to_string(),
        }),
    }
}

/// Structured preferences plus the free-form note body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPreferences {
    pub structured: UserPreferences,
    pub additional_context: String,
}

/// Render preferences as a Markdown block for the agent's context.
#[must_use]
pub fn format_preferences_for_agent(preferences: &VaultPreferences) -> String {
    let prefs = &preferences.structured;
    let mut lines = vec![
        "## User Preferences".to_string(),
        String::new(),
        format!("- Date format: {}", prefs.date_format),
        format!("- Time format: {}", prefs.time_format),
    ];

    let folders = [
        ("Meeting notes", &prefs.default_folders.meeting_notes),
        ("Daily notes", &prefs.default_folders.daily_notes),
        ("Projects", &prefs.default_folders.projects),
    ];
    for (label, folder) in folders {
        if let Some(folder) = folder.as_deref().filter(|f| !f.is_empty()) {
            lines.push(format!("- {label} folder: {folder}"));
        }
    }

    let style = &prefs.response_style;
    lines.push(format!("- Response verbosity: {}", style.verbosity));
    if style.use_bullet_points {
        lines.push("- Prefer bullet points in responses".to_string());
    }
    if style.include_timestamps {
        lines.push("- Include timestamps in responses".to_string());
    }

    let context = preferences.additional_context.trim();
    if !context.is_empty() {
        lines.push(String::new());
        lines.push("## Additional User Context".to_string());
        lines.push(String::new());
        lines.push(context.to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_frontmatter;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.date_format, "YYYY-MM-DD");
        assert_eq!(prefs.time_format, "HH:mm");
        assert_eq!(prefs.default_folders, DefaultFolders::default());
        assert_eq!(prefs.response_style.verbosity, "concise");
        assert!(prefs.response_style.use_bullet_points);
        assert!(!prefs.response_style.include_timestamps);
        assert_eq!(prefs.search_exclude_folders, vec!["copilot"]);
    }

    #[test]
    fn template_parses_cleanly() {
        let fm = parse_frontmatter(PREFERENCES_TEMPLATE).unwrap().unwrap();
        let (prefs, warnings) = UserPreferences::from_mapping(&fm.mapping);
        assert!(warnings.is_empty());
        assert_eq!(prefs.default_folders.meeting_notes.as_deref(), Some("Meetings/"));
        assert_eq!(prefs.default_folders.projects.as_deref(), Some("Projects/"));
        assert!(fm.body.starts_with("## Additional Context"));
    }

    #[test]
    fn partial_mapping_keeps_other_defaults() {
        let (prefs, warnings) = UserPreferences::from_mapping(&mapping(
            "date_format: DD/MM/YYYY\nresponse_style:\n  verbosity: detailed\n",
        ));
        assert!(warnings.is_empty());
        assert_eq!(prefs.date_format, "DD/MM/YYYY");
        assert_eq!(prefs.time_format, "HH:mm");
        assert_eq!(prefs.response_style.verbosity, "detailed");
        assert!(prefs.response_style.use_bullet_points);
    }

    #[test]
    fn invalid_field_degrades_to_default() {
        let (prefs, warnings) = UserPreferences::from_mapping(&mapping(
            "time_format: [not, a, string]\nsearch_exclude_folders: [archive]\n",
        ));
        assert_eq!(prefs.time_format, "HH:mm");
        assert_eq!(prefs.search_exclude_folders, vec!["archive"]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "time_format");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let (prefs, warnings) = UserPreferences::from_mapping(&mapping("theme: dark\n"));
        assert!(warnings.is_empty());
        assert_eq!(prefs, UserPreferences::default());
    }

    #[test]
    fn format_defaults() {
        let text = format_preferences_for_agent(&VaultPreferences::default());
        assert_eq!(
            text,
            "## User Preferences\n\n- Date format: YYYY-MM-DD\n- Time format: HH:mm\n- Response verbosity: concise\n- Prefer bullet points in responses"
        );
    }

    #[test]
    fn format_with_folders_and_context() {
        let mut prefs = VaultPreferences::default();
        prefs.structured.default_folders.daily_notes = Some("Daily/".to_string());
        prefs.structured.response_style.use_bullet_points = false;
        prefs.structured.response_style.include_timestamps = true;
        prefs.additional_context = "\n\nI use PARA.\n\n".to_string();

        let text = format_preferences_for_agent(&prefs);
        assert_eq!(
            text,
            "## User Preferences\n\n- Date format: YYYY-MM-DD\n- Time format: HH:mm\n- Daily notes folder: Daily/\n- Response verbosity: concise\n- Include timestamps in responses\n\n## Additional User Context\n\nI use PARA."
        );
    }

    #[test]
    fn blank_context_is_omitted() {
        let prefs = VaultPreferences {
            additional_context: "   \n".to_string(),
            ..VaultPreferences::default()
        };
        assert!(!format_preferences_for_agent(&prefs).contains("Additional User Context"));
    }
}
