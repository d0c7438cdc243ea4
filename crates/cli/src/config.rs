//! Optional JSON configuration file.
//!
//! Every setting the command line accepts can also come from a config
//! file; explicit command-line arguments win over the file, which wins
//! over the built-in defaults.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tachar_core::{Color, Expression, Mode};

/// One censoring expression as written in a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionEntry {
    /// Regular expression matched against each text run.
    pub regex: String,
    /// Optional `#RRGGBB` bar color for runs this expression censors.
    #[serde(default)]
    pub color: Option<String>,
}

impl ExpressionEntry {
    pub fn to_expression(&self) -> anyhow::Result<Expression> {
        let color = match self.color.as_deref() {
            Some(s) => Some(
                Color::from_hex(s)
                    .with_context(|| format!("invalid color {s:?} for expression {:?}", self.regex))?,
            ),
            None => None,
        };
        Ok(Expression::new(&self.regex, color)?)
    }
}

/// Settings loaded from a JSON config file. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Output path, file or directory.
    pub output: Option<PathBuf>,
    /// Log verbosity, 0 (warnings) to 3 (trace).
    pub verbosity: Option<u8>,
    /// Censoring mode: "all", "marked" or "unmarked".
    pub mode: Option<String>,
    /// Censoring expressions, tried in order.
    pub expressions: Option<Vec<ExpressionEntry>>,
    /// Draw crossed boxes over drawn images and forms.
    pub box_objects: Option<bool>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open config file {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("cannot parse config file {}", path.display()))
    }

    pub fn mode(&self) -> anyhow::Result<Option<Mode>> {
        match self.mode.as_deref() {
            None => Ok(None),
            Some("all") => Ok(Some(Mode::All)),
            Some("marked") => Ok(Some(Mode::Marked)),
            Some("unmarked") => Ok(Some(Mode::Unmarked)),
            Some(other) => anyhow::bail!(
                "invalid mode {other:?}, expected \"all\", \"marked\" or \"unmarked\""
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let json = r##"{
            "output": "out.pdf",
            "verbosity": 2,
            "mode": "unmarked",
            "expressions": [
                {"regex": "secret", "color": "#FF0000"},
                {"regex": "internal"}
            ],
            "box-objects": true
        }"##;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.output.as_deref(), Some(Path::new("out.pdf")));
        assert_eq!(config.verbosity, Some(2));
        assert!(matches!(config.mode().unwrap(), Some(Mode::Unmarked)));
        assert_eq!(config.expressions.as_ref().unwrap().len(), 2);
        assert_eq!(config.box_objects, Some(true));
    }

    #[test]
    fn unknown_fields_are_rejected()  {
        let json = r#"{"outptu": "typo.pdf"}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let config: Config = serde_json::from_str(r#"{"mode": "some"}"#).unwrap();
        assert!(config.mode().is_err());
    }

    #[test]
    fn expression_entries_build_expressions() {
        let entry = ExpressionEntry {
            regex: "foo".to_string(),
            color: Some("#00FF00".to_string()),
        };
        assert!(entry.to_expression().is_ok());

        let bad = ExpressionEntry {
            regex: "foo".to_string(),
            color: Some("green".to_string()),
        };
        assert!(bad.to_expression().is_err());
    }
}
