//! The canonical enriched posting schema.
//!
//! Field names follow the camelCase contract given to the completion
//! backend. Decoding is lenient about representation (numbers as strings,
//! enum casing, comma separated lists) but strict about presence: a missing
//! key fails the decode.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Minimum number of skills per list.
pub const MIN_SKILLS: usize = 2;
/// Maximum number of skills per list.
pub const MAX_SKILLS: usize = 8;

/// Structured summary of one posting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredPosting {
    pub position: String,
    pub company: String,
    #[serde(deserialize_with = "lenient::integer")]
    pub remaining_days: i64,
    pub gender: Gender,
    pub locations: Locations,
    pub summary: String,
    #[serde(deserialize_with = "lenient::text")]
    pub duration: String,
    pub education_degree: EducationDegree,
    #[serde(deserialize_with = "lenient::string_list")]
    pub education_fields: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub experience_years: String,
    #[serde(deserialize_with = "lenient::boolean")]
    pub english_required: bool,
    pub skills_required: Vec<String>,
    pub skills_optional: Vec<String>,
    #[serde(default)]
    pub url: String,
}

impl StructuredPosting {
    /// Rewrite both skill lists into canonical tokens.
    pub fn normalize(&mut self) {
        self.skills_required = normalize_skills(&self.skills_required);
        self.skills_optional = normalize_skills(&self.skills_optional);
        self.education_fields = self
            .education_fields
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
    }

    /// Check the invariants the decode step cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.position.trim().is_empty() {
            return Err("position is empty".into());
        }
        if self.company.trim().is_empty() {
            return Err("company is empty".into());
        }
        if let Locations::Named(names) = &self.locations {
            if names.is_empty() {
                return Err("locations is an empty list".into());
            }
        }
        check_skill_bounds("skillsRequired", &self.skills_required)?;
        check_skill_bounds("skillsOptional", &self.skills_optional)?;
        Ok(())
    }
}

fn check_skill_bounds(field: &str, skills: &[String]) -> Result<(), String> {
    if (MIN_SKILLS..=MAX_SKILLS).contains(&skills.len()) {
        Ok(())
    } else {
        Err(format!(
            "{field} has {} entries, expected {MIN_SKILLS}-{MAX_SKILLS}",
            skills.len()
        ))
    }
}

/// Canonical skill token: lowercase snake_case of ASCII letters and digits.
///
/// `+` and `#` are spelled out so `C++` and `C#` stay distinct from `C`.
pub fn normalize_skill(raw: &str) -> Option<String> {
    let mut token = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.trim().chars() {
        let piece = match ch {
            '+' => Some("plus"),
            '#' => Some("sharp"),
            _ => None,
        };
        if let Some(word) = piece {
            token.push_str(word);
            pending_sep = false;
        } else if ch.is_ascii_alphanumeric() {
            if pending_sep && !token.is_empty() {
                token.push('_');
            }
            token.push(ch.to_ascii_lowercase());
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }

    if token.is_empty() { None } else { Some(token) }
}

/// Normalize a skill list, dropping empties and duplicates (first wins).
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for token in skills.iter().filter_map(|s| normalize_skill(s)) {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// Gender requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Gender {
    Male,
    Female,
    Any,
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "any" | "both" => Ok(Self::Any),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Any => "Any",
        })
    }
}

/// Minimum education degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum EducationDegree {
    #[serde(rename = "bachelor")]
    Bachelor,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "12grade")]
    TwelfthGrade,
    #[serde(rename = "any")]
    Any,
}

impl TryFrom<String> for EducationDegree {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "bachelor" => Ok(Self::Bachelor),
            "master" => Ok(Self::Master),
            "12grade" => Ok(Self::TwelfthGrade),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown education degree '{other}'")),
        }
    }
}

impl fmt::Display for EducationDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bachelor => "Bachelor",
            Self::Master => "Master",
            Self::TwelfthGrade => "12grade",
            Self::Any => "Any",
        })
    }
}

/// Either "any" or a list of location names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locations {
    Any,
    Named(Vec<String>),
}

impl Serialize for Locations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Any => serializer.serialize_str("any"),
            Self::Named(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Locations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::String(s) if s.trim().eq_ignore_ascii_case("any") => Ok(Self::Any),
            Value::String(s) => Ok(Self::Named(vec![s.trim().to_string()])),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) if !s.trim().is_empty() => {
                            names.push(s.trim().to_string())
                        }
                        Value::String(_) => {}
                        other => {
                            return Err(D::Error::custom(format!(
                                "location entries must be strings, got {other}"
                            )));
                        }
                    }
                }
                Ok(Self::Named(names))
            }
            other => Err(D::Error::custom(format!(
                "locations must be \"any\" or a list, got {other}"
            ))),
        }
    }
}

/// Deserializers that accept the shapes a completion backend tends to emit.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .ok_or_else(|| D::Error::custom(format!("not an integer: {n}"))),
            Value::String(s) => s
                .trim()
                .split_whitespace()
                .next()
                .and_then(|t| t.parse::<i64>().ok())
                .ok_or_else(|| D::Error::custom(format!("not an integer: '{s}'"))),
            other => Err(D::Error::custom(format!("not an integer: {other}"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("expected text, got {other}"))),
        }
    }

    pub fn boolean<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => Ok(true),
                "false" | "no" => Ok(false),
                other => Err(D::Error::custom(format!("not a boolean: '{other}'"))),
            },
            other => Err(D::Error::custom(format!("not a boolean: {other}"))),
        }
    }

    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s.split(',').map(|p| p.trim().to_string()).collect()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(D::Error::custom(format!("expected string, got {other}"))),
                })
                .collect(),
            other => Err(D::Error::custom(format!("expected a list, got {other}"))),
        }
    }
}
