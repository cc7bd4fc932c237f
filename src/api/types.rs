//! Records exchanged with the course generation backend.
//!
//! These are round-tripped as the backend sends them; the client only
//! normalises fields that arrive in more than one shape.

use serde::{Deserialize, Deserializer, Serialize};

/// A course as listed on the course page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub course_id: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub source: String,
    #[serde(default)]
    pub total_questions: u32,
}

/// Generation instructions for a course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Extracted markdown of a course, editable on the review screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseContent {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    /// Course the chunk was cut from
    #[serde(alias = "content_id")]
    pub source_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub chunk_title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub chunk_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: String,
    pub course_id: String,
    pub chunk_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "bullet_points")]
    pub bullet_points: Vec<String>,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub test_id: String,
    pub course_id: String,
    pub chunk_id: String,
    pub test_question: String,
    pub correct_option: String,
    #[serde(default)]
    pub incorrect_options: Vec<String>,
}

impl Test {
    /// Answer choices in display order: the correct option first, then the rest
    pub fn options(&self) -> Vec<&str> {
        std::iter::once(self.correct_option.as_str())
            .chain(self.incorrect_options.iter().map(String::as_str))
            .collect()
    }
}

/// Stored quiz result for one user and course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_id: Option<String>,
    pub course_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub correct_score: u32,
    pub incorrect_score: u32,
}

impl Score {
    pub fn attempted(&self) -> u32 {
        self.correct_score + self.incorrect_score
    }

    /// Whole-number percentage of attempted questions answered correctly
    pub fn percentage(&self) -> u32 {
        match self.attempted() {
            0 => 0,
            attempted => (self.correct_score * 100 + attempted / 2) / attempted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub course_id: String,
    pub correct_score: u32,
    pub incorrect_score: u32,
}

/// `{"msg": "inserted"}` or `{"msg": "updated"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreAck {
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub link: String,
    pub name: String,
}

impl ContentRequest {
    pub fn upload(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            name: "upload".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub course_id: String,
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub status: String,
    #[serde(default, alias = "customerID", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// Lesson deck export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Pptx,
    Pdf,
}

impl MediaFormat {
    /// Path segment under `/media/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            MediaFormat::Pptx => "lessons-pptx",
            MediaFormat::Pdf => "lessons-pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaFormat::Pptx => "pptx",
            MediaFormat::Pdf => "pdf",
        }
    }

    /// File name a downloaded deck is saved under
    pub fn file_name(&self, course_id: &str) -> String {
        format!("Lessons_{}.{}", course_id, self.extension())
    }
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pptx" => Ok(MediaFormat::Pptx),
            "pdf" => Ok(MediaFormat::Pdf),
            other => Err(format!("unknown format '{}', expected pptx or pdf", other)),
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Bullet points arrive either as a JSON array or as a string holding a
/// JSON-encoded array. A plain string is split into one bullet per line.
fn bullet_points<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Encoded(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::List(items)) => items,
        Some(Raw::Encoded(text)) => serde_json::from_str::<Vec<String>>(&text).unwrap_or_else(|_| {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        }),
    })
}
