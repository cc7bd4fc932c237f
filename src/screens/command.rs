//! Backend work requested by screens and the results it produces

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, AuthContext, Backend, BackendClient, ChatRequest, Chunk, CourseContent, CourseInfo,
    Instructions, Lesson, MediaFormat, Score, ScoreAck, ScoreSubmission, Test,
};
use crate::auth::{session_cache_from_config, SessionCache, SessionSnapshot};
use crate::config::Config;
use crate::tasks::Emitter;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadCourses,
    DeleteCourse(String),
    /// Submit a source link, then kick off instruction generation for the new course
    SubmitContent(String),
    LoadInstructions(String),
    SaveInstructions {
        course_id: String,
        instructions: Instructions,
    },
    LoadContent(String),
    SaveContent {
        course_id: String,
        content: CourseContent,
    },
    LoadChunks(String),
    UpdateChunk(Chunk),
    DeleteChunk(String),
    /// Generate tests and lessons for a course concurrently
    GenerateMaterials(String),
    LoadLessons(String),
    UpdateLesson(Lesson),
    DeleteLesson(String),
    /// Chunks and tests of a course, loaded together
    LoadTests(String),
    UpdateTest(Test),
    DeleteTest(String),
    SendChat {
        course_id: String,
        message: String,
    },
    Download {
        course_id: String,
        format: MediaFormat,
    },
    SubmitScore(ScoreSubmission),
    LoadScore(String),
    SignIn {
        email: String,
        password: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadCourses => "load_courses",
            Command::DeleteCourse(_) => "delete_course",
            Command::SubmitContent(_) => "submit_content",
            Command::LoadInstructions(_) => "load_instructions",
            Command::SaveInstructions { .. } => "save_instructions",
            Command::LoadContent(_) => "load_content",
            Command::SaveContent { .. } => "save_content",
            Command::LoadChunks(_) => "load_chunks",
            Command::UpdateChunk(_) => "update_chunk",
            Command::DeleteChunk(_) => "delete_chunk",
            Command::GenerateMaterials(_) => "generate_materials",
            Command::LoadLessons(_) => "load_lessons",
            Command::UpdateLesson(_) => "update_lesson",
            Command::DeleteLesson(_) => "delete_lesson",
            Command::LoadTests(_) => "load_tests",
            Command::UpdateTest(_) => "update_test",
            Command::DeleteTest(_) => "delete_test",
            Command::SendChat { .. } => "send_chat",
            Command::Download { .. } => "download",
            Command::SubmitScore(_) => "submit_score",
            Command::LoadScore(_) => "load_score",
            Command::SignIn { .. } => "sign_in",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Session(SessionSnapshot),
    CoursesLoaded(Result<Vec<CourseInfo>, ApiError>),
    CourseDeleted {
        course_id: String,
        result: Result<(), ApiError>,
    },
    /// New course id once instruction generation has been started
    ContentSubmitted(Result<String, ApiError>),
    InstructionsLoaded(Result<Option<Instructions>, ApiError>),
    InstructionsSaved(Result<(), ApiError>),
    ContentLoaded(Result<Option<CourseContent>, ApiError>),
    ContentSaved(Result<(), ApiError>),
    ChunksLoaded(Result<Vec<Chunk>, ApiError>),
    ChunkUpdated(Result<Chunk, ApiError>),
    ChunkDeleted {
        chunk_id: String,
        result: Result<(), ApiError>,
    },
    MaterialsGenerated(Result<(), ApiError>),
    LessonsLoaded(Result<Vec<Lesson>, ApiError>),
    LessonUpdated(Result<Lesson, ApiError>),
    LessonDeleted {
        lesson_id: String,
        result: Result<(), ApiError>,
    },
    TestsLoaded(Result<(Vec<Chunk>, Vec<Test>), ApiError>),
    TestUpdated(Result<Test, ApiError>),
    TestDeleted {
        test_id: String,
        result: Result<(), ApiError>,
    },
    ChatDelta(String),
    ChatFinished(Result<(), ApiError>),
    /// Where the deck was written, or why it was not
    Downloaded(Result<PathBuf, DownloadError>),
    ScoreSubmitted(Result<ScoreAck, ApiError>),
    ScoreLoaded(Result<Option<Score>, ApiError>),
    SignedIn(Result<SessionSnapshot, ApiError>),
}

/// What commands run against
#[derive(Clone)]
pub struct Context {
    pub backend: Arc<dyn Backend>,
    pub session: Arc<SessionCache>,
    pub downloads_dir: PathBuf,
}

impl Context {
    /// HTTP backend and persisted session cache, as configured
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = Arc::new(BackendClient::from_config(config)?);
        let session = session_cache_from_config(config, client.clone());
        Ok(Self {
            backend: client,
            session,
            downloads_dir: config.downloads_path(),
        })
    }

    /// Identity for a backend call, revalidating a stale session first
    pub async fn auth(&self) -> AuthContext {
        self.session.ensure_fresh().await.auth()
    }
}

/// Run one command to completion, emitting its outcome(s)
pub async fn execute(command: Command, ctx: Context, emit: Emitter<Outcome>) {
    debug!(command = command.name(), "running command");

    let outcome = match command {
        Command::SignIn { email, password } => {
            Outcome::SignedIn(ctx.session.sign_in(&email, &password).await)
        }
        Command::SendChat { course_id, message } => {
            stream_chat(&ctx, course_id, message, &emit).await;
            return;
        }
        Command::Download { course_id, format } => {
            Outcome::Downloaded(download_deck(&ctx, &course_id, format).await)
        }
        command => match run_backend(command, &ctx).await {
            Some(outcome) => outcome,
            None => return,
        },
    };

    emit.emit(outcome);
}

async fn run_backend(command: Command, ctx: &Context) -> Option<Outcome> {
    let auth = ctx.auth().await;
    let backend = ctx.backend.as_ref();

    let outcome = match command {
        Command::LoadCourses => Outcome::CoursesLoaded(backend.list_courses(&auth).await),
        Command::DeleteCourse(course_id) => {
            let result = backend.delete_course(&auth, &course_id).await;
            Outcome::CourseDeleted { course_id, result }
        }
        Command::SubmitContent(link) => Outcome::ContentSubmitted(submit_link(backend, &auth, &link).await),
        Command::LoadInstructions(course_id) => {
            Outcome::InstructionsLoaded(backend.get_instructions(&auth, &course_id).await)
        }
        Command::SaveInstructions {
            course_id,
            instructions,
        } => Outcome::InstructionsSaved(
            backend
                .save_instructions(&auth, &course_id, &instructions)
                .await,
        ),
        Command::LoadContent(course_id) => {
            Outcome::ContentLoaded(backend.get_course_content(&auth, &course_id).await)
        }
        Command::SaveContent { course_id, content } => Outcome::ContentSaved(
            backend
                .update_course_content(&auth, &course_id, &content)
                .await,
        ),
        Command::LoadChunks(course_id) => {
            Outcome::ChunksLoaded(backend.list_chunks(&auth, &course_id).await)
        }
        Command::UpdateChunk(chunk) => Outcome::ChunkUpdated(
            backend.update_chunk(&auth, &chunk).await.map(|()| chunk),
        ),
        Command::DeleteChunk(chunk_id) => {
            let result = backend.delete_chunk(&auth, &chunk_id).await;
            Outcome::ChunkDeleted { chunk_id, result }
        }
        Command::GenerateMaterials(course_id) => {
            let result = future::try_join(
                backend.generate_tests(&auth, &course_id),
                backend.generate_lessons(&auth, &course_id),
            )
            .await
            .map(|_| ());
            Outcome::MaterialsGenerated(result)
        }
        Command::LoadLessons(course_id) => {
            Outcome::LessonsLoaded(backend.list_lessons(&auth, &course_id).await)
        }
        Command::UpdateLesson(lesson) => Outcome::LessonUpdated(
            backend.update_lesson(&auth, &lesson).await.map(|()| lesson),
        ),
        Command::DeleteLesson(lesson_id) => {
            let result = backend.delete_lesson(&auth, &lesson_id).await;
            Outcome::LessonDeleted { lesson_id, result }
        }
        Command::LoadTests(course_id) => {
            let result = future::try_join(
                backend.list_chunks(&auth, &course_id),
                backend.list_tests(&auth, &course_id),
            )
            .await;
            Outcome::TestsLoaded(result)
        }
        Command::UpdateTest(test) => {
            Outcome::TestUpdated(backend.update_test(&auth, &test).await.map(|()| test))
        }
        Command::DeleteTest(test_id) => {
            let result = backend.delete_test(&auth, &test_id).await;
            Outcome::TestDeleted { test_id, result }
        }
        Command::SubmitScore(submission) => {
            Outcome::ScoreSubmitted(backend.add_score(&auth, &submission).await)
        }
        Command::LoadScore(course_id) => {
            Outcome::ScoreLoaded(backend.get_score(&auth, &course_id).await)
        }
        other @ (Command::SignIn { .. } | Command::SendChat { .. } | Command::Download { .. }) => {
            warn!(command = other.name(), "not a plain backend command");
            return None;
        }
    };
    Some(outcome)
}

/// Create a course from `link` and start generating its instructions
pub async fn submit_link(
    backend: &dyn Backend,
    auth: &AuthContext,
    link: &str,
) -> Result<String, ApiError> {
    let course_id = backend.submit_content(auth, link).await?;
    if course_id.trim().is_empty() {
        return Err(ApiError::parse(
            "backend",
            "content generation returned an empty course id",
        ));
    }
    info!(course_id = %course_id, "content submitted");
    backend.generate_instructions(auth, &course_id).await?;
    Ok(course_id)
}

async fn stream_chat(ctx: &Context, course_id: String, message: String, emit: &Emitter<Outcome>) {
    let snapshot = ctx.session.ensure_fresh().await;
    let Some(user_id) = snapshot.user_id.clone() else {
        emit.emit(Outcome::ChatFinished(Err(ApiError::NotSignedIn)));
        return;
    };
    let request = ChatRequest {
        course_id,
        message,
        user_id,
    };

    let mut stream = match ctx.backend.chat(&snapshot.auth(), &request).await {
        Ok(stream) => stream,
        Err(e) => {
            emit.emit(Outcome::ChatFinished(Err(e)));
            return;
        }
    };

    while let Some(delta) = stream.next_delta().await {
        match delta {
            Ok(text) => {
                if !emit.emit(Outcome::ChatDelta(text)) {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "chat stream failed");
                emit.emit(Outcome::ChatFinished(Err(e)));
                return;
            }
        }
    }
    emit.emit(Outcome::ChatFinished(Ok(())));
}

/// Why a lesson deck did not end up on disk
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Backend(#[from] ApiError),

    #[error("Failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl DownloadError {
    fn save(path: &std::path::Path, source: std::io::Error) -> Self {
        DownloadError::Save {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }
}

/// Fetch a lesson deck and write it under the downloads directory
pub async fn download_deck(
    ctx: &Context,
    course_id: &str,
    format: MediaFormat,
) -> Result<PathBuf, DownloadError> {
    let auth = ctx.auth().await;
    let bytes = ctx
        .backend
        .download_lessons(&auth, course_id, format)
        .await?;

    tokio::fs::create_dir_all(&ctx.downloads_dir)
        .await
        .map_err(|e| DownloadError::save(&ctx.downloads_dir, e))?;
    let path = ctx.downloads_dir.join(format.file_name(course_id));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| DownloadError::save(&path, e))?;

    info!(path = %path.display(), bytes = bytes.len(), "lesson deck saved");
    Ok(path)
}
