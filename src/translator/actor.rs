use crate::db::{Database, DatabaseConfig, QueryTable, render_context};
use crate::error::ResqError;
use crate::llm::{LlmClient, ModelConfig, parse_sql_answer};
use crate::translator::{guard, prompt};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::Serialize;
use tracing::{info, warn};

/// Messages handled by the translator actor.
#[derive(Debug)]
pub enum TranslatorMessage {
    /// Answer a natural-language question: generate SQL, execute it, reply
    /// with the result table.
    Translate(String, RpcReplyPort<Result<Translation, ResqError>>),
    /// Connect to MySQL, reflect the schema and probe the model server ahead
    /// of the first question. Failures are logged, not fatal.
    WarmUp,
}

/// An answered question: the executed SQL and its result table.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub sql: String,
    pub table: QueryTable,
}

pub struct TranslatorArgs {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
}

/// Handle for interacting with the translator actor. Messages queue in the
/// actor's mailbox, which also serializes inference: the local model server
/// hosts a single model and is never hit concurrently.
#[derive(Clone)]
pub struct TranslatorHandle {
    actor: ActorRef<TranslatorMessage>,
}

impl TranslatorHandle {
    pub async fn translate(&self, question: impl Into<String>) -> Result<Translation, ResqError> {
        ractor::call!(self.actor, TranslatorMessage::Translate, question.into())
            .map_err(|e| ResqError::Translator(format!("Translate RPC failed: {e}")))?
    }

    pub fn warm_up(&self) {
        let _ = ractor::cast!(self.actor, TranslatorMessage::WarmUp);
    }
}

pub async fn spawn(args: TranslatorArgs) -> Result<TranslatorHandle, ResqError> {
    let (actor, _join) = Actor::spawn(None, TranslatorActor, args)
        .await
        .map_err(|e| ResqError::Translator(format!("failed to spawn translator: {e}")))?;
    Ok(TranslatorHandle { actor })
}

/// Database session established on first use: the pool plus the schema
/// context rendered for the prompt.
struct DbSession {
    database: Database,
    schema_ctx: String,
}

struct TranslatorState {
    db_config: DatabaseConfig,
    llm: LlmClient,
    session: Option<DbSession>,
}

struct TranslatorActor;

#[ractor::async_trait]
impl Actor for TranslatorActor {
    type Msg = TranslatorMessage;
    type State = TranslatorState;
    type Arguments = TranslatorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let llm = LlmClient::new(args.model)
            .map_err(|e| ActorProcessingErr::from(format!("LLM client init failed: {e}")))?;
        Ok(TranslatorState {
            db_config: args.database,
            llm,
            session: None,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            TranslatorMessage::Translate(question, reply_port) => {
                let result = Self::translate(state, &question).await;
                if let Err(e) = &result {
                    warn!(error = %e, "question could not be answered");
                }
                let _ = reply_port.send(result);
            }
            TranslatorMessage::WarmUp => {
                match Self::ensure_session(state).await {
                    Ok(()) => info!("database session warmed up"),
                    Err(e) => {
                        warn!(error = %e, "database warm-up failed; retrying on first question")
                    }
                }
                if let Err(e) = state.llm.health().await {
                    warn!(error = %e, "model server health probe failed");
                }
            }
        }
        Ok(())
    }
}

impl TranslatorActor {
    async fn ensure_session(state: &mut TranslatorState) -> Result<(), ResqError> {
        if state.session.is_some() {
            return Ok(());
        }
        let database = Database::connect(state.db_config.clone()).await?;
        let tables = database.reflect_schema().await?;
        if tables.is_empty() {
            warn!(
                schema = %database.config().schema,
                "schema reflection found no tables; prompts will carry an empty context"
            );
        }
        let schema_ctx = render_context(&tables);
        info!(tables = tables.len(), "schema context ready");
        state.session = Some(DbSession {
            database,
            schema_ctx,
        });
        Ok(())
    }

    async fn translate(
        state: &mut TranslatorState,
        question: &str,
    ) -> Result<Translation, ResqError> {
        Self::ensure_session(state).await?;
        let Some(session) = state.session.as_ref() else {
            return Err(ResqError::Translator(
                "database session unavailable".to_string(),
            ));
        };

        let messages =
            prompt::build_messages(&session.schema_ctx, question, state.llm.config().n_ctx);
        let content = state.llm.chat(&messages).await?;
        let answer = parse_sql_answer(&content)?;

        let (sql, table) = match guard::check(&answer.sql_query) {
            Ok(sql) => match session.database.run_query(&sql).await {
                Ok(table) => (sql, table),
                Err(e) => {
                    Self::retry_once(&state.llm, session, messages, &sql, &db_error_message(&e))
                        .await?
                }
            },
            Err(ResqError::RejectedSql { reason, sql }) => {
                Self::retry_once(&state.llm, session, messages, &sql, &reason).await?
            }
            Err(other) => return Err(other),
        };

        info!(sql = %sql, rows = table.row_count(), "question answered");
        Ok(Translation { sql, table })
    }

    /// One corrective attempt: feed the failed statement and its error back
    /// to the model. A second failure is returned to the caller along with
    /// the SQL so the UI can show what was tried.
    async fn retry_once(
        llm: &LlmClient,
        session: &DbSession,
        messages: Vec<crate::llm::ChatMessage>,
        failed_sql: &str,
        error: &str,
    ) -> Result<(String, QueryTable), ResqError> {
        warn!(sql = %failed_sql, error = %error, "generated SQL failed; asking for a correction");
        let messages = prompt::retry_messages(messages, failed_sql, error);
        let content = llm.chat(&messages).await?;
        let answer = parse_sql_answer(&content)?;
        let sql = guard::check(&answer.sql_query)?;
        let table = session
            .database
            .run_query(&sql)
            .await
            .map_err(|e| ResqError::QueryFailed {
                message: db_error_message(&e),
                sql: sql.clone(),
            })?;
        Ok((sql, table))
    }
}

/// Prefer the server's own message for errors raised by MySQL; it names the
/// unknown column or syntax problem the corrective retry needs.
fn db_error_message(error: &ResqError) -> String {
    match error {
        ResqError::Database(sqlx::Error::Database(db)) => db.message().to_string(),
        other => other.to_string(),
    }
}
