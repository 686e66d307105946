mod comparator;
mod error;
mod harness;
mod judge;
mod languages;
mod runner;
mod verdict;
mod workspace;

use std::sync::Arc;

use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::error::JudgeError;
use crate::judge::{Judge, Submission};
use crate::runner::Runner;
use crate::verdict::{redact_hidden, ExecutionOutcome, JudgeMode, TestCase, Verdict};

const QUEUE_NAME: &str = "judge:queue";
const RESULT_CHANNEL: &str = "judge:results";
const RESULT_KEY_PREFIX: &str = "judge:result:";

/// Job received from the Redis queue. The API layer assembles it: source
/// code from the user, test cases and function name from the problem store.
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeJob {
    pub submission_id: i64,
    pub code: String,
    pub language: String,
    /// The function the submission must implement (from the problem record)
    #[serde(default = "default_function_name")]
    pub function_name: String,
    /// Graded test cases; ignored when `custom_input` is present
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// JSON-encoded single input; present only for ad hoc "run" requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_input: Option<String>,
    /// Privileged callers (admin tooling) see hidden-case details unredacted
    #[serde(default)]
    pub privileged: bool,
}

fn default_function_name() -> String {
    "solution".to_string()
}

/// Result published back for one judge job.
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub submission_id: i64,
    pub success: bool,
    pub results: Vec<ExecutionOutcome>,
    /// Status summary for the submission record (first failure, or accepted);
    /// absent when the job was rejected before execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Verdict>,
    pub max_duration_ms: u64,
    /// Configuration error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tai_judge=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    // Load language configurations
    let languages_path = std::env::var("LANGUAGES_CONFIG").ok();
    languages::init_languages(languages_path.as_deref())?;
    info!(
        "Loaded language configurations: {:?}",
        languages::get_supported_languages()
    );

    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());

    info!("Starting Judge Worker...");

    let client = redis::Client::open(redis_url.clone())?;
    let mut conn = get_redis_connection(&client).await?;
    info!("Connected to Redis at {}", redis_url);

    let mut judge = Judge::new();
    if let Some(limit) = std::env::var("MAX_SOURCE_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        judge = judge.max_source_bytes(limit);
    }
    let judge = Arc::new(judge);

    info!("Waiting for jobs...");

    loop {
        // Block and wait for a job from the queue (BLPOP)
        let result: Option<(String, String)> = match conn.blpop(QUEUE_NAME, 0.0).await {
            Ok(res) => res,
            Err(e) => {
                warn!("Redis BLPOP failed: {}. Attempting to reconnect...", e);
                conn = get_redis_connection(&client).await?;
                continue;
            }
        };

        if let Some((_, job_data)) = result {
            match serde_json::from_str::<JudgeJob>(&job_data) {
                Ok(job) => {
                    info!(
                        "Received judge job: submission_id={}, language={}",
                        job.submission_id, job.language
                    );

                    // Each invocation gets its own task so one slow
                    // submission never stalls the queue.
                    let judge = Arc::clone(&judge);
                    let mut conn = conn.clone();
                    let client = client.clone();
                    tokio::spawn(async move {
                        let response = process_job(&judge, &job).await;
                        if let Err(e) = store_judge_response(&mut conn, &client, &response).await {
                            error!("Failed to store judge result: {}", e);
                        }
                        info!(
                            "Judge job completed: submission_id={}, success={}",
                            response.submission_id, response.success
                        );
                    });
                }
                Err(e) => {
                    warn!("Failed to parse job data: {}", e);
                }
            }
        }
    }
}

/// Run one job through the judge and apply the boundary presentation rules:
/// hidden-case details are redacted for unprivileged graded runs before the
/// result leaves the worker.
async fn process_job<R: Runner>(judge: &Judge<R>, job: &JudgeJob) -> JudgeResponse {
    let submission = match build_submission(job) {
        Ok(submission) => submission,
        Err(e) => return config_error_response(job, e),
    };

    match judge.run(&submission).await {
        Ok(verdict) => {
            let status = verdict.summary_status();
            let max_duration_ms = verdict.max_duration_ms();
            let results = if submission.mode == JudgeMode::Graded && !job.privileged {
                redact_hidden(verdict.outcomes)
            } else {
                verdict.outcomes
            };

            JudgeResponse {
                submission_id: job.submission_id,
                success: verdict.success,
                results,
                status: Some(status),
                max_duration_ms,
                error_message: None,
            }
        }
        Err(e) => config_error_response(job, e),
    }
}

/// Assemble a judge submission from a queued job. A custom input turns the
/// job into a single-case custom run; anything else is a graded run over the
/// problem's test cases.
fn build_submission(job: &JudgeJob) -> Result<Submission, JudgeError> {
    let (test_cases, mode) = match &job.custom_input {
        Some(raw) => {
            let input: Value = serde_json::from_str(raw)
                .map_err(|e| JudgeError::InvalidCustomTestcase(e.to_string()))?;
            let case = TestCase {
                input,
                expected: None,
                hidden: false,
            };
            (vec![case], JudgeMode::Custom)
        }
        None => (job.test_cases.clone(), JudgeMode::Graded),
    };

    Ok(Submission {
        source: job.code.clone(),
        language: job.language.clone(),
        function_name: job.function_name.clone(),
        test_cases,
        mode,
    })
}

fn config_error_response(job: &JudgeJob, err: JudgeError) -> JudgeResponse {
    JudgeResponse {
        submission_id: job.submission_id,
        success: false,
        results: vec![],
        status: None,
        max_duration_ms: 0,
        error_message: Some(err.to_string()),
    }
}

/// Store judge result in Redis for polling and publish it for subscribers
async fn store_judge_response(
    conn: &mut MultiplexedConnection,
    client: &redis::Client,
    response: &JudgeResponse,
) -> Result<()> {
    let result_json = serde_json::to_string(response)?;
    let result_key = format!("{}{}", RESULT_KEY_PREFIX, response.submission_id);

    // Store result in Redis for polling (expires in 1 hour)
    if let Err(e) = conn
        .set_ex::<_, _, ()>(&result_key, &result_json, 3600)
        .await
    {
        warn!("Redis set_ex failed: {}. Reconnecting and retrying...", e);
        let mut new_conn = get_redis_connection(client).await?;
        new_conn
            .set_ex::<_, _, ()>(&result_key, &result_json, 3600)
            .await?;
        *conn = new_conn;
    }

    // Also publish to results channel (for real-time updates if subscribed)
    if let Err(e) = conn
        .publish::<_, _, ()>(RESULT_CHANNEL, &result_json)
        .await
    {
        warn!("Redis publish failed: {}. Reconnecting and retrying...", e);
        let mut new_conn = get_redis_connection(client).await?;
        new_conn
            .publish::<_, _, ()>(RESULT_CHANNEL, &result_json)
            .await?;
        *conn = new_conn;
    }

    Ok(())
}

async fn get_redis_connection(client: &redis::Client) -> Result<MultiplexedConnection> {
    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Retrying in 3 seconds...",
                    e
                );
                sleep(Duration::from_secs(3)).await;
            }
        }
    }
}
