//! Single-pass extraction pipeline
//!
//! One trigger runs one pass: open the mailbox session, enumerate
//! candidates, filter, extract, aggregate. The run is a small state
//! machine: `Idle → Connecting → Processing → Done`, with `Failed` reached
//! from `Connecting` on an authentication error (or from `Processing` when
//! every search strategy errors out). Nothing is persisted mid-flight; a
//! failed run is simply re-triggered from `Idle`.

use serde::Serialize;
use tracing::{error, info, warn};

use lx_core::oracle::TextExtractionOracle;
use lx_core::{ExtractionRecord, FieldSchema, RecordStore, ResultSet};
use lx_mail::{
    is_relevant, CredentialProvider, MailError, MailboxClient, MailboxSession, SessionConfig,
};

use crate::client::ExtractionClient;

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Connecting,
    Processing,
    Done,
    Failed,
}

/// What kind of error failed a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunErrorKind {
    /// Credentials missing or rejected; the caller should re-authenticate
    Auth,
    /// Every search strategy errored out
    Search,
    Other,
}

/// Outcome of one pipeline pass
///
/// The user-visible result is always "N processed, M skipped" plus the
/// records themselves; only the two fatal error kinds surface as a single
/// failure signal for the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub records: ResultSet,
    pub processed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<RunErrorKind>,
}

impl RunReport {
    fn done(records: ResultSet, processed: usize, skipped: usize) -> Self {
        Self {
            state: RunState::Done,
            records,
            processed,
            skipped,
            error: None,
            error_kind: None,
        }
    }

    fn failed(error: &MailError) -> Self {
        let (kind, message) = match error {
            MailError::Auth(_) => (
                RunErrorKind::Auth,
                format!("please re-authenticate: {error}"),
            ),
            MailError::Search(_) => (RunErrorKind::Search, error.to_string()),
            _ => (RunErrorKind::Other, error.to_string()),
        };
        Self {
            state: RunState::Failed,
            records: Vec::new(),
            processed: 0,
            skipped: 0,
            error: Some(message),
            error_kind: Some(kind),
        }
    }
}

/// Orchestrates one mailbox-to-records pass per trigger
pub struct ExtractionPipeline<P, O> {
    provider: P,
    extraction: ExtractionClient<O>,
    session_config: SessionConfig,
    state: RunState,
}

impl<P, O> ExtractionPipeline<P, O>
where
    P: CredentialProvider,
    O: TextExtractionOracle,
{
    pub fn new(provider: P, oracle: O, session_config: SessionConfig) -> Self {
        Self {
            provider,
            extraction: ExtractionClient::new(oracle),
            session_config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run one pass over `client` with an explicit field schema
    ///
    /// The schema is owned by this invocation; replacing the active schema
    /// elsewhere never affects a run already in flight.
    pub async fn run<C: MailboxClient>(&mut self, client: C, schema: &FieldSchema) -> RunReport {
        self.state = RunState::Connecting;

        let mut session = match MailboxSession::open(
            client,
            &self.provider,
            self.session_config.clone(),
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                error!("could not open mailbox session: {e}");
                self.state = RunState::Failed;
                return RunReport::failed(&e);
            }
        };

        self.state = RunState::Processing;
        let outcome = self.process(&mut session, schema).await;

        // release the session on success and error paths alike
        if let Err(e) = session.close().await {
            warn!("error closing mailbox session: {e}");
        }

        match outcome {
            Ok((records, processed, skipped)) => {
                info!("run complete: {processed} processed, {skipped} skipped");
                self.state = RunState::Done;
                RunReport::done(records, processed, skipped)
            }
            Err(e) => {
                error!("run failed: {e}");
                self.state = RunState::Failed;
                RunReport::failed(&e)
            }
        }
    }

    /// Run one pass and emit the outcome to the store and the record file
    pub async fn run_and_store<C: MailboxClient>(
        &mut self,
        client: C,
        schema: &FieldSchema,
        store: &RecordStore,
    ) -> RunReport {
        let report = self.run(client, schema).await;

        if report.state == RunState::Done {
            store.replace(report.records.clone());
            if let Err(e) = store.append_persist(&report.records).await {
                // the run itself still succeeded; the record file is a
                // separate consumer
                warn!("failed to persist records: {e}");
            }
        }
        report
    }

    async fn process<C: MailboxClient>(
        &self,
        session: &mut MailboxSession<C>,
        schema: &FieldSchema,
    ) -> lx_mail::Result<(ResultSet, usize, usize)> {
        let candidates = session.list_candidates().await?;
        info!("processing {} candidate messages", candidates.len());

        let mut records = Vec::new();
        let mut processed = 0;
        let mut skipped = 0;

        for candidate in candidates {
            if !is_relevant(&candidate.body) {
                info!("skipping non-trucking email: {:?}", candidate.subject);
                skipped += 1;
                continue;
            }

            match self.extraction.extract(&candidate.body, schema).await {
                Ok(Some(fields)) => {
                    info!("successfully processed email: {:?}", candidate.subject);
                    records.push(ExtractionRecord {
                        fields,
                        email_subject: candidate.subject,
                        email_date: candidate.date,
                        email_from: candidate.from,
                    });
                    processed += 1;
                }
                Ok(None) => {
                    info!("no valid data found in email: {:?}", candidate.subject);
                    skipped += 1;
                }
                Err(e) => {
                    // per-candidate failure: log and keep going
                    warn!("error extracting from message {}: {e}", candidate.id);
                    skipped += 1;
                }
            }
        }

        Ok((records, processed, skipped))
    }
}
