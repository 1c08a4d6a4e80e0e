//! Email delivery through the local mail client.

use crate::error::{Error, Result};
use crate::process::{CommandRunner, CommandSpec, Input};
use tracing::{info, warn};

/// Email header fields. Only `to` is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: String,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

impl Envelope {
    /// Creates an envelope for `to`. Blank optional fields set later with
    /// the `with_*` methods are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use clocmail::Envelope;
    ///
    /// let envelope = Envelope::new("ops@example.com")?
    ///     .with_subject(Some("Weekly LOC".into()))
    ///     .with_cc(Some("  ".into()));
    /// assert_eq!(envelope.subject.as_deref(), Some("Weekly LOC"));
    /// assert_eq!(envelope.cc, None);
    /// # Ok::<(), clocmail::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRecipient`] if `to` is blank.
    pub fn new(to: impl Into<String>) -> Result<Self> {
        let to = to.into().trim().to_string();
        if to.is_empty() {
            return Err(Error::MissingRecipient);
        }
        Ok(Self {
            to,
            from: None,
            subject: None,
            cc: None,
            bcc: None,
        })
    }

    pub fn with_from(mut self, from: Option<String>) -> Self {
        self.from = non_empty(from);
        self
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = non_empty(subject);
        self
    }

    pub fn with_cc(mut self, cc: Option<String>) -> Self {
        self.cc = non_empty(cc);
        self
    }

    pub fn with_bcc(mut self, bcc: Option<String>) -> Self {
        self.bcc = non_empty(bcc);
        self
    }
}

/// Trims and drops blank values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of handing a message to the mail client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The client failed; `code` is its raw exit code.
    Failed { code: Option<i32>, message: String },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Sends reports with a `mail`-compatible client.
///
/// A failed send is reported through [`SendOutcome`], never as an error:
/// the report has already been produced and persisted by then.
pub struct Notifier<'a> {
    runner: &'a dyn CommandRunner,
    client: String,
}

impl<'a> Notifier<'a> {
    /// `client` is the program to run, a bare name or a full path.
    pub fn new(runner: &'a dyn CommandRunner, client: impl Into<String>) -> Self {
        Self {
            runner,
            client: client.into(),
        }
    }

    /// `mail [-s subject] [-r from] [-c cc] [-b bcc] to`, body on stdin.
    pub fn command(&self, envelope: &Envelope, body: &str) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.client);
        let flags = [
            ("-s", &envelope.subject),
            ("-r", &envelope.from),
            ("-c", &envelope.cc),
            ("-b", &envelope.bcc),
        ];
        for (flag, value) in flags {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                cmd = cmd.arg(flag).arg(value);
            }
        }
        cmd.arg(&envelope.to)
            .input(Input::Bytes(body.as_bytes().to_vec()))
    }

    pub fn send(&self, body: &str, envelope: &Envelope) -> SendOutcome {
        let cmd = self.command(envelope, body);
        info!(to = %envelope.to, client = %self.client, "sending report");

        match self.runner.run(&cmd) {
            Ok(output) if output.success() => SendOutcome::Sent,
            Ok(output) => {
                let message = output.stderr_str().trim().to_string();
                warn!(status = %output.status_text(), stderr = %message, "mail client failed");
                SendOutcome::Failed {
                    code: output.code,
                    message,
                }
            }
            Err(e) => {
                warn!(error = %e, "mail client failed to run");
                SendOutcome::Failed {
                    code: None,
                    message: e.to_string(),
                }
            }
        }
    }
}
