//! Operator notifications.
//!
//! Three fire-and-forget hook commands run on the manager host around an
//! archive run (`notifyTape`, `notifyTar`, `notifyError`), and a summary
//! email tells the operator which rule and volume tomorrow will need.
//! Hook failures are logged and never fail the run.

mod events;
mod mail;

pub use events::NotificationEvent;
pub use mail::{MailTransport, Sendmail};

use chrono::{Datelike, Utc};
use tapewheel_core::archive::{ArchiveRecord, Target};
use tapewheel_core::rule::{self, Rule};
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::transport::{hook_argv, LocalShell};

pub struct Notifier<'a> {
    local: &'a dyn LocalShell,
    mail: &'a dyn MailTransport,
}

impl<'a> Notifier<'a> {
    pub fn new(local: &'a dyn LocalShell, mail: &'a dyn MailTransport) -> Self {
        Self { local, mail }
    }

    /// Fire the `notifyTape` hook before an archive starts streaming.
    pub async fn preflight(&self, record: &ArchiveRecord) {
        let event = NotificationEvent::RunStarting {
            archive: record.name().to_string(),
        };
        debug!("{}", event.body());
        self.run_hook("notifyTape", &record.notifications.notify_tape)
            .await;
    }

    /// Fire the `notifyTar` hook as a target begins.
    pub async fn on_archive_start(&self, record: &ArchiveRecord, target: &Target) {
        let event = NotificationEvent::TargetStarting {
            archive: record.name().to_string(),
            target: target.to_string(),
        };
        debug!("{}", event.body());
        self.run_hook("notifyTar", &record.notifications.notify_tar)
            .await;
    }

    /// Log the standardized error block and fire the `notifyError` hook.
    pub async fn on_archive_error(&self, record: &ArchiveRecord, context: &str, detail: &str) {
        let event = NotificationEvent::ArchiveError {
            archive: record.name().to_string(),
            context: context.to_string(),
            detail: detail.to_string(),
            at: Utc::now(),
        };
        warn!("{}", event.body());
        self.run_hook("notifyError", &record.notifications.notify_error)
            .await;
    }

    /// Send the operator email summarising tomorrow's expected rule and
    /// set index. Suppressed when tomorrow is idle, or when tomorrow's
    /// monthly would be refused outside the first week of the month.
    pub async fn notify_tomorrow(&self, record: &ArchiveRecord, ctx: &RunContext) {
        let admin = &record.notifications.admin_user;
        if admin.is_empty() {
            return;
        }

        let (date, weekday) = ctx.tomorrow();
        let tomorrow_rule = record.schedule.rule_for(weekday);
        if tomorrow_rule == Rule::None {
            return;
        }
        if tomorrow_rule == Rule::Monthly && !rule::can_do_monthly(date.day()) {
            return;
        }

        let event = NotificationEvent::TomorrowPreview {
            archive: record.name().to_string(),
            rule: tomorrow_rule,
            set_index: record
                .state
                .current_set
                .peek_next(tomorrow_rule, record.total_sets(tomorrow_rule)),
            date,
            weekday,
            reset: rule::incremental_reset(
                &record.schedule,
                record.state.archive_date.as_ref(),
                date,
            ),
        };

        if let Err(e) = self.mail.send(admin, &event.subject(), &event.body()).await {
            warn!("operator email to {} failed: {}", admin, e);
        }
    }

    async fn run_hook(&self, kind: &str, hook: &str) {
        if hook.is_empty() {
            return;
        }
        match self.local.run(&hook_argv(hook)).await {
            Ok(output) if !output.success() => {
                warn!(
                    "{} hook exited {:?}: {}",
                    kind,
                    output.exit_code,
                    output.stderr.trim()
                );
            }
            Ok(_) => debug!("{} hook ok", kind),
            Err(e) => warn!("{} hook failed to run: {}", kind, e),
        }
    }
}
