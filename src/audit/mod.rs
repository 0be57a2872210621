//! Audit attribution: stamp each transaction with the acting user so the
//! database triggers can record who made a change.

pub mod log;

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::config::DEFAULT_AUDIT_USER_SETTING;
use crate::context::RequestContext;
use crate::database::hooks::{SessionScope, TransactionHook};

pub use log::{AuditEntry, AuditQuery};

/// Transaction hook that copies the request's actor into a
/// transaction-local setting read by the audit triggers.
///
/// Attribution is best effort. When the setting cannot be written the hook
/// logs a warning and the transaction carries on unattributed; the business
/// write is never rolled back because of it.
#[derive(Debug, Clone)]
pub struct AuditAttribution {
    setting: String,
}

impl AuditAttribution {
    /// Hook writing to `setting`. The shipped triggers only read
    /// [`DEFAULT_AUDIT_USER_SETTING`]; any other name goes unrecorded.
    pub fn new(setting: impl Into<String>) -> Self {
        Self {
            setting: setting.into(),
        }
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }
}

impl Default for AuditAttribution {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_USER_SETTING)
    }
}

#[async_trait]
impl TransactionHook for AuditAttribution {
    fn name(&self) -> &'static str {
        "audit_attribution"
    }

    async fn after_begin(&self, scope: &mut dyn SessionScope, ctx: Option<&RequestContext>) {
        let Some(actor) = ctx.and_then(RequestContext::actor) else {
            trace!("No actor for transaction, skipping audit attribution");
            return;
        };

        if let Err(error) = scope.set_local(&self.setting, actor.as_str()).await {
            warn!(
                setting = %self.setting,
                actor = %actor,
                error = %error,
                "Failed to set audit attribution, continuing without it"
            );
        }
    }
}
