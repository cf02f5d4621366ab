//! Recording notification platform.
//!
//! Hosts that cannot be called back synchronously (FFI, terminal) let the
//! dispatcher write into an `Outbox` and drain it after each tick. Tests use
//! it to observe exactly what the dispatcher asked for.

use super::{Cue, NotificationPlatform, Permission, PlatformError, SystemNotification, Toast};

/// Everything emitted since the last drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboxBatch {
    pub cues: Vec<Cue>,
    pub toasts: Vec<Toast>,
    pub dismissed_toasts: Vec<String>,
    pub system: Vec<SystemNotification>,
    pub permission_requested: bool,
}

impl OutboxBatch {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
            && self.toasts.is_empty()
            && self.dismissed_toasts.is_empty()
            && self.system.is_empty()
            && !self.permission_requested
    }
}

#[derive(Debug, Clone)]
pub struct Outbox {
    audio_available: bool,
    permission: Permission,
    /// What a permission prompt resolves to when asked.
    prompt_answer: Permission,
    permission_requests: usize,
    batch: OutboxBatch,
}

impl Outbox {
    pub fn new(permission: Permission) -> Self {
        Self {
            audio_available: true,
            permission,
            prompt_answer: Permission::Undetermined,
            permission_requests: 0,
            batch: OutboxBatch::default(),
        }
    }

    pub fn without_audio(mut self) -> Self {
        self.audio_available = false;
        self
    }

    /// Sets the answer the next permission prompt will produce.
    pub fn with_prompt_answer(mut self, answer: Permission) -> Self {
        self.prompt_answer = answer;
        self
    }

    /// Host reports a permission change (e.g. the user answered the prompt).
    pub fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests
    }

    pub fn batch(&self) -> &OutboxBatch {
        &self.batch
    }

    pub fn drain(&mut self) -> OutboxBatch {
        std::mem::take(&mut self.batch)
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new(Permission::Undetermined)
    }
}

impl NotificationPlatform for Outbox {
    fn play_cue(&mut self, cue: Cue) -> Result<(), PlatformError> {
        if !self.audio_available {
            return Err(PlatformError::Unavailable("audio"));
        }
        self.batch.cues.push(cue);
        Ok(())
    }

    fn show_toast(&mut self, toast: &Toast) {
        self.batch.toasts.push(toast.clone());
    }

    fn dismiss_toast(&mut self, toast_id: &str) {
        self.batch.dismissed_toasts.push(toast_id.to_string());
    }

    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        self.permission_requests += 1;
        self.batch.permission_requested = true;
        if self.prompt_answer != Permission::Undetermined {
            self.permission = self.prompt_answer;
        }
        self.permission
    }

    fn send_system(&mut self, notification: &SystemNotification) {
        self.batch.system.push(notification.clone());
    }
}
