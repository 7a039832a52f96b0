// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

const PRIORITY_VAR: &str = "KEYPIANO_THREAD_PRIORITY";
const DISABLE_RT_VAR: &str = "KEYPIANO_DISABLE_RT_AUDIO";

/// Used when KEYPIANO_THREAD_PRIORITY is unset or out of range.
const DEFAULT_PRIORITY: u8 = 70;

/// How the audio callback thread should be scheduled.
///
/// Read from the environment while the stream is built, so the callback itself never
/// touches the environment. The callback thread is only known once the first callback
/// runs, which is when the priority is applied.
#[derive(Debug)]
pub struct CallbackPriority {
    priority: Option<ThreadPriorityValue>,
    realtime: bool,
    applied: bool,
}

impl CallbackPriority {
    /// KEYPIANO_THREAD_PRIORITY (0-99) sets the priority. SCHED_FIFO is attempted on
    /// unix unless KEYPIANO_DISABLE_RT_AUDIO is set.
    pub fn from_env() -> CallbackPriority {
        CallbackPriority {
            priority: env_priority(),
            realtime: !env_flag(DISABLE_RT_VAR),
            applied: false,
        }
    }

    /// Applies the priority to the calling thread on the first call. Failures are
    /// logged and never retried.
    pub fn apply_once(&mut self) {
        if std::mem::replace(&mut self.applied, true) {
            return;
        }
        let Some(priority) = self.priority else {
            return;
        };

        let priority = ThreadPriority::Crossplatform(priority);
        if let Err(e) = set_current_thread_priority(priority) {
            warn!(error = ?e, "Unable to raise audio callback priority");
        }
        if self.realtime {
            set_realtime(priority);
        }
    }
}

#[cfg(unix)]
fn set_realtime(priority: ThreadPriority) {
    use thread_priority::unix::{
        set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
        ThreadSchedulePolicy,
    };

    let policy = ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo);
    match set_thread_priority_and_policy(thread_native_id(), priority, policy) {
        Ok(()) => info!("Audio callback running with SCHED_FIFO"),
        Err(e) => warn!(error = %e, "Unable to use SCHED_FIFO for audio callback"),
    }
}

#[cfg(not(unix))]
fn set_realtime(_priority: ThreadPriority) {}

fn env_priority() -> Option<ThreadPriorityValue> {
    let priority = std::env::var(PRIORITY_VAR)
        .ok()
        .and_then(|value| value.parse::<u8>().ok())
        .filter(|value| *value < 100)
        .unwrap_or(DEFAULT_PRIORITY);
    ThreadPriorityValue::try_from(priority).ok()
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| {
        ["1", "true", "yes", "on"]
            .iter()
            .any(|truthy| value.eq_ignore_ascii_case(truthy))
    })
}
