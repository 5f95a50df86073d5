//! Consumer-side progress model.

use std::collections::VecDeque;

use crate::events::ProgressEvent;

/// Most recent activities kept by an indeterminate state.
pub const MAX_ACTIVITIES: usize = 5;

/// What a renderer shows for one request.
///
/// Created when a request starts, moved toward completion by
/// [`ProgressState::apply`], and dropped when the request ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProgressState {
    /// No work in progress.
    #[default]
    Idle,
    /// Work with a known total.
    Determinate {
        percentage: u8,
        message: String,
        is_active: bool,
    },
    /// Work with an unknown total; newest activity last.
    Indeterminate {
        message: String,
        activities: VecDeque<String>,
        is_active: bool,
    },
}

impl ProgressState {
    /// Start percentage-based work at zero.
    pub fn determinate(message: impl Into<String>) -> Self {
        ProgressState::Determinate {
            percentage: 0,
            message: message.into(),
            is_active: true,
        }
    }

    /// Start open-ended work with no activities yet.
    pub fn indeterminate(message: impl Into<String>) -> Self {
        ProgressState::Indeterminate {
            message: message.into(),
            activities: VecDeque::new(),
            is_active: true,
        }
    }

    /// Fold one stream event into the state.
    ///
    /// While a determinate state is active its percentage never goes down.
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Progress {
                percentage: next,
                message: next_message,
            } => match self {
                ProgressState::Determinate {
                    percentage,
                    message,
                    is_active: true,
                } => {
                    *percentage = (*percentage).max(*next);
                    *message = next_message.clone();
                }
                _ => {
                    *self = ProgressState::Determinate {
                        percentage: *next,
                        message: next_message.clone(),
                        is_active: true,
                    }
                }
            },
            ProgressEvent::Activity { message: activity } => match self {
                ProgressState::Indeterminate {
                    message,
                    activities,
                    is_active: true,
                } => {
                    activities.push_back(activity.clone());
                    while activities.len() > MAX_ACTIVITIES {
                        activities.pop_front();
                    }
                    *message = activity.clone();
                }
                _ => {
                    *self = ProgressState::Indeterminate {
                        message: activity.clone(),
                        activities: VecDeque::from([activity.clone()]),
                        is_active: true,
                    }
                }
            },
            ProgressEvent::Complete { .. } => self.finish("Complete", true),
            ProgressEvent::Error { error } => self.finish(error, false),
        }
    }

    fn finish(&mut self, text: &str, succeeded: bool) {
        match self {
            ProgressState::Idle => {
                *self = ProgressState::Determinate {
                    percentage: if succeeded { 100 } else { 0 },
                    message: text.to_string(),
                    is_active: false,
                }
            }
            ProgressState::Determinate {
                percentage,
                message,
                is_active,
            } => {
                if succeeded {
                    *percentage = 100;
                }
                *message = text.to_string();
                *is_active = false;
            }
            ProgressState::Indeterminate {
                message, is_active, ..
            } => {
                *message = text.to_string();
                *is_active = false;
            }
        }
    }

    /// Return to idle.
    pub fn reset(&mut self) {
        *self = ProgressState::Idle;
    }

    pub fn is_active(&self) -> bool {
        match self {
            ProgressState::Idle => false,
            ProgressState::Determinate { is_active, .. }
            | ProgressState::Indeterminate { is_active, .. } => *is_active,
        }
    }

    /// Percentage for determinate work.
    pub fn percentage(&self) -> Option<u8> {
        match self {
            ProgressState::Determinate { percentage, .. } => Some(*percentage),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressState::Idle => None,
            ProgressState::Determinate { message, .. }
            | ProgressState::Indeterminate { message, .. } => Some(message),
        }
    }

    /// Recent activities for indeterminate work, oldest first.
    pub fn activities(&self) -> Vec<&str> {
        match self {
            ProgressState::Indeterminate { activities, .. } => {
                activities.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}
