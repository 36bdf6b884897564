//! Task-creation dialog, independent of any chat transport.
//!
//! The bot runner owns one [`TaskDialog`] per chat, feeds it text and button
//! presses, and performs the side effects the returned [`DialogOutcome`] asks
//! for (creating a category, submitting the task).

pub mod action;
pub mod parse;
pub mod state;

pub use action::DialogAction;
pub use state::{
    Button, DialogInput, DialogOutcome, DialogStep, Screen, TaskDialog, TaskSubmission,
};
