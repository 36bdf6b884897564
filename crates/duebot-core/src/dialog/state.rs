//! Dialog state machine: steps, navigation and screens.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use duebot_types::category::Category;

use super::action::{DialogAction, TIME_PRESETS};
use super::parse::{ParsedTime, parse_date, parse_time, resolve_due};

/// Screens of the task-creation dialog, in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStep {
    Title,
    CategorySelect,
    CategoryNew,
    DeadlineDate,
    DeadlineTime,
}

/// What the user sent while a dialog is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogInput {
    Text(String),
    Action(DialogAction),
}

/// Everything needed to create the task through the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmission {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub due_at: DateTime<Utc>,
}

/// Result of feeding one input to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// The step changed (or was re-entered); render the current screen.
    Show { notice: Option<String> },
    /// Input rejected; send the message and stay on the current screen.
    Retry(String),
    /// The caller must create this category, then call
    /// [`TaskDialog::category_created`] on success.
    CreateCategory(String),
    /// Dialog finished; create the task.
    Submit(TaskSubmission),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: DialogAction,
}

impl Button {
    fn new(label: impl Into<String>, action: DialogAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Text plus inline keyboard rows for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

/// Per-chat state of one task-creation dialog.
#[derive(Debug, Clone)]
pub struct TaskDialog {
    step: DialogStep,
    tz: Tz,
    title: Option<String>,
    categories: Vec<String>,
    date: Option<NaiveDate>,
    /// Categories offered on the select screen, refreshed by the caller.
    available: Vec<Category>,
}

impl TaskDialog {
    /// Start a dialog at the title step. Dates are read in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            step: DialogStep::Title,
            tz,
            title: None,
            categories: Vec::new(),
            date: None,
            available: Vec::new(),
        }
    }

    pub fn step(&self) -> DialogStep {
        self.step
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Replace the categories shown on the select screen.
    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.available = categories;
    }

    /// Record a category the caller created after [`DialogOutcome::CreateCategory`].
    pub fn category_created(&mut self, name: String) -> DialogOutcome {
        self.categories = vec![name];
        self.step = DialogStep::DeadlineDate;
        DialogOutcome::Show { notice: None }
    }

    /// Feed one input. `now` anchors "today" and rejects past deadlines.
    pub fn handle(&mut self, input: DialogInput, now: DateTime<Utc>) -> DialogOutcome {
        if input == DialogInput::Action(DialogAction::Cancel) {
            return DialogOutcome::Cancelled;
        }
        if input == DialogInput::Action(DialogAction::Back) {
            return self.go_back();
        }

        match (self.step, input) {
            (DialogStep::Title, DialogInput::Text(text)) => {
                let title = text.trim();
                if title.is_empty() {
                    return DialogOutcome::Retry(
                        "Title cannot be empty. Enter the task title.".to_string(),
                    );
                }
                self.title = Some(title.to_string());
                self.advance(DialogStep::CategorySelect)
            }

            (DialogStep::CategorySelect, DialogInput::Action(DialogAction::PickCategory(id))) => {
                let Some(category) = self.available.iter().find(|c| c.id == id) else {
                    return DialogOutcome::Retry("That category is no longer available.".to_string());
                };
                self.categories = vec![category.name.clone()];
                self.advance(DialogStep::DeadlineDate)
            }
            (DialogStep::CategorySelect, DialogInput::Action(DialogAction::NewCategory)) => {
                self.advance(DialogStep::CategoryNew)
            }
            (DialogStep::CategorySelect, DialogInput::Action(DialogAction::SkipCategory)) => {
                self.categories.clear();
                self.advance(DialogStep::DeadlineDate)
            }

            (DialogStep::CategoryNew, DialogInput::Text(text)) => {
                let name = text.trim();
                if name.is_empty() {
                    return DialogOutcome::Retry("Category name cannot be empty.".to_string());
                }
                DialogOutcome::CreateCategory(name.to_string())
            }

            (DialogStep::DeadlineDate, DialogInput::Action(DialogAction::Today)) => {
                let today = self.today(now);
                self.pick_date(today, today)
            }
            (DialogStep::DeadlineDate, DialogInput::Action(DialogAction::Tomorrow)) => {
                let today = self.today(now);
                match today.checked_add_days(Days::new(1)) {
                    Some(tomorrow) => self.pick_date(tomorrow, today),
                    None => DialogOutcome::Retry("Date out of range.".to_string()),
                }
            }
            (DialogStep::DeadlineDate, DialogInput::Text(text)) => {
                let today = self.today(now);
                match parse_date(&text, today) {
                    Some(date) => self.pick_date(date, today),
                    None => DialogOutcome::Retry(
                        "Could not parse the date. Example: 2025-12-31".to_string(),
                    ),
                }
            }

            (DialogStep::DeadlineTime, DialogInput::Action(DialogAction::TimePreset(time))) => {
                self.finish(ParsedTime { time, offset: None }, now)
            }
            (DialogStep::DeadlineTime, DialogInput::Text(text)) => match parse_time(&text) {
                Some(parsed) => self.finish(parsed, now),
                None => DialogOutcome::Retry(
                    "Could not parse the time. Example: 18:30 or 18:30+03:00".to_string(),
                ),
            },

            (_, DialogInput::Action(_)) => {
                DialogOutcome::Retry("That button does not belong to this step.".to_string())
            }
            (_, DialogInput::Text(_)) => {
                DialogOutcome::Retry("Please use the buttons below.".to_string())
            }
        }
    }

    /// Render the current step.
    pub fn screen(&self) -> Screen {
        let nav = vec![
            Button::new("⬅️ Back", DialogAction::Back),
            Button::new("❌ Cancel", DialogAction::Cancel),
        ];

        match self.step {
            DialogStep::Title => Screen {
                text: "📝 Enter the task title:".to_string(),
                buttons: vec![vec![Button::new("❌ Cancel", DialogAction::Cancel)]],
            },
            DialogStep::CategorySelect => {
                let mut buttons: Vec<Vec<Button>> = self
                    .available
                    .chunks(2)
                    .map(|pair| {
                        pair.iter()
                            .map(|c| {
                                Button::new(
                                    format!("📂 {}", c.name),
                                    DialogAction::PickCategory(c.id),
                                )
                            })
                            .collect()
                    })
                    .collect();
                buttons.push(vec![
                    Button::new("➕ New category", DialogAction::NewCategory),
                    Button::new("Skip", DialogAction::SkipCategory),
                ]);
                buttons.push(nav);
                Screen {
                    text: "📁 Choose a category or create a new one:".to_string(),
                    buttons,
                }
            }
            DialogStep::CategoryNew => Screen {
                text: "Enter the new category name:".to_string(),
                buttons: vec![nav],
            },
            DialogStep::DeadlineDate => Screen {
                text: "⏰ Choose the due date.\nOr type a date, e.g. 2025-12-31:".to_string(),
                buttons: vec![
                    vec![
                        Button::new("Today", DialogAction::Today),
                        Button::new("Tomorrow", DialogAction::Tomorrow),
                    ],
                    nav,
                ],
            },
            DialogStep::DeadlineTime => {
                let presets: Vec<Button> = TIME_PRESETS
                    .iter()
                    .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
                    .map(|t| Button::new(t.format("%H:%M").to_string(), DialogAction::TimePreset(t)))
                    .collect();
                let (first, second) = presets.split_at(presets.len().min(3));
                Screen {
                    text: "⏰ Choose the due time.\nOr type a time, e.g. 18:30 or 18:30+03:00:"
                        .to_string(),
                    buttons: vec![first.to_vec(), second.to_vec(), nav],
                }
            }
        }
    }

    fn advance(&mut self, step: DialogStep) -> DialogOutcome {
        self.step = step;
        DialogOutcome::Show { notice: None }
    }

    fn go_back(&mut self) -> DialogOutcome {
        let previous = match self.step {
            DialogStep::Title => {
                return DialogOutcome::Retry("Nothing to go back to. Press Cancel to stop.".to_string());
            }
            DialogStep::CategorySelect => DialogStep::Title,
            DialogStep::CategoryNew | DialogStep::DeadlineDate => DialogStep::CategorySelect,
            DialogStep::DeadlineTime => DialogStep::DeadlineDate,
        };
        self.advance(previous)
    }

    fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    fn pick_date(&mut self, date: NaiveDate, today: NaiveDate) -> DialogOutcome {
        if date < today {
            return DialogOutcome::Retry("That date is already in the past.".to_string());
        }
        self.date = Some(date);
        self.advance(DialogStep::DeadlineTime)
    }

    fn finish(&mut self, time: ParsedTime, now: DateTime<Utc>) -> DialogOutcome {
        let (Some(title), Some(date)) = (self.title.clone(), self.date) else {
            // Unreachable through normal navigation.
            self.step = DialogStep::Title;
            return DialogOutcome::Show {
                notice: Some("Let's start over.".to_string()),
            };
        };

        let Some(due_at) = resolve_due(date, &time, &self.tz) else {
            return DialogOutcome::Retry(format!(
                "{} does not exist on {} in {}. Pick another time.",
                time.time.format("%H:%M"),
                date,
                self.tz.name()
            ));
        };
        if due_at <= now {
            return DialogOutcome::Retry(
                "That moment is already in the past. Pick a later time.".to_string(),
            );
        }

        DialogOutcome::Submit(TaskSubmission {
            title,
            description: String::new(),
            categories: self.categories.clone(),
            due_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use duebot_types::category::CategoryId;

    fn text(s: &str) -> DialogInput {
        DialogInput::Text(s.to_string())
    }

    fn act(a: DialogAction) -> DialogInput {
        DialogInput::Action(a)
    }

    fn now() -> DateTime<Utc> {
        // 10:00 in Berlin (winter time).
        Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap()
    }

    fn berlin() -> Tz {
        "Europe/Berlin".parse().unwrap()
    }

    fn at_date_step() -> TaskDialog {
        let mut dialog = TaskDialog::new(berlin());
        dialog.handle(text("Write report"), now());
        dialog.handle(act(DialogAction::SkipCategory), now());
        assert_eq!(dialog.step(), DialogStep::DeadlineDate);
        dialog
    }

    #[test]
    fn test_happy_path_with_existing_category() {
        let mut dialog = TaskDialog::new(berlin());
        assert_eq!(dialog.step(), DialogStep::Title);

        assert_eq!(dialog.handle(text("  Write report "), now()), DialogOutcome::Show { notice: None });
        assert_eq!(dialog.step(), DialogStep::CategorySelect);
        assert_eq!(dialog.title(), Some("Write report"));

        dialog.set_categories(vec![Category { id: CategoryId(4), name: "Work".into() }]);
        dialog.handle(act(DialogAction::PickCategory(CategoryId(4))), now());
        assert_eq!(dialog.step(), DialogStep::DeadlineDate);

        dialog.handle(act(DialogAction::Tomorrow), now());
        assert_eq!(dialog.step(), DialogStep::DeadlineTime);

        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let outcome = dialog.handle(act(DialogAction::TimePreset(nine)), now());
        assert_eq!(
            outcome,
            DialogOutcome::Submit(TaskSubmission {
                title: "Write report".into(),
                description: String::new(),
                categories: vec!["Work".into()],
                due_at: Utc.with_ymd_and_hms(2030, 1, 16, 8, 0, 0).unwrap(),
            })
        );
    }

    #[test]
    fn test_blank_title_retries() {
        let mut dialog = TaskDialog::new(Tz::UTC);
        assert!(matches!(dialog.handle(text("   "), now()), DialogOutcome::Retry(_)));
        assert_eq!(dialog.step(), DialogStep::Title);
    }

    #[test]
    fn test_new_category_flow() {
        let mut dialog = TaskDialog::new(berlin());
        dialog.handle(text("Buy paint"), now());
        dialog.handle(act(DialogAction::NewCategory), now());
        assert_eq!(dialog.step(), DialogStep::CategoryNew);

        assert!(matches!(dialog.handle(text(" "), now()), DialogOutcome::Retry(_)));
        assert_eq!(
            dialog.handle(text(" Renovation "), now()),
            DialogOutcome::CreateCategory("Renovation".into())
        );
        assert_eq!(dialog.step(), DialogStep::CategoryNew);

        dialog.category_created("Renovation".into());
        assert_eq!(dialog.step(), DialogStep::DeadlineDate);

        dialog.handle(text("2030-02-01"), now());
        let DialogOutcome::Submit(submission) = dialog.handle(text("18:30"), now()) else {
            panic!("expected submission");
        };
        assert_eq!(submission.categories, vec!["Renovation"]);
        assert_eq!(submission.due_at, Utc.with_ymd_and_hms(2030, 2, 1, 17, 30, 0).unwrap());
    }

    #[test]
    fn test_back_navigation() {
        let mut dialog = TaskDialog::new(berlin());
        assert!(matches!(
            dialog.handle(act(DialogAction::Back), now()),
            DialogOutcome::Retry(_)
        ));

        dialog.handle(text("Plan trip"), now());
        dialog.handle(act(DialogAction::NewCategory), now());
        dialog.handle(act(DialogAction::Back), now());
        assert_eq!(dialog.step(), DialogStep::CategorySelect);

        dialog.handle(act(DialogAction::SkipCategory), now());
        dialog.handle(act(DialogAction::Today), now());
        assert_eq!(dialog.step(), DialogStep::DeadlineTime);

        dialog.handle(act(DialogAction::Back), now());
        assert_eq!(dialog.step(), DialogStep::DeadlineDate);
        dialog.handle(act(DialogAction::Back), now());
        assert_eq!(dialog.step(), DialogStep::CategorySelect);
        dialog.handle(act(DialogAction::Back), now());
        assert_eq!(dialog.step(), DialogStep::Title);
    }

    #[test]
    fn test_cancel_from_any_step() {
        let mut dialog = at_date_step();
        assert_eq!(dialog.handle(act(DialogAction::Cancel), now()), DialogOutcome::Cancelled);
    }

    #[test]
    fn test_date_errors() {
        let mut dialog = at_date_step();
        assert!(matches!(dialog.handle(text("next week-ish"), now()), DialogOutcome::Retry(_)));
        assert!(matches!(dialog.handle(text("2029-12-31"), now()), DialogOutcome::Retry(_)));
        assert_eq!(dialog.step(), DialogStep::DeadlineDate);
    }

    #[test]
    fn test_time_in_past_today_retries() {
        let mut dialog = at_date_step();
        dialog.handle(act(DialogAction::Today), now());
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(matches!(
            dialog.handle(act(DialogAction::TimePreset(nine)), now()),
            DialogOutcome::Retry(_)
        ));
        assert!(matches!(dialog.handle(text("21:00"), now()), DialogOutcome::Submit(_)));
    }

    #[test]
    fn test_time_with_offset() {
        let mut dialog = at_date_step();
        dialog.handle(text("20.01.2030"), now());
        let DialogOutcome::Submit(submission) = dialog.handle(text("18:30+03:00"), now()) else {
            panic!("expected submission");
        };
        assert_eq!(submission.due_at, Utc.with_ymd_and_hms(2030, 1, 20, 15, 30, 0).unwrap());
    }

    #[test]
    fn test_dst_gap_retries() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let mut dialog = TaskDialog::new(tz);
        dialog.handle(text("Spring forward"), now());
        dialog.handle(act(DialogAction::SkipCategory), now());
        dialog.handle(text("2030-03-10"), now());
        assert!(matches!(dialog.handle(text("02:30"), now()), DialogOutcome::Retry(_)));
        assert_eq!(dialog.step(), DialogStep::DeadlineTime);
    }

    #[test]
    fn test_stale_or_foreign_buttons() {
        let mut dialog = TaskDialog::new(Tz::UTC);
        dialog.handle(text("Task"), now());
        assert!(matches!(
            dialog.handle(act(DialogAction::PickCategory(CategoryId(99))), now()),
            DialogOutcome::Retry(_)
        ));
        assert!(matches!(
            dialog.handle(act(DialogAction::Today), now()),
            DialogOutcome::Retry(_)
        ));
        assert_eq!(dialog.step(), DialogStep::CategorySelect);
    }

    #[test]
    fn test_screens() {
        let mut dialog = TaskDialog::new(Tz::UTC);
        assert_eq!(dialog.screen().buttons, vec![vec![Button::new("❌ Cancel", DialogAction::Cancel)]]);

        dialog.handle(text("Task"), now());
        dialog.set_categories(vec![
            Category { id: CategoryId(1), name: "A".into() },
            Category { id: CategoryId(2), name: "B".into() },
            Category { id: CategoryId(3), name: "C".into() },
        ]);
        let screen = dialog.screen();
        assert_eq!(screen.buttons.len(), 4);
        assert_eq!(screen.buttons[0][1].label, "📂 B");
        assert_eq!(screen.buttons[1].len(), 1);

        dialog.handle(act(DialogAction::SkipCategory), now());
        dialog.handle(act(DialogAction::Tomorrow), now());
        let screen = dialog.screen();
        let labels: Vec<&str> = screen.buttons[..2]
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(labels, vec!["09:00", "12:00", "18:00", "21:00"]);
    }
}
