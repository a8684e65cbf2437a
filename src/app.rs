//! Desktop review UI and state management.
//! Shows the dashboard (simulated date, due cards, statistics), runs review
//! sessions with mouse or keyboard, and reports the summary at the end.

use chrono::{NaiveDate, TimeDelta};
use eframe::egui;
use log::{error, warn};
use studyflow::config::AppConfig;
use studyflow::database::SqliteStore;
use studyflow::database::db::{add_flashcard, new_subject};
use studyflow::models::input::{Command, Dispatch, dispatch};
use studyflow::models::sm2::format_interval;
use studyflow::models::stats::{SubjectPerformance, subject_performance};
use studyflow::models::{
    ActivityRange, Clock, KeyMap, RateOutcome, Rating, ReviewSession, SessionSummary,
    SimulatedClock, StatsReport, UserId, due_count,
};
use studyflow::{CardStore, EngineError, SessionLog, StoreError};

type Session = ReviewSession<SqliteStore, SimulatedClock>;

/// Application screen states
enum AppScreen {
    Main,
    Review,
    Complete {
        summary: SessionSummary,
        study_time: TimeDelta,
    },
}

/// Main application state
pub struct StudyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    store: SqliteStore,
    user_id: UserId,
    keys: KeyMap,

    current_screen: AppScreen,
    session: Option<Session>,

    today: NaiveDate,
    due_today: usize,
    stats: Option<StatsReport>,
    subjects: Vec<SubjectPerformance>,
    activity_range: ActivityRange,

    new_subject: String,
    new_front: String,
    new_back: String,
    status_message: Option<String>,
}

fn rating_label(rating: Rating) -> &'static str {
    match rating {
        Rating::Hard => "Hard",
        Rating::Medium => "Medium",
        Rating::Easy => "Easy",
    }
}

fn format_study_time(time: TimeDelta) -> String {
    format!("{}m {:02}s", time.num_minutes(), time.num_seconds() % 60)
}

/// Maps a pressed key to the character used in the key map
fn key_to_char(key: egui::Key) -> Option<char> {
    if key == egui::Key::Space {
        return Some(' ');
    }
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

impl eframe::App for StudyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
            AppScreen::Complete { .. } => self.render_complete_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }
    }
}

impl StudyApp {
    pub fn new(store: SqliteStore, config: &AppConfig) -> Self {
        let mut app = Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            store,
            user_id: config.user_id,
            keys: config.keys.clone(),
            current_screen: AppScreen::Main,
            session: None,
            today: NaiveDate::default(),
            due_today: 0,
            stats: None,
            subjects: Vec::new(),
            activity_range: ActivityRange::Week,
            new_subject: String::new(),
            new_front: String::new(),
            new_back: String::new(),
            status_message: None,
        };
        app.refresh();
        app
    }

    /// Recomputes the dashboard from the database
    fn refresh(&mut self) {
        if let Err(e) = self.try_refresh() {
            error!("Failed to load dashboard: {}", e);
            self.status_message = Some(format!("Failed to load data: {}", e));
        }
    }

    fn try_refresh(&mut self) -> Result<(), StoreError> {
        self.today = self.store.current_date()?;
        let cards = self.store.all_cards(self.user_id)?;
        let entries = self.store.entries(self.user_id)?;

        self.due_today = due_count(&cards, self.today);
        let now = SimulatedClock::on_day(self.today).now();
        self.stats = Some(StatsReport::compute(&entries, now, self.activity_range));
        self.subjects = subject_performance(&entries, &cards);
        Ok(())
    }

    /// Renders the dashboard with date controls, statistics and card creation
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        let mut action_next_day = false;
        let mut action_start = false;
        let mut action_add_card = false;
        let mut action_range: Option<ActivityRange> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.today.format("%Y-%m-%d").to_string());
                if ui.button("Next Day").clicked() {
                    action_next_day = true;
                }
            });
            ui.separator();

            ui.heading(format!("Cards due today: {}", self.due_today));
            if ui
                .add_enabled(self.due_today > 0, egui::Button::new("Start Review"))
                .clicked()
            {
                action_start = true;
            }

            if let Some(message) = &self.status_message {
                ui.colored_label(egui::Color32::RED, message);
            }

            ui.separator();

            if let Some(stats) = &self.stats {
                ui.heading("Statistics");
                ui.label(format!("Streak: {} days", stats.streak_days));
                ui.label(format!("Reviews today: {}", stats.reviews_today));
                ui.label(format!(
                    "This week: {} reviews ({:+}% vs {} last week)",
                    stats.weekly.this_week, stats.weekly.change_percent, stats.weekly.last_week
                ));
                ui.label(format!(
                    "Ratings: {} hard, {} medium, {} easy ({}% accuracy)",
                    stats.ratings.hard,
                    stats.ratings.medium,
                    stats.ratings.easy,
                    stats.accuracy_percent
                ));

                ui.horizontal(|ui| {
                    for (range, label) in [
                        (ActivityRange::Week, "7 days"),
                        (ActivityRange::Month, "30 days"),
                        (ActivityRange::Quarter, "90 days"),
                    ] {
                        if ui.selectable_label(self.activity_range == range, label).clicked() {
                            action_range = Some(range);
                        }
                    }
                });

                egui::ScrollArea::vertical()
                    .id_salt("activity_list")
                    .max_height(120.0)
                    .show(ui, |ui| {
                        for day in stats.activity.iter().rev() {
                            ui.label(format!("{}  {}", day.date.format("%d/%m"), day.count));
                        }
                    });

                for subject in &self.subjects {
                    ui.label(format!(
                        "{}: {} reviews, {}% accuracy",
                        subject.subject,
                        subject.ratings.total(),
                        subject.accuracy_percent
                    ));
                }
            }

            ui.separator();

            ui.heading("Add Flashcard");
            ui.horizontal(|ui| {
                ui.label("Subject:");
                ui.text_edit_singleline(&mut self.new_subject);
            });
            ui.horizontal(|ui| {
                ui.label("Front:");
                ui.text_edit_singleline(&mut self.new_front);
            });
            ui.horizontal(|ui| {
                ui.label("Back:");
                ui.text_edit_singleline(&mut self.new_back);
            });
            if ui.button("Add Flashcard").clicked() {
                action_add_card = true;
            }
        });

        // Execute deferred actions
        if action_next_day {
            if let Err(e) = self.store.advance_day() {
                self.status_message = Some(format!("Failed to change date: {}", e));
            }
            self.refresh();
        }
        if let Some(range) = action_range {
            self.activity_range = range;
            self.refresh();
        }
        if action_add_card {
            self.add_card();
        }
        if action_start {
            self.start_review_session();
        }
    }

    fn add_card(&mut self) {
        if self.new_front.is_empty() || self.new_back.is_empty() {
            return;
        }

        let subject = self.new_subject.trim().to_string();
        let result = self.store.with_connection(|conn| {
            if !subject.is_empty() {
                new_subject(self.user_id, &subject, conn)?;
            }
            let subject = (!subject.is_empty()).then_some(subject.as_str());
            add_flashcard(self.user_id, subject, &self.new_front, &self.new_back, conn)
        });

        match result {
            Ok(_) => {
                self.new_front.clear();
                self.new_back.clear();
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(format!("Failed to add flashcard: {}", e)),
        }
        self.refresh();
    }

    /// Starts a review session with the cards due today
    fn start_review_session(&mut self) {
        let started = self
            .store
            .fetch_due(self.user_id, self.today)
            .map_err(EngineError::from)
            .and_then(|queue| {
                ReviewSession::start(
                    self.user_id,
                    queue,
                    self.store.clone(),
                    SimulatedClock::on_day(self.today),
                )
            });

        match started {
            Ok(session) => {
                self.session = Some(session);
                self.status_message = None;
                self.current_screen = AppScreen::Review;
            }
            Err(e) => {
                warn!("Could not start review session: {}", e);
                self.status_message = Some(e.to_string());
                self.refresh();
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        let Some(session) = &mut self.session else {
            return;
        };

        match dispatch(session, command) {
            Ok(Dispatch::Rated(RateOutcome::Completed(summary))) => {
                let study_time = session.study_time();
                self.session = None;
                self.status_message = None;
                self.current_screen = AppScreen::Complete {
                    summary,
                    study_time,
                };
                self.refresh();
            }
            Ok(Dispatch::Rated(RateOutcome::Skipped { card_id })) => {
                self.status_message = Some(format!("Card {} was deleted and has been skipped", card_id));
            }
            Ok(_) => self.status_message = None,
            Err(e) if e.is_retryable() => {
                self.status_message = Some(format!("{}. Please rate the card again.", e));
            }
            Err(e @ EngineError::Persistence(_)) => {
                warn!("Review could not be saved: {}", e);
                self.status_message = Some(format!(
                    "{}. Go back to the main screen to reload your cards.",
                    e
                ));
            }
            Err(e) => {
                error!("Review session error: {}", e);
                self.status_message = Some(e.to_string());
            }
        }
    }

    fn leave_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.abandon();
        }
        self.current_screen = AppScreen::Main;
        self.refresh();
    }

    /// Renders the review screen: front, then back with rating buttons
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        let pressed: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => key_to_char(*key),
                    _ => None,
                })
                .collect()
        });

        // Store actions to execute after UI rendering
        let mut commands: Vec<Command> = pressed
            .into_iter()
            .filter_map(|key| self.keys.command_for(key))
            .collect();
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.session else {
                action_back = true;
                return;
            };
            let Some(card) = session.current_card() else {
                action_back = true;
                return;
            };

            ui.horizontal(|ui| {
                ui.heading("Review");
                ui.label(format!("{} / {}", session.cursor() + 1, session.total_count()));
            });
            ui.add(egui::ProgressBar::new(session.progress()));
            ui.add_space(20.0);

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    if let Some(subject) = &card.subject {
                        ui.small(subject);
                    }
                    ui.heading("Question");
                    ui.label(&card.front);

                    ui.add_space(20.0);

                    if session.is_flipped() {
                        ui.heading("Answer");
                        ui.label(&card.back);
                    } else {
                        ui.label("(Press Space or click 'Show Answer' to reveal)");
                    }
                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            if !session.is_flipped() {
                if ui.button("Show Answer").clicked() {
                    commands.push(Command::Flip);
                }
            } else if let Some(preview) = session.preview() {
                ui.label("How well did you remember it?");
                ui.horizontal(|ui| {
                    for (rating, next) in Rating::ALL.into_iter().zip(preview) {
                        let label = format!(
                            "{} ({}) · {}",
                            rating_label(rating),
                            self.keys.key_for(rating),
                            format_interval(next.interval_days)
                        );
                        if ui.button(label).clicked() {
                            commands.push(Command::Rate(rating));
                        }
                    }
                });
            }

            if let Some(message) = &self.status_message {
                ui.colored_label(egui::Color32::RED, message);
            }

            ui.add_space(20.0);
            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
        });

        // Execute deferred actions
        for command in commands {
            self.handle_command(command);
        }
        if action_back && matches!(self.current_screen, AppScreen::Review) {
            self.leave_session();
        }
    }

    /// Renders the completion screen with the rating breakdown
    fn render_complete_screen(&mut self, ctx: &egui::Context) {
        let AppScreen::Complete {
            summary,
            study_time,
        } = &self.current_screen
        else {
            return;
        };
        let (summary, study_time) = (*summary, *study_time);

        let mut action_back = false;
        let mut action_again = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Great job!");
            ui.label(format!("You reviewed {} cards", summary.total));
            ui.add_space(10.0);

            ui.group(|ui| {
                ui.label(format!("Hard: {}", summary.hard));
                ui.label(format!("Medium: {}", summary.medium));
                ui.label(format!("Easy: {}", summary.easy));
                if summary.skipped > 0 {
                    ui.label(format!("Skipped (deleted): {}", summary.skipped));
                }
                ui.label(format!("Study time: {}", format_study_time(study_time)));
            });

            ui.add_space(20.0);
            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
            if self.due_today > 0 && ui.button("Review More").clicked() {
                action_again = true;
            }
        });

        if action_back {
            self.current_screen = AppScreen::Main;
        }
        if action_again {
            self.start_review_session();
        }
    }
}
