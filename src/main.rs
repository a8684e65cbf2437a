mod app;

use app::StudyApp;
use log::info;
use studyflow::config::{AppConfig, DEFAULT_CONFIG_FILE};
use studyflow::database::SqliteStore;
use studyflow::database::db::{add_flashcard, new_subject};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load(DEFAULT_CONFIG_FILE).expect("Failed to load configuration");
    let store = SqliteStore::open(&config.database_path).expect("Failed to initialize database");

    let cards = store
        .all_cards(config.user_id)
        .expect("Failed to load flashcards from database");

    if cards.is_empty() {
        let seeded = store.with_connection(|conn| {
            new_subject(config.user_id, "Polish Vocabulary", conn)?;
            for (front, back) in [("cześć", "hello"), ("dziękuję", "thank you"), ("proszę", "please")] {
                add_flashcard(config.user_id, Some("Polish Vocabulary"), front, back, conn)?;
            }
            Ok(())
        });
        match seeded {
            Ok(()) => info!("Sample data created!"),
            Err(e) => log::warn!("Failed to create sample data: {}", e),
        }
    } else {
        info!("Loaded {} flashcards for user {}", cards.len(), config.user_id);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "StudyFlow",
        options,
        Box::new(move |_cc| Ok(Box::new(StudyApp::new(store, &config)))),
    )
}
