pub mod app_settings;
pub mod app_state;
pub mod leaderboard;
pub mod league_forms;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod schedule_editor;
pub mod scheduler;
