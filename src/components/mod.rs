pub mod league_dialog;
pub mod status_bar;
pub mod unlock_dialog;
